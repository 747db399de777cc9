use crate::dialect::{opens_block, DialectRules, INDENT_UNIT};
use crate::model::{BlockInstance, BlockKind, Category, Language, Program};
use crate::registry::{Registry, TemplateChoice};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationWarning {
    pub instance_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub source: String,
    pub warnings: Vec<GenerationWarning>,
}

pub fn generate(program: &Program, registry: &Registry) -> String {
    generate_with_report(program, registry).source
}

pub fn generate_with_report(program: &Program, registry: &Registry) -> GenerationReport {
    let mut warnings = Vec::new();
    let source = SourceBuilder::new(registry, program.language).build(&program.roots, &mut warnings);
    GenerationReport { source, warnings }
}

struct SourceBuilder<'a> {
    registry: &'a Registry,
    rules: &'static DialectRules,
    language: Language,
}

impl<'a> SourceBuilder<'a> {
    fn new(registry: &'a Registry, language: Language) -> Self {
        Self {
            registry,
            rules: DialectRules::for_language(language),
            language,
        }
    }

    fn build(&self, roots: &[BlockInstance], warnings: &mut Vec<GenerationWarning>) -> String {
        if roots.is_empty() {
            return String::new();
        }
        if self.rules.preamble_keyword.is_none() && self.rules.entry_point.is_none() {
            return roots
                .iter()
                .map(|root| self.emit(root, 0, warnings))
                .collect();
        }

        let mut preamble: Vec<String> = Vec::new();
        let mut body_roots: Vec<&BlockInstance> = Vec::new();
        let mut body_raw = String::new();
        for root in roots {
            let raw = self.emit(root, 0, warnings);
            if self.is_preamble(root, &raw) {
                preamble.push(raw.trim().to_string());
            } else {
                body_roots.push(root);
                body_raw.push_str(&raw);
            }
        }

        let body = match self.rules.entry_point {
            Some(entry) if !body_roots.is_empty() && !(entry.is_present)(&body_raw) => {
                if let Some(required) = entry.required_preamble {
                    let present = preamble
                        .iter()
                        .flat_map(|text| text.lines())
                        .any(|line| line.trim() == required);
                    if !present {
                        preamble.insert(0, required.to_string());
                    }
                }
                let mut scratch = Vec::new();
                let mut out = String::new();
                for line in entry.prologue {
                    out.push_str(line);
                    out.push('\n');
                }
                for root in &body_roots {
                    out.push_str(&self.emit(root, entry.body_indent, &mut scratch));
                }
                for line in entry.epilogue {
                    out.push_str(line);
                    out.push('\n');
                }
                out
            }
            _ => body_raw,
        };

        match (preamble.is_empty(), body.is_empty()) {
            (true, _) => body,
            (false, true) => format!("{}\n", preamble.join("\n")),
            (false, false) => format!("{}\n\n{}", preamble.join("\n"), body),
        }
    }

    fn is_preamble(&self, root: &BlockInstance, raw: &str) -> bool {
        if self.rules.preamble_keyword.is_none() {
            return false;
        }
        let is_include = self
            .registry
            .lookup(&root.kind_ref)
            .map(|kind| kind.category == Category::Includes)
            .unwrap_or(false);
        is_include || self.rules.is_preamble_text(raw)
    }

    fn emit(
        &self,
        instance: &BlockInstance,
        indent: usize,
        warnings: &mut Vec<GenerationWarning>,
    ) -> String {
        let pad = INDENT_UNIT.repeat(indent);
        let Some(kind) = self.registry.lookup(&instance.kind_ref) else {
            warnings.push(GenerationWarning {
                instance_id: instance.id.clone(),
                message: format!("Unknown block kind '{}'.", instance.kind_ref),
            });
            return self.comment_line(&pad, &format!("unknown block '{}'", instance.kind_ref));
        };

        let template = match self.registry.template_for(kind, self.language) {
            TemplateChoice::Native(text) => text,
            TemplateChoice::Foreign(lang, text) => {
                warnings.push(GenerationWarning {
                    instance_id: instance.id.clone(),
                    message: format!(
                        "Block '{}' has no {} template; using its {} template.",
                        kind.id, self.language, lang
                    ),
                });
                text
            }
            TemplateChoice::Missing => {
                let note = if kind.templates.is_empty() {
                    format!("block '{}' has no code template", kind.id)
                } else {
                    format!("block '{}' has no {} template", kind.id, self.language)
                };
                warnings.push(GenerationWarning {
                    instance_id: instance.id.clone(),
                    message: format!("Block '{}' cannot be generated for {}.", kind.id, self.language),
                });
                return self.comment_line(&pad, &note);
            }
        };

        for name in unset_placeholders(template, &instance.params, kind) {
            warnings.push(GenerationWarning {
                instance_id: instance.id.clone(),
                message: format!("Parameter '{}' of block '{}' is not set.", name, kind.id),
            });
        }

        let code = substitute(template, &instance.params);
        let mut out = indent_lines(&code, &pad);
        if kind.allows_children {
            for child in &instance.children {
                out.push_str(&self.emit(child, indent + 1, warnings));
            }
            if opens_block(&code) {
                out.push_str(&pad);
                out.push_str("}\n");
            }
        }
        out
    }

    fn comment_line(&self, pad: &str, text: &str) -> String {
        format!("{}{}\n", pad, self.rules.comment(text))
    }
}

fn placeholder_regex() -> Option<&'static Regex> {
    static PLACEHOLDER: OnceLock<Option<Regex>> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| Regex::new(r"\{([^{}\s]+)\}").ok())
        .as_ref()
}

/// Replaces `{name}` with the supplied value; unknown names stay literal.
pub fn substitute(template: &str, params: &BTreeMap<String, String>) -> String {
    let Some(re) = placeholder_regex() else {
        return template.to_string();
    };
    re.replace_all(template, |caps: &Captures| match params.get(&caps[1]) {
        Some(value) => value.clone(),
        None => caps[0].to_string(),
    })
    .into_owned()
}

fn unset_placeholders(
    template: &str,
    params: &BTreeMap<String, String>,
    kind: &BlockKind,
) -> Vec<String> {
    let Some(re) = placeholder_regex() else {
        return Vec::new();
    };
    let mut names: Vec<String> = Vec::new();
    for caps in re.captures_iter(template) {
        let name = &caps[1];
        let is_param = is_identifier(name) || kind.params.iter().any(|decl| decl.name == name);
        if is_param && !params.contains_key(name) && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn indent_lines(code: &str, pad: &str) -> String {
    let mut out = String::with_capacity(code.len() + pad.len() + 1);
    for (index, line) in code.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
        }
        if !line.is_empty() {
            out.push_str(pad);
            out.push_str(line);
        }
    }
    out.push('\n');
    out
}
