use crate::model::{BlockKind, Category, Language, ParamDecl};
use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TemplateFallback {
    #[default]
    FirstAvailable,
    Comment,
}

impl TemplateFallback {
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateFallback::FirstAvailable => "first-available",
            TemplateFallback::Comment => "comment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateChoice<'a> {
    Native(&'a str),
    Foreign(Language, &'a str),
    Missing,
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    kinds: Vec<BlockKind>,
    index: HashMap<String, usize>,
    fallback: TemplateFallback,
}

impl Registry {
    pub fn new(kinds: Vec<BlockKind>) -> Result<Self> {
        let mut index = HashMap::new();
        for (position, kind) in kinds.iter().enumerate() {
            if index.insert(kind.id.clone(), position).is_some() {
                bail!("Duplicate block kind id '{}'.", kind.id);
            }
        }
        Ok(Self {
            kinds,
            index,
            fallback: TemplateFallback::default(),
        })
    }

    pub fn builtin() -> Self {
        let kinds = builtin_kinds();
        let index = kinds
            .iter()
            .enumerate()
            .map(|(position, kind)| (kind.id.clone(), position))
            .collect();
        Self {
            kinds,
            index,
            fallback: TemplateFallback::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: TemplateFallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn fallback(&self) -> TemplateFallback {
        self.fallback
    }

    pub fn lookup(&self, kind_id: &str) -> Option<&BlockKind> {
        self.index.get(kind_id).map(|&position| &self.kinds[position])
    }

    pub fn kinds(&self) -> &[BlockKind] {
        &self.kinds
    }

    pub fn template_for<'a>(&self, kind: &'a BlockKind, language: Language) -> TemplateChoice<'a> {
        if let Some(text) = kind.template(language) {
            return TemplateChoice::Native(text);
        }
        match (self.fallback, kind.first_template()) {
            (TemplateFallback::FirstAvailable, Some((lang, text))) => TemplateChoice::Foreign(lang, text),
            _ => TemplateChoice::Missing,
        }
    }

    pub fn list_for_language(&self, language: Language) -> Vec<&BlockKind> {
        self.kinds
            .iter()
            .filter(|kind| !matches!(self.template_for(kind, language), TemplateChoice::Missing))
            .collect()
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read block definitions '{}'.", path.display()))?;
        let value: Value = serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in block definitions '{}'.", path.display()))?;
        Self::from_json(&value)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let entries = value
            .get("kinds")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("Block definitions are missing the 'kinds' array."))?;
        let mut kinds = Vec::with_capacity(entries.len());
        for entry in entries {
            kinds.push(read_kind(entry)?);
        }
        Self::new(kinds)
    }

    pub fn listing_json(&self, language: Language) -> Value {
        let blocks = self
            .list_for_language(language)
            .into_iter()
            .map(|kind| {
                json!({
                    "id": kind.id,
                    "label": kind.label,
                    "category": kind.category.as_str(),
                    "allowsChildren": kind.allows_children,
                    "native": kind.template(language).is_some(),
                    "params": kind
                        .params
                        .iter()
                        .map(|p| json!({
                            "name": p.name,
                            "placeholder": p.placeholder,
                            "default": p.default_value,
                        }))
                        .collect::<Vec<_>>(),
                })
            })
            .collect::<Vec<_>>();
        json!({ "language": language.as_str(), "blocks": blocks })
    }
}

fn read_kind(entry: &Value) -> Result<BlockKind> {
    let id = entry
        .get("id")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| anyhow!("Block definition missing 'id'."))?
        .to_string();
    let label = entry
        .get("label")
        .and_then(Value::as_str)
        .unwrap_or(&id)
        .to_string();
    let category = entry
        .get("category")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Block definition '{}' missing 'category'.", id))?
        .parse::<Category>()
        .map_err(|e| anyhow!("Block definition '{}': {}", id, e))?;

    let mut templates = Vec::new();
    if let Some(map) = entry.get("templates").and_then(Value::as_object) {
        for (lang, text) in map {
            let language = lang
                .parse::<Language>()
                .map_err(|e| anyhow!("Block definition '{}': {}", id, e))?;
            let text = text
                .as_str()
                .ok_or_else(|| anyhow!("Block definition '{}' has a non-string '{}' template.", id, lang))?;
            templates.push((language, text.to_string()));
        }
    }

    let mut params = Vec::new();
    if let Some(list) = entry.get("params").and_then(Value::as_array) {
        for param in list {
            let name = param
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow!("Block definition '{}' has a parameter without 'name'.", id))?;
            params.push(ParamDecl {
                name: name.to_string(),
                placeholder: param
                    .get("placeholder")
                    .and_then(Value::as_str)
                    .unwrap_or(name)
                    .to_string(),
                default_value: param
                    .get("default")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }
    }

    let allows_children = entry
        .get("allowsChildren")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Ok(BlockKind {
        id,
        label,
        category,
        templates,
        params,
        allows_children,
    })
}

fn kind(
    id: &str,
    label: &str,
    category: Category,
    templates: &[(Language, &str)],
    params: &[(&str, &str, &str)],
    allows_children: bool,
) -> BlockKind {
    BlockKind {
        id: id.to_string(),
        label: label.to_string(),
        category,
        templates: templates
            .iter()
            .map(|(lang, text)| (*lang, text.to_string()))
            .collect(),
        params: params
            .iter()
            .map(|(name, placeholder, default_value)| ParamDecl {
                name: name.to_string(),
                placeholder: placeholder.to_string(),
                default_value: default_value.to_string(),
            })
            .collect(),
        allows_children,
    }
}

fn builtin_kinds() -> Vec<BlockKind> {
    use Category::*;
    use Language::{Java, Python, C};

    vec![
        kind("include_stdio", "#include <stdio.h>", Includes, &[(C, "#include <stdio.h>")], &[], false),
        kind("include_stdlib", "#include <stdlib.h>", Includes, &[(C, "#include <stdlib.h>")], &[], false),
        kind("include_math", "#include <math.h>", Includes, &[(C, "#include <math.h>")], &[], false),
        kind("include_string", "#include <string.h>", Includes, &[(C, "#include <string.h>")], &[], false),
        kind("import_math", "import math", Includes, &[(Python, "import math")], &[], false),
        kind("import_random", "import random", Includes, &[(Python, "import random")], &[], false),
        kind("import_scanner", "import Scanner", Includes, &[(Java, "import java.util.Scanner;")], &[], false),
        kind("import_java_util", "import java.util.*", Includes, &[(Java, "import java.util.*;")], &[], false),
        kind(
            "print_text",
            "Print text",
            Io,
            &[
                (C, "printf(\"{msg}\\n\");"),
                (Python, "print(\"{msg}\")"),
                (Java, "System.out.println(\"{msg}\");"),
            ],
            &[("msg", "message", "Hello, World!")],
            false,
        ),
        kind(
            "print_var",
            "Print variable",
            Io,
            &[
                (C, "printf(\"%d\\n\", {name});"),
                (Python, "print({name})"),
                (Java, "System.out.println({name});"),
            ],
            &[("name", "variable", "x")],
            false,
        ),
        kind(
            "read_int",
            "Read number",
            Io,
            &[
                (C, "scanf(\"%d\", &{name});"),
                (Python, "{name} = int(input())"),
                (Java, "{name} = new java.util.Scanner(System.in).nextInt();"),
            ],
            &[("name", "variable", "x")],
            false,
        ),
        kind(
            "declare_int",
            "Integer variable",
            Variables,
            &[
                (C, "int {name} = {value};"),
                (Python, "{name} = {value}"),
                (Java, "int {name} = {value};"),
            ],
            &[("name", "name", "x"), ("value", "value", "0")],
            false,
        ),
        kind(
            "declare_string",
            "Text variable",
            Variables,
            &[
                (C, "char {name}[] = \"{value}\";"),
                (Python, "{name} = \"{value}\""),
                (Java, "String {name} = \"{value}\";"),
            ],
            &[("name", "name", "text"), ("value", "value", "")],
            false,
        ),
        kind(
            "assign",
            "Set variable",
            Variables,
            &[
                (C, "{name} = {value};"),
                (Python, "{name} = {value}"),
                (Java, "{name} = {value};"),
            ],
            &[("name", "variable", "x"), ("value", "value", "0")],
            false,
        ),
        kind(
            "increment",
            "Increase by one",
            Operators,
            &[(C, "{name}++;"), (Python, "{name} += 1"), (Java, "{name}++;")],
            &[("name", "variable", "x")],
            false,
        ),
        kind(
            "compute",
            "Calculate",
            Operators,
            &[
                (C, "{target} = {left} {op} {right};"),
                (Python, "{target} = {left} {op} {right}"),
                (Java, "{target} = {left} {op} {right};"),
            ],
            &[
                ("target", "result", "x"),
                ("left", "left", "a"),
                ("op", "operator", "+"),
                ("right", "right", "b"),
            ],
            false,
        ),
        kind(
            "if",
            "If",
            Conditionals,
            &[
                (C, "if ({condition}) {"),
                (Python, "if {condition}:"),
                (Java, "if ({condition}) {"),
            ],
            &[("condition", "condition", "x > 0")],
            true,
        ),
        kind(
            "else_if",
            "Else if",
            Conditionals,
            &[
                (C, "else if ({condition}) {"),
                (Python, "elif {condition}:"),
                (Java, "else if ({condition}) {"),
            ],
            &[("condition", "condition", "x < 0")],
            true,
        ),
        kind(
            "else",
            "Else",
            Conditionals,
            &[(C, "else {"), (Python, "else:"), (Java, "else {")],
            &[],
            true,
        ),
        kind(
            "for_range",
            "Repeat with counter",
            Loops,
            &[
                (C, "for (int {var} = {start}; {var} < {end}; {var}++) {"),
                (Python, "for {var} in range({start}, {end}):"),
                (Java, "for (int {var} = {start}; {var} < {end}; {var}++) {"),
            ],
            &[("var", "counter", "i"), ("start", "from", "0"), ("end", "to", "10")],
            true,
        ),
        kind(
            "while",
            "Repeat while",
            Loops,
            &[
                (C, "while ({condition}) {"),
                (Python, "while {condition}:"),
                (Java, "while ({condition}) {"),
            ],
            &[("condition", "condition", "x < 10")],
            true,
        ),
        kind(
            "break",
            "Stop loop",
            Loops,
            &[(C, "break;"), (Python, "break"), (Java, "break;")],
            &[],
            false,
        ),
        kind("main_function", "main()", Functions, &[(C, "int main() {")], &[], true),
        kind(
            "main_class",
            "Main class",
            Functions,
            &[(Java, "public class {name} {")],
            &[("name", "class name", "Main")],
            true,
        ),
        kind(
            "main_method",
            "main method",
            Functions,
            &[(Java, "public static void main(String[] args) {")],
            &[],
            true,
        ),
        kind(
            "define_function",
            "Define function",
            Functions,
            &[
                (C, "void {name}() {"),
                (Python, "def {name}():"),
                (Java, "static void {name}() {"),
            ],
            &[("name", "function name", "greet")],
            true,
        ),
        kind(
            "call_function",
            "Call function",
            Functions,
            &[(C, "{name}();"), (Python, "{name}()"), (Java, "{name}();")],
            &[("name", "function name", "greet")],
            false,
        ),
        kind(
            "return",
            "Return",
            Functions,
            &[
                (C, "return {value};"),
                (Python, "return {value}"),
                (Java, "return {value};"),
            ],
            &[("value", "value", "0")],
            false,
        ),
        kind(
            "comment",
            "Comment",
            Syntax,
            &[(C, "// {text}"), (Python, "# {text}"), (Java, "// {text}")],
            &[("text", "note", "")],
            false,
        ),
        kind(
            "raw_code",
            "Custom code",
            Syntax,
            &[(C, "{code}"), (Python, "{code}"), (Java, "{code}")],
            &[("code", "code", "")],
            false,
        ),
    ]
}
