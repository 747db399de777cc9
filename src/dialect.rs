use crate::model::Language;
use regex::Regex;
use std::sync::OnceLock;

pub const INDENT_UNIT: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    Allow,
    Forbid,
}

#[derive(Clone, Copy)]
pub struct EntryPoint {
    pub is_present: fn(&str) -> bool,
    pub prologue: &'static [&'static str],
    pub epilogue: &'static [&'static str],
    pub body_indent: usize,
    pub required_preamble: Option<&'static str>,
}

#[derive(Clone, Copy)]
pub struct DialectRules {
    pub language: Language,
    pub comment_prefix: &'static str,
    pub preamble_keyword: Option<&'static str>,
    pub entry_point: Option<EntryPoint>,
    pub includes_root_only: bool,
    pub preamble_duplicates: DuplicatePolicy,
}

impl DialectRules {
    pub fn for_language(language: Language) -> &'static DialectRules {
        match language {
            Language::C => &C_RULES,
            Language::Python => &PYTHON_RULES,
            Language::Java => &JAVA_RULES,
        }
    }

    pub fn comment(&self, text: &str) -> String {
        format!("{} {}", self.comment_prefix, text)
    }

    pub fn is_preamble_text(&self, raw: &str) -> bool {
        self.preamble_keyword
            .and_then(|keyword| raw.strip_prefix(keyword))
            .map(|rest| {
                rest.chars()
                    .next()
                    .map_or(true, |c| !(c.is_alphanumeric() || c == '_' || c == '$'))
            })
            .unwrap_or(false)
    }

    pub fn has_entry_point(&self, text: &str) -> bool {
        self.entry_point
            .map(|entry| (entry.is_present)(text))
            .unwrap_or(false)
    }
}

static C_RULES: DialectRules = DialectRules {
    language: Language::C,
    comment_prefix: "//",
    preamble_keyword: Some("#include"),
    entry_point: Some(EntryPoint {
        is_present: c_has_main,
        prologue: &["int main() {"],
        epilogue: &["    return 0;", "}"],
        body_indent: 1,
        required_preamble: Some("#include <stdio.h>"),
    }),
    includes_root_only: true,
    preamble_duplicates: DuplicatePolicy::Forbid,
};

static PYTHON_RULES: DialectRules = DialectRules {
    language: Language::Python,
    comment_prefix: "#",
    preamble_keyword: None,
    entry_point: None,
    includes_root_only: true,
    preamble_duplicates: DuplicatePolicy::Allow,
};

static JAVA_RULES: DialectRules = DialectRules {
    language: Language::Java,
    comment_prefix: "//",
    preamble_keyword: Some("import"),
    entry_point: Some(EntryPoint {
        is_present: java_has_class,
        prologue: &["public class Main {", "    public static void main(String[] args) {"],
        epilogue: &["    }", "}"],
        body_indent: 2,
        required_preamble: None,
    }),
    includes_root_only: true,
    preamble_duplicates: DuplicatePolicy::Forbid,
};

fn c_has_main(text: &str) -> bool {
    text.contains("main(")
}

fn java_has_class(text: &str) -> bool {
    static CLASS_DECL: OnceLock<Option<Regex>> = OnceLock::new();
    match CLASS_DECL.get_or_init(|| Regex::new(r"(?m)(^|\s)class\s+[A-Za-z_${]").ok()) {
        Some(re) => re.is_match(text),
        None => text.contains("class "),
    }
}

pub fn opens_block(template: &str) -> bool {
    template.trim_end().ends_with('{')
}
