use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    C,
    Python,
    Java,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::C, Language::Python, Language::Java];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Python => "python",
            Language::Java => "java",
        }
    }

    pub fn source_file_name(self) -> &'static str {
        match self {
            Language::C => "main.c",
            Language::Python => "main.py",
            Language::Java => "Main.java",
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" => Ok(Language::C),
            "python" | "py" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            other => Err(format!(
                "Unknown language '{}' (expected one of: c, python, java).",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Io,
    Variables,
    Conditionals,
    Functions,
    Includes,
    Operators,
    Loops,
    Syntax,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Io => "io",
            Category::Variables => "variables",
            Category::Conditionals => "conditionals",
            Category::Functions => "functions",
            Category::Includes => "includes",
            Category::Operators => "operators",
            Category::Loops => "loops",
            Category::Syntax => "syntax",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "io" => Ok(Category::Io),
            "variables" => Ok(Category::Variables),
            "conditionals" => Ok(Category::Conditionals),
            "functions" => Ok(Category::Functions),
            "includes" => Ok(Category::Includes),
            "operators" => Ok(Category::Operators),
            "loops" => Ok(Category::Loops),
            "syntax" => Ok(Category::Syntax),
            other => Err(format!("Unknown block category '{}'.", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StrictMode {
    #[default]
    Beginner,
    Advanced,
}

impl StrictMode {
    pub fn as_str(self) -> &'static str {
        match self {
            StrictMode::Beginner => "beginner",
            StrictMode::Advanced => "advanced",
        }
    }
}

impl FromStr for StrictMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(StrictMode::Beginner),
            "advanced" => Ok(StrictMode::Advanced),
            other => Err(format!(
                "Unknown mode '{}' (expected beginner or advanced).",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: String,
    pub placeholder: String,
    pub default_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockKind {
    pub id: String,
    pub label: String,
    pub category: Category,
    pub templates: Vec<(Language, String)>,
    pub params: Vec<ParamDecl>,
    pub allows_children: bool,
}

impl BlockKind {
    pub fn template(&self, language: Language) -> Option<&str> {
        self.templates
            .iter()
            .find(|(lang, _)| *lang == language)
            .map(|(_, text)| text.as_str())
    }

    pub fn first_template(&self) -> Option<(Language, &str)> {
        self.templates
            .first()
            .map(|(lang, text)| (*lang, text.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockInstance {
    pub id: String,
    pub kind_ref: String,
    pub params: BTreeMap<String, String>,
    pub children: Vec<BlockInstance>,
}

impl BlockInstance {
    pub fn new(id: impl Into<String>, kind_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind_ref: kind_ref.into(),
            params: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: BlockInstance) -> Self {
        self.children.push(child);
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id == id || self.children.iter().any(|child| child.contains(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub roots: Vec<BlockInstance>,
    pub language: Language,
    pub mode: StrictMode,
}

impl Program {
    pub fn new(language: Language, mode: StrictMode) -> Self {
        Self {
            roots: Vec::new(),
            language,
            mode,
        }
    }

    pub fn with_root(mut self, root: BlockInstance) -> Self {
        self.roots.push(root);
        self
    }

    pub fn find(&self, id: &str) -> Option<&BlockInstance> {
        find_in(&self.roots, id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut BlockInstance> {
        find_in_mut(&mut self.roots, id)
    }

    pub fn parent_of(&self, id: &str) -> Option<Option<&str>> {
        if self.roots.iter().any(|root| root.id == id) {
            return Some(None);
        }
        parent_in(&self.roots, id).map(Some)
    }

    pub fn remove(&mut self, id: &str) -> Option<BlockInstance> {
        remove_in(&mut self.roots, id)
    }

    /// Inserts under `parent` (or at root) at `index`, clamped to the end.
    /// Returns the instance back when the parent does not exist.
    pub fn insert(
        &mut self,
        parent: Option<&str>,
        index: Option<usize>,
        instance: BlockInstance,
    ) -> Result<(), BlockInstance> {
        let slot = match parent {
            None => &mut self.roots,
            Some(parent_id) => match self.find_mut(parent_id) {
                Some(parent) => &mut parent.children,
                None => return Err(instance),
            },
        };
        let at = index.unwrap_or(slot.len()).min(slot.len());
        slot.insert(at, instance);
        Ok(())
    }

    pub fn walk(&self) -> Vec<(Option<&str>, &BlockInstance)> {
        let mut out = Vec::new();
        for root in &self.roots {
            walk_into(None, root, &mut out);
        }
        out
    }
}

fn find_in<'a>(nodes: &'a [BlockInstance], id: &str) -> Option<&'a BlockInstance> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_in(&node.children, id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(nodes: &'a mut [BlockInstance], id: &str) -> Option<&'a mut BlockInstance> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_in_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

fn parent_in<'a>(nodes: &'a [BlockInstance], id: &str) -> Option<&'a str> {
    for node in nodes {
        if node.children.iter().any(|child| child.id == id) {
            return Some(node.id.as_str());
        }
        if let Some(found) = parent_in(&node.children, id) {
            return Some(found);
        }
    }
    None
}

fn remove_in(nodes: &mut Vec<BlockInstance>, id: &str) -> Option<BlockInstance> {
    if let Some(index) = nodes.iter().position(|node| node.id == id) {
        return Some(nodes.remove(index));
    }
    for node in nodes.iter_mut() {
        if let Some(found) = remove_in(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

fn walk_into<'a>(
    parent: Option<&'a str>,
    node: &'a BlockInstance,
    out: &mut Vec<(Option<&'a str>, &'a BlockInstance)>,
) {
    out.push((parent, node));
    for child in &node.children {
        walk_into(Some(node.id.as_str()), child, out);
    }
}
