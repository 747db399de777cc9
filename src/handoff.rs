use crate::codegen;
use crate::model::{Language, Program};
use crate::registry::Registry;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub language: Language,
    pub file_name: String,
    pub source: String,
}

impl ExecutionRequest {
    pub fn new(language: Language, source: String) -> Self {
        Self {
            language,
            file_name: language.source_file_name().to_string(),
            source,
        }
    }

    pub fn from_program(program: &Program, registry: &Registry) -> Self {
        Self::new(program.language, codegen::generate(program, registry))
    }

    pub fn to_json(&self) -> Value {
        json!({
            "language": self.language.as_str(),
            "fileName": self.file_name,
            "source": self.source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockInstance, StrictMode};

    #[test]
    fn request_carries_language_and_source_only() {
        let program = Program::new(Language::Java, StrictMode::Beginner)
            .with_root(BlockInstance::new("b", "break"));
        let request = ExecutionRequest::from_program(&program, &Registry::builtin());
        assert_eq!(request.file_name, "Main.java");
        let value = request.to_json();
        assert_eq!(value["language"], "java");
        assert!(value["source"].as_str().unwrap_or_default().contains("        break;\n"));
        assert_eq!(value.as_object().map(|o| o.len()), Some(3));
    }
}
