use crate::codegen;
use crate::model::{BlockInstance, Language, Program, StrictMode};
use crate::placement::{self, PlacementViolation};
use crate::registry::Registry;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    UnknownKind(String),
    UnknownBlock(String),
    NotAContainer { block: String, kind: String },
    Cycle { block: String, target: String },
    Rejected(PlacementViolation),
}

impl Display for EditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EditError::UnknownKind(kind) => write!(f, "Unknown block kind '{}'.", kind),
            EditError::UnknownBlock(id) => write!(f, "No block with id '{}' in the program.", id),
            EditError::NotAContainer { block, kind } => {
                write!(f, "Block '{}' ({}) cannot hold other blocks.", block, kind)
            }
            EditError::Cycle { block, target } => {
                write!(f, "Cannot move block '{}' into its own descendant '{}'.", block, target)
            }
            EditError::Rejected(violation) => write!(f, "{}", violation),
        }
    }
}

impl Error for EditError {}

impl From<PlacementViolation> for EditError {
    fn from(violation: PlacementViolation) -> Self {
        EditError::Rejected(violation)
    }
}

#[derive(Debug, Clone)]
pub struct EditSession {
    program: Program,
    next_id: usize,
}

impl EditSession {
    pub fn new(language: Language, mode: StrictMode) -> Self {
        Self {
            program: Program::new(language, mode),
            next_id: 1,
        }
    }

    pub fn from_program(program: Program) -> Self {
        let next_id = program
            .walk()
            .iter()
            .filter_map(|(_, block)| block.id.strip_prefix("block-"))
            .filter_map(|n| n.parse::<usize>().ok())
            .max()
            .map(|n| n.saturating_add(1))
            .unwrap_or(1);
        Self { program, next_id }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn into_program(self) -> Program {
        self.program
    }

    pub fn drop_block(
        &mut self,
        registry: &Registry,
        kind_id: &str,
        parent: Option<&str>,
        index: Option<usize>,
    ) -> Result<String, EditError> {
        let kind = registry
            .lookup(kind_id)
            .ok_or_else(|| EditError::UnknownKind(kind_id.to_string()))?;
        self.check_target(registry, parent)?;
        if let Some(violation) = placement::validate(registry, kind, parent, &self.program) {
            return Err(violation.into());
        }
        let id = self.fresh_id();
        let instance = BlockInstance::new(id.clone(), kind_id);
        self.program
            .insert(parent, index, instance)
            .map_err(|_| EditError::UnknownBlock(parent.unwrap_or_default().to_string()))?;
        Ok(id)
    }

    pub fn remove_block(&mut self, id: &str) -> Result<BlockInstance, EditError> {
        self.program
            .remove(id)
            .ok_or_else(|| EditError::UnknownBlock(id.to_string()))
    }

    pub fn move_block(
        &mut self,
        registry: &Registry,
        id: &str,
        new_parent: Option<&str>,
        index: Option<usize>,
    ) -> Result<(), EditError> {
        let moving = self
            .program
            .find(id)
            .ok_or_else(|| EditError::UnknownBlock(id.to_string()))?;
        if let Some(target) = new_parent {
            if moving.contains(target) {
                return Err(EditError::Cycle {
                    block: id.to_string(),
                    target: target.to_string(),
                });
            }
        }
        self.check_target(registry, new_parent)?;

        let old_parent = self
            .program
            .parent_of(id)
            .flatten()
            .map(ToString::to_string);
        let old_index = self.position_of(id, old_parent.as_deref());
        let Some(instance) = self.program.remove(id) else {
            return Err(EditError::UnknownBlock(id.to_string()));
        };

        let violation = registry
            .lookup(&instance.kind_ref)
            .and_then(|kind| placement::validate(registry, kind, new_parent, &self.program));
        let (parent, at, result) = match violation {
            Some(violation) => (old_parent.as_deref(), old_index, Err(EditError::from(violation))),
            None => (new_parent, index, Ok(())),
        };
        self.program
            .insert(parent, at, instance)
            .map_err(|_| EditError::UnknownBlock(parent.unwrap_or_default().to_string()))?;
        result
    }

    pub fn set_param(&mut self, id: &str, name: &str, value: &str) -> Result<(), EditError> {
        let block = self
            .program
            .find_mut(id)
            .ok_or_else(|| EditError::UnknownBlock(id.to_string()))?;
        block.params.insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn clear_param(&mut self, id: &str, name: &str) -> Result<(), EditError> {
        let block = self
            .program
            .find_mut(id)
            .ok_or_else(|| EditError::UnknownBlock(id.to_string()))?;
        block.params.remove(name);
        Ok(())
    }

    pub fn set_language(&mut self, language: Language) {
        if self.program.language != language {
            self.program.roots.clear();
            self.program.language = language;
        }
    }

    pub fn set_mode(&mut self, mode: StrictMode) {
        self.program.mode = mode;
    }

    pub fn generate(&self, registry: &Registry) -> String {
        codegen::generate(&self.program, registry)
    }

    fn check_target(&self, registry: &Registry, parent: Option<&str>) -> Result<(), EditError> {
        let Some(parent_id) = parent else {
            return Ok(());
        };
        let parent_block = self
            .program
            .find(parent_id)
            .ok_or_else(|| EditError::UnknownBlock(parent_id.to_string()))?;
        match registry.lookup(&parent_block.kind_ref) {
            Some(kind) if kind.allows_children => Ok(()),
            _ => Err(EditError::NotAContainer {
                block: parent_id.to_string(),
                kind: parent_block.kind_ref.clone(),
            }),
        }
    }

    fn position_of(&self, id: &str, parent: Option<&str>) -> Option<usize> {
        let siblings = match parent {
            None => &self.program.roots,
            Some(parent_id) => &self.program.find(parent_id)?.children,
        };
        siblings.iter().position(|block| block.id == id)
    }

    fn fresh_id(&mut self) -> String {
        loop {
            let id = format!("block-{}", self.next_id);
            self.next_id = self.next_id.wrapping_add(1);
            if self.program.find(&id).is_none() {
                return id;
            }
        }
    }
}
