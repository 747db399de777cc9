use crate::codegen;
use crate::dialect::{DialectRules, DuplicatePolicy};
use crate::model::{BlockInstance, BlockKind, Category, Program, StrictMode};
use crate::registry::{Registry, TemplateChoice};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementViolation {
    IncludeMustBeTopLevel { kind: String },
    DuplicateInclude { kind: String },
    EntryPointMustBeTopLevel { kind: String },
    DuplicateEntryPoint { kind: String, existing: String },
}

impl Display for PlacementViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementViolation::IncludeMustBeTopLevel { kind } => {
                write!(f, "'{}' must be placed at the top level, not inside another block.", kind)
            }
            PlacementViolation::DuplicateInclude { kind } => {
                write!(f, "'{}' is already part of the program.", kind)
            }
            PlacementViolation::EntryPointMustBeTopLevel { kind } => {
                write!(f, "'{}' starts the program and must be placed at the top level.", kind)
            }
            PlacementViolation::DuplicateEntryPoint { kind, existing } => write!(
                f,
                "'{}' cannot be added: the program already starts with '{}'.",
                kind, existing
            ),
        }
    }
}

impl Error for PlacementViolation {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub instance_id: String,
    pub violation: PlacementViolation,
}

/// Checks whether `kind` may be dropped under `target_parent` (root when
/// `None`). Advanced mode accepts everything.
pub fn validate(
    registry: &Registry,
    kind: &BlockKind,
    target_parent: Option<&str>,
    program: &Program,
) -> Option<PlacementViolation> {
    if program.mode == StrictMode::Advanced {
        return None;
    }
    let rules = DialectRules::for_language(program.language);

    if kind.category == Category::Includes {
        if target_parent.is_some() && rules.includes_root_only {
            return Some(PlacementViolation::IncludeMustBeTopLevel {
                kind: kind.id.clone(),
            });
        }
        if target_parent.is_none()
            && rules.preamble_duplicates == DuplicatePolicy::Forbid
            && program.roots.iter().any(|root| root.kind_ref == kind.id)
        {
            return Some(PlacementViolation::DuplicateInclude {
                kind: kind.id.clone(),
            });
        }
    }

    if rules.entry_point.is_some() && is_entry_point_kind(registry, kind, program) {
        if target_parent.is_some() {
            return Some(PlacementViolation::EntryPointMustBeTopLevel {
                kind: kind.id.clone(),
            });
        }
        let existing = program.roots.iter().find_map(|root| {
            registry
                .lookup(&root.kind_ref)
                .filter(|root_kind| is_entry_point_kind(registry, root_kind, program))
        });
        if let Some(existing) = existing {
            return Some(PlacementViolation::DuplicateEntryPoint {
                kind: kind.id.clone(),
                existing: existing.id.clone(),
            });
        }
    }

    None
}

pub fn is_locked(registry: &Registry, kind: &BlockKind, program: &Program) -> bool {
    program.mode == StrictMode::Beginner && validate(registry, kind, None, program).is_some()
}

pub fn locked_kinds<'r>(registry: &'r Registry, program: &Program) -> Vec<&'r BlockKind> {
    registry
        .list_for_language(program.language)
        .into_iter()
        .filter(|kind| is_locked(registry, kind, program))
        .collect()
}

pub fn audit(registry: &Registry, program: &Program) -> Vec<AuditEntry> {
    let mut replay = Program::new(program.language, program.mode);
    let mut entries = Vec::new();
    for (parent, instance) in program.walk() {
        if let Some(kind) = registry.lookup(&instance.kind_ref) {
            if let Some(violation) = validate(registry, kind, parent, &replay) {
                entries.push(AuditEntry {
                    instance_id: instance.id.clone(),
                    violation,
                });
            }
        }
        let shallow = BlockInstance {
            id: instance.id.clone(),
            kind_ref: instance.kind_ref.clone(),
            params: instance.params.clone(),
            children: Vec::new(),
        };
        let _ = replay.insert(parent, None, shallow);
    }
    entries
}

fn is_entry_point_kind(registry: &Registry, kind: &BlockKind, program: &Program) -> bool {
    let rules = DialectRules::for_language(program.language);
    let template = match registry.template_for(kind, program.language) {
        TemplateChoice::Native(text) | TemplateChoice::Foreign(_, text) => text,
        TemplateChoice::Missing => return false,
    };
    let defaults = kind
        .params
        .iter()
        .filter(|decl| !decl.default_value.is_empty())
        .map(|decl| (decl.name.clone(), decl.default_value.clone()))
        .collect::<BTreeMap<_, _>>();
    rules.has_entry_point(&codegen::substitute(template, &defaults))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Language;

    fn kind<'r>(registry: &'r Registry, id: &str) -> &'r BlockKind {
        registry.lookup(id).expect("builtin kind")
    }

    fn c_program(mode: StrictMode) -> Program {
        Program::new(Language::C, mode).with_root(
            BlockInstance::new("loop", "while").with_param("condition", "1"),
        )
    }

    #[test]
    fn includes_only_at_root_in_beginner_mode() {
        let registry = Registry::builtin();
        let program = c_program(StrictMode::Beginner);
        let include = kind(&registry, "include_stdio");
        assert_eq!(
            validate(&registry, include, Some("loop"), &program),
            Some(PlacementViolation::IncludeMustBeTopLevel {
                kind: "include_stdio".to_string()
            })
        );
        assert_eq!(validate(&registry, include, None, &program), None);
    }

    #[test]
    fn advanced_mode_bypasses_every_rule() {
        let registry = Registry::builtin();
        let program = c_program(StrictMode::Advanced)
            .with_root(BlockInstance::new("inc", "include_stdio"))
            .with_root(BlockInstance::new("m", "main_function"));
        for id in ["include_stdio", "main_function"] {
            let k = kind(&registry, id);
            assert_eq!(validate(&registry, k, Some("loop"), &program), None);
            assert_eq!(validate(&registry, k, None, &program), None);
            assert!(!is_locked(&registry, k, &program));
        }
    }

    #[test]
    fn c_forbids_duplicate_includes_but_python_allows_them() {
        let registry = Registry::builtin();
        let c = Program::new(Language::C, StrictMode::Beginner)
            .with_root(BlockInstance::new("inc", "include_stdio"));
        let include = kind(&registry, "include_stdio");
        assert!(matches!(
            validate(&registry, include, None, &c),
            Some(PlacementViolation::DuplicateInclude { .. })
        ));
        assert!(is_locked(&registry, include, &c));
        assert!(!is_locked(&registry, kind(&registry, "include_math"), &c));

        let py = Program::new(Language::Python, StrictMode::Beginner)
            .with_root(BlockInstance::new("imp", "import_math"));
        let import = kind(&registry, "import_math");
        assert_eq!(validate(&registry, import, None, &py), None);
        assert!(!is_locked(&registry, import, &py));
        assert!(validate(&registry, import, Some("imp"), &py).is_some());
    }

    #[test]
    fn single_entry_point_for_synthesizing_dialects() {
        let registry = Registry::builtin();
        let main = kind(&registry, "main_function");
        let empty = Program::new(Language::C, StrictMode::Beginner);
        assert_eq!(validate(&registry, main, None, &empty), None);

        let with_main = empty.clone().with_root(BlockInstance::new("m", "main_function"));
        assert_eq!(
            validate(&registry, main, None, &with_main),
            Some(PlacementViolation::DuplicateEntryPoint {
                kind: "main_function".to_string(),
                existing: "main_function".to_string(),
            })
        );
        assert!(is_locked(&registry, main, &with_main));
        let ids = locked_kinds(&registry, &with_main)
            .iter()
            .map(|k| k.id.as_str())
            .collect::<Vec<_>>();
        assert!(ids.contains(&"main_function"));
        assert!(!ids.contains(&"print_text"));
    }

    #[test]
    fn entry_point_kind_cannot_nest() {
        let registry = Registry::builtin();
        let program = Program::new(Language::Java, StrictMode::Beginner)
            .with_root(BlockInstance::new("w", "while"));
        let class = kind(&registry, "main_class");
        assert!(matches!(
            validate(&registry, class, Some("w"), &program),
            Some(PlacementViolation::EntryPointMustBeTopLevel { .. })
        ));
    }

    #[test]
    fn java_class_block_is_a_single_root_entry_point() {
        let registry = Registry::builtin();
        let class = kind(&registry, "main_class");
        let program = Program::new(Language::Java, StrictMode::Beginner)
            .with_root(BlockInstance::new("c", "main_class"));
        assert_eq!(
            validate(&registry, class, None, &program),
            Some(PlacementViolation::DuplicateEntryPoint {
                kind: "main_class".to_string(),
                existing: "main_class".to_string(),
            })
        );
        assert!(matches!(
            validate(&registry, class, Some("c"), &program),
            Some(PlacementViolation::EntryPointMustBeTopLevel { .. })
        ));
        assert!(is_locked(&registry, class, &program));
        assert!(!is_locked(&registry, kind(&registry, "print_text"), &program));

        let empty = Program::new(Language::Java, StrictMode::Beginner);
        assert_eq!(validate(&registry, class, None, &empty), None);
        assert!(!is_locked(&registry, class, &empty));
    }

    #[test]
    fn audit_replays_tree_in_order() {
        let registry = Registry::builtin();
        let program = Program::new(Language::C, StrictMode::Beginner)
            .with_root(BlockInstance::new("a", "include_stdio"))
            .with_root(
                BlockInstance::new("loop", "while")
                    .with_child(BlockInstance::new("nested", "include_math")),
            )
            .with_root(BlockInstance::new("b", "include_stdio"))
            .with_root(BlockInstance::new("g", "ghost"));
        let report = audit(&registry, &program);
        let ids = report
            .iter()
            .map(|entry| entry.instance_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["nested", "b"]);
        assert!(report[1].violation.to_string().contains("include_stdio"));
    }
}
