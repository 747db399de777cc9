pub mod bundle;
pub mod cache;
pub mod codegen;
pub mod dialect;
pub mod handoff;
pub mod model;
pub mod placement;
pub mod program_json;
pub mod registry;
pub mod session;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

use anyhow::{anyhow, bail, Result};
use cache::GenerationCache;
use model::{Language, Program};
use registry::{Registry, TemplateFallback};
use std::path::Path;

#[cfg(all(target_arch = "wasm32", feature = "wasm-bindings"))]
pub mod wasm;

#[cfg(not(target_arch = "wasm32"))]
pub fn run_cli(args: &cli::Args) -> Result<()> {
    let registry = load_registry(args.registry.as_deref(), args.strict_templates)?;

    if let Some(language) = args.list_blocks {
        if args.input.is_some() {
            bail!("--list-blocks cannot be combined with an input program.");
        }
        println!(
            "{}",
            serde_json::to_string_pretty(&registry.listing_json(language))?
        );
        return Ok(());
    }

    let input = args
        .input
        .as_deref()
        .ok_or_else(|| anyhow!("An input program is required."))?;

    let total_stages = 3 + usize::from(args.check) + usize::from(args.bundle.is_some());
    let progress = CliProgress::new("Generate", total_stages);
    let mut stage = 0usize;

    stage += 1;
    progress.emit(stage, "Reading program");
    let mut program = load_program(input)?;
    if let Some(mode) = args.mode {
        program.mode = mode;
    }

    if args.check {
        stage += 1;
        progress.emit(stage, "Checking block placements");
        let violations = placement::audit(&registry, &program);
        for entry in &violations {
            eprintln!("error: block '{}': {}", entry.instance_id, entry.violation);
        }
        if !violations.is_empty() {
            bail!(
                "{} placement violation(s) under {} mode.",
                violations.len(),
                program.mode.as_str()
            );
        }
    }

    stage += 1;
    progress.emit(stage, "Generating source");
    let report = codegen::generate_with_report(&program, &registry);
    for warning in &report.warnings {
        eprintln!("warning: block '{}': {}", warning.instance_id, warning.message);
    }

    stage += 1;
    let text = if args.emit_request {
        let request = handoff::ExecutionRequest::new(program.language, report.source);
        let mut json = serde_json::to_string_pretty(&request.to_json())?;
        json.push('\n');
        json
    } else {
        report.source
    };
    match &args.output {
        Some(output) => {
            progress.emit(stage, "Writing output");
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(output, text.as_bytes())?;
        }
        None => {
            progress.emit(stage, "Printing output");
            print!("{}", text);
        }
    }

    if let Some(bundle_path) = &args.bundle {
        stage += 1;
        progress.emit(stage, "Writing bundle");
        bundle::write_bundle_file(&program, &registry, bundle_path)?;
    }

    Ok(())
}

pub fn load_registry(path: Option<&Path>, strict_templates: bool) -> Result<Registry> {
    let registry = match path {
        Some(path) => Registry::from_json_file(path)?,
        None => Registry::builtin(),
    };
    Ok(if strict_templates {
        registry.with_fallback(TemplateFallback::Comment)
    } else {
        registry
    })
}

pub fn load_program(path: &Path) -> Result<Program> {
    if !path.exists() || !path.is_file() {
        return Err(anyhow!("Input file not found: '{}'.", path.display()));
    }
    let is_bundle = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("bcz"))
        .unwrap_or(false);
    if is_bundle {
        bundle::read_bundle_file(path)
    } else {
        program_json::read_program_file(path)
    }
}

pub fn generate_source_from_json(
    program_json: &str,
    strict_templates: bool,
    cache: &mut GenerationCache,
) -> Result<String> {
    let program = program_json::read_program_str(program_json)?;
    let registry = load_registry(None, strict_templates)?;
    Ok(cache.generate(&program, &registry))
}

pub fn validate_drop_from_json(
    program_json: &str,
    kind_id: &str,
    parent: Option<&str>,
) -> Result<Option<String>> {
    let program = program_json::read_program_str(program_json)?;
    let registry = Registry::builtin();
    let kind = registry
        .lookup(kind_id)
        .ok_or_else(|| anyhow!("Unknown block kind '{}'.", kind_id))?;
    if let Some(parent_id) = parent {
        if program.find(parent_id).is_none() {
            bail!("No block with id '{}' in the program.", parent_id);
        }
    }
    Ok(placement::validate(&registry, kind, parent, &program).map(|v| v.to_string()))
}

pub fn locked_kinds_from_json(program_json: &str) -> Result<Vec<String>> {
    let program = program_json::read_program_str(program_json)?;
    let registry = Registry::builtin();
    Ok(placement::locked_kinds(&registry, &program)
        .into_iter()
        .map(|kind| kind.id.clone())
        .collect())
}

pub fn list_blocks_json(language: &str) -> Result<String> {
    let language = language.parse::<Language>().map_err(|e| anyhow!(e))?;
    Ok(serde_json::to_string(&Registry::builtin().listing_json(language))?)
}

#[cfg(not(target_arch = "wasm32"))]
struct CliProgress {
    prefix: &'static str,
    total: usize,
}

#[cfg(not(target_arch = "wasm32"))]
impl CliProgress {
    fn new(prefix: &'static str, total: usize) -> Self {
        Self {
            prefix,
            total: total.max(1),
        }
    }

    fn emit(&self, step: usize, label: &str) {
        let step = step.clamp(1, self.total);
        let bar = render_progress_bar(step, self.total, 14);
        eprintln!(
            "[{}] {}... ({}/{}) {}",
            self.prefix, label, step, self.total, bar
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn render_progress_bar(step: usize, total: usize, width: usize) -> String {
    let width = width.max(1);
    let filled = ((step * width) + (total / 2)) / total;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < filled { '=' } else { '-' });
    }
    s.push(']');
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(render_progress_bar(1, 2, 4), "[==--]");
        assert_eq!(render_progress_bar(3, 3, 3), "[===]");
    }

    #[test]
    fn json_entry_points_share_the_builtin_catalog() {
        let program = r#"{ "language": "c", "blocks": [ { "id": "i", "kind": "include_stdio" } ] }"#;
        let mut cache = GenerationCache::default();
        for _ in 0..2 {
            assert_eq!(
                generate_source_from_json(program, false, &mut cache).expect("generate"),
                "#include <stdio.h>\n"
            );
        }
        assert_eq!(cache.hits(), 1);
        assert_eq!(
            locked_kinds_from_json(program).expect("locked"),
            vec!["include_stdio".to_string()]
        );
        let violation = validate_drop_from_json(program, "include_stdio", None).expect("validate");
        assert!(violation.is_some());
        assert!(validate_drop_from_json(program, "include_stdio", Some("missing")).is_err());
        assert!(list_blocks_json("python").expect("list").contains("import_math"));
    }
}
