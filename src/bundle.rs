use crate::codegen;
use crate::model::Program;
use crate::program_json::{program_from_json, program_to_json};
use crate::registry::Registry;
use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Value};
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipArchive;

const BUNDLE_FORMAT: &str = "blockcode-bundle";
const BUNDLE_VERSION: u64 = 1;

pub fn write_bundle_file(program: &Program, registry: &Registry, output_path: &Path) -> Result<()> {
    let bytes = build_bundle_bytes(program, registry)?;
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, bytes)
        .with_context(|| format!("Failed to write '{}'.", output_path.display()))?;
    Ok(())
}

pub fn build_bundle_bytes(program: &Program, registry: &Registry) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::<u8>::new());
    let mut zip = zip::ZipWriter::new(&mut out);
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let entry_file = program.language.source_file_name();
    let manifest = json!({
        "format": BUNDLE_FORMAT,
        "version": BUNDLE_VERSION,
        "language": program.language.as_str(),
        "entry_file": entry_file,
    });

    zip.start_file("manifest.json", opts)?;
    zip.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;

    zip.start_file("program.json", opts)?;
    zip.write_all(serde_json::to_string_pretty(&program_to_json(program))?.as_bytes())?;

    zip.start_file(entry_file, opts)?;
    zip.write_all(codegen::generate(program, registry).as_bytes())?;

    zip.finish()?;
    Ok(out.into_inner())
}

pub fn read_bundle_file(path: &Path) -> Result<Program> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read '{}'.", path.display()))?;
    read_bundle_bytes(&bytes)
}

pub fn read_bundle_bytes(bytes: &[u8]) -> Result<Program> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))
        .map_err(|_| anyhow!("Input is not a valid bundle archive."))?;

    let manifest_text = read_zip_entry_text(&mut zip, "manifest.json")?;
    let manifest: Value =
        serde_json::from_str(&manifest_text).context("Invalid manifest.json in bundle.")?;
    let format = manifest
        .get("format")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if format != BUNDLE_FORMAT {
        bail!("Invalid bundle format '{}'.", format);
    }
    let version = manifest
        .get("version")
        .and_then(Value::as_u64)
        .unwrap_or_default();
    if version != BUNDLE_VERSION {
        bail!(
            "Unsupported bundle version {} (expected {}).",
            version,
            BUNDLE_VERSION
        );
    }

    let program_text = read_zip_entry_text(&mut zip, "program.json")?;
    let program_value: Value =
        serde_json::from_str(&program_text).context("Invalid program.json in bundle.")?;
    let program = program_from_json(&program_value)?;

    let declared = manifest.get("language").and_then(Value::as_str);
    if declared != Some(program.language.as_str()) {
        bail!(
            "Bundle manifest language {:?} does not match program language '{}'.",
            declared.unwrap_or_default(),
            program.language
        );
    }
    Ok(program)
}

fn read_zip_entry_text<R: Read + std::io::Seek>(
    zip: &mut ZipArchive<R>,
    name: &str,
) -> Result<String> {
    let mut entry = zip
        .by_name(name)
        .with_context(|| format!("Missing '{}' in bundle.", name))?;
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .with_context(|| format!("Failed reading '{}' from bundle.", name))?;
    Ok(text)
}
