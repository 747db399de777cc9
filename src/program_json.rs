use crate::model::{BlockInstance, Language, Program, StrictMode};
use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

pub fn read_program_file(path: &Path) -> Result<Program> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read program '{}'.", path.display()))?;
    read_program_str(&text).with_context(|| format!("Invalid program file '{}'.", path.display()))
}

pub fn read_program_str(text: &str) -> Result<Program> {
    let value: Value = serde_json::from_str(text).context("Program is not valid JSON.")?;
    program_from_json(&value)
}

pub fn program_from_json(value: &Value) -> Result<Program> {
    let language = value
        .get("language")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Program is missing 'language'."))?
        .parse::<Language>()
        .map_err(|e| anyhow!(e))?;
    let mode = match value.get("mode").and_then(Value::as_str) {
        Some(raw) => raw.parse::<StrictMode>().map_err(|e| anyhow!(e))?,
        None => StrictMode::default(),
    };
    let blocks = match value.get("blocks") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(_) => bail!("Program 'blocks' must be an array."),
    };

    let mut seen = HashSet::new();
    let mut roots = Vec::with_capacity(blocks.len());
    for block in &blocks {
        roots.push(read_instance(block, &mut seen)?);
    }
    Ok(Program {
        roots,
        language,
        mode,
    })
}

fn read_instance(value: &Value, seen: &mut HashSet<String>) -> Result<BlockInstance> {
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| anyhow!("Block is missing 'id'."))?
        .to_string();
    if !seen.insert(id.clone()) {
        bail!("Duplicate block id '{}'.", id);
    }
    let kind_ref = value
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Block '{}' is missing 'kind'.", id))?
        .to_string();

    let mut params = BTreeMap::new();
    if let Some(map) = value.get("params").and_then(Value::as_object) {
        for (name, raw) in map {
            let text = match raw {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => continue,
                _ => bail!("Block '{}' parameter '{}' must be a string.", id, name),
            };
            params.insert(name.clone(), text);
        }
    }

    let mut children = Vec::new();
    if let Some(items) = value.get("children").and_then(Value::as_array) {
        for item in items {
            children.push(read_instance(item, seen)?);
        }
    }

    Ok(BlockInstance {
        id,
        kind_ref,
        params,
        children,
    })
}

pub fn program_to_json(program: &Program) -> Value {
    json!({
        "language": program.language.as_str(),
        "mode": program.mode.as_str(),
        "blocks": program.roots.iter().map(instance_to_json).collect::<Vec<_>>(),
    })
}

fn instance_to_json(instance: &BlockInstance) -> Value {
    let mut obj = Map::new();
    obj.insert("id".to_string(), Value::String(instance.id.clone()));
    obj.insert("kind".to_string(), Value::String(instance.kind_ref.clone()));
    if !instance.params.is_empty() {
        let params = instance
            .params
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<Map<_, _>>();
        obj.insert("params".to_string(), Value::Object(params));
    }
    if !instance.children.is_empty() {
        obj.insert(
            "children".to_string(),
            Value::Array(instance.children.iter().map(instance_to_json).collect()),
        );
    }
    Value::Object(obj)
}
