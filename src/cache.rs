use crate::codegen;
use crate::model::Program;
use crate::program_json::program_to_json;
use crate::registry::Registry;
use std::collections::HashMap;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct GenerationCache {
    entries: HashMap<String, String>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl Default for GenerationCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl GenerationCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn generate(&mut self, program: &Program, registry: &Registry) -> String {
        let key = structural_hash(program, registry);
        if let Some(source) = self.entries.get(&key) {
            self.hits += 1;
            return source.clone();
        }
        self.misses += 1;
        let source = codegen::generate(program, registry);
        if self.entries.len() >= self.capacity {
            self.entries.clear();
        }
        self.entries.insert(key, source.clone());
        source
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The registry is assumed fixed for the cache's lifetime; only its fallback
/// policy participates in the key.
pub fn structural_hash(program: &Program, registry: &Registry) -> String {
    let mut canonical = program_to_json(program).to_string();
    canonical.push('\n');
    canonical.push_str(registry.fallback().as_str());
    format!("{:x}", md5::compute(canonical.as_bytes()))
}
