use crate::cache::GenerationCache;
use std::cell::RefCell;
use wasm_bindgen::prelude::*;

thread_local! {
    static CACHE: RefCell<GenerationCache> = RefCell::new(GenerationCache::default());
}

fn to_js(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub fn generate_source(program_json: &str) -> Result<String, JsValue> {
    generate_source_with_options(program_json, false)
}

#[wasm_bindgen]
pub fn generate_source_with_options(
    program_json: &str,
    strict_templates: bool,
) -> Result<String, JsValue> {
    CACHE.with(|cache| {
        crate::generate_source_from_json(program_json, strict_templates, &mut cache.borrow_mut())
            .map_err(to_js)
    })
}

#[wasm_bindgen]
pub fn validate_drop(
    program_json: &str,
    kind_id: &str,
    parent_id: Option<String>,
) -> Result<Option<String>, JsValue> {
    crate::validate_drop_from_json(program_json, kind_id, parent_id.as_deref()).map_err(to_js)
}

#[wasm_bindgen]
pub fn locked_blocks(program_json: &str) -> Result<Vec<String>, JsValue> {
    crate::locked_kinds_from_json(program_json).map_err(to_js)
}

#[wasm_bindgen]
pub fn list_blocks(language: &str) -> Result<String, JsValue> {
    crate::list_blocks_json(language).map_err(to_js)
}
