use blockcode_rs_core::bundle::{read_bundle_file, write_bundle_file};
use blockcode_rs_core::model::Language;
use blockcode_rs_core::registry::Registry;
use blockcode_rs_core::{codegen, load_program, load_registry, placement};
use std::fs;

const PROGRAM: &str = r#"{
    "language": "python",
    "mode": "beginner",
    "blocks": [
        { "id": "imp", "kind": "import_random" },
        { "id": "n", "kind": "declare_int", "params": { "name": "n", "value": "3" } },
        { "id": "w", "kind": "while", "params": { "condition": "n > 0" }, "children": [
            { "id": "p", "kind": "print_var", "params": { "name": "n" } },
            { "id": "d", "kind": "assign", "params": { "name": "n", "value": "n - 1" } }
        ] }
    ]
}"#;

#[test]
fn program_file_generates_python() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("loop.json");
    fs::write(&path, PROGRAM).expect("write program");

    let program = load_program(&path).expect("load");
    assert_eq!(program.language, Language::Python);
    assert!(placement::audit(&Registry::builtin(), &program).is_empty());
    assert_eq!(
        codegen::generate(&program, &Registry::builtin()),
        "import random\nn = 3\nwhile n > 0:\n    print(n)\n    n = n - 1\n"
    );
}

#[test]
fn bundle_file_round_trips_the_program() {
    let dir = tempfile::tempdir().expect("tempdir");
    let json_path = dir.path().join("loop.json");
    fs::write(&json_path, PROGRAM).expect("write program");
    let program = load_program(&json_path).expect("load");

    let bundle_path = dir.path().join("out").join("loop.bcz");
    write_bundle_file(&program, &Registry::builtin(), &bundle_path).expect("bundle");
    assert_eq!(read_bundle_file(&bundle_path).expect("read"), program);
    assert_eq!(load_program(&bundle_path).expect("load bundle"), program);
}

#[test]
fn missing_input_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_program(&dir.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().contains("Input file not found"));
}

#[test]
fn custom_registry_file_with_strict_templates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry_path = dir.path().join("blocks.json");
    fs::write(
        &registry_path,
        r#"{ "kinds": [
            { "id": "say", "label": "Say", "category": "io",
              "templates": { "c": "puts(\"{msg}\");" },
              "params": [ { "name": "msg", "placeholder": "text", "default": "hi" } ] }
        ] }"#,
    )
    .expect("write registry");
    let program_path = dir.path().join("say.json");
    fs::write(
        &program_path,
        r#"{ "language": "java", "blocks": [ { "id": "s", "kind": "say", "params": { "msg": "yo" } } ] }"#,
    )
    .expect("write program");

    let program = load_program(&program_path).expect("load");
    let lenient = load_registry(Some(&registry_path), false).expect("registry");
    assert!(codegen::generate(&program, &lenient).contains("        puts(\"yo\");\n"));

    let strict = load_registry(Some(&registry_path), true).expect("registry");
    assert_eq!(
        codegen::generate(&program, &strict),
        "public class Main {\n    public static void main(String[] args) {\n        // block 'say' has no java template\n    }\n}\n"
    );
}
