use blockcode_rs_core::codegen::generate;
use blockcode_rs_core::model::{BlockInstance, BlockKind, Category, Language, ParamDecl, Program, StrictMode};
use blockcode_rs_core::registry::Registry;

fn teaching_registry() -> Registry {
    let kind = |id: &str, category: Category, templates: &[(Language, &str)], allows_children: bool| BlockKind {
        id: id.to_string(),
        label: id.to_string(),
        category,
        templates: templates
            .iter()
            .map(|(lang, text)| (*lang, text.to_string()))
            .collect(),
        params: vec![ParamDecl {
            name: "msg".to_string(),
            placeholder: "message".to_string(),
            default_value: String::new(),
        }],
        allows_children,
    };
    Registry::new(vec![
        kind("stdio", Category::Includes, &[(Language::C, "#include <stdio.h>")], false),
        kind("print", Category::Io, &[(Language::C, "printf(\"{msg}\");")], false),
        kind("loop", Category::Loops, &[(Language::C, "while (1) {")], true),
        kind("main", Category::Functions, &[(Language::C, "int main() {")], true),
    ])
    .expect("registry")
}

fn print(id: &str, msg: &str) -> BlockInstance {
    BlockInstance::new(id, "print").with_param("msg", msg)
}

#[test]
fn include_and_print_produce_wrapped_main() {
    let program = Program::new(Language::C, StrictMode::Beginner)
        .with_root(BlockInstance::new("a", "stdio"))
        .with_root(print("b", "hi"));
    assert_eq!(
        generate(&program, &teaching_registry()),
        "#include <stdio.h>\n\nint main() {\n    printf(\"hi\");\n    return 0;\n}\n"
    );
}

#[test]
fn missing_parameter_is_left_literal() {
    let program = Program::new(Language::C, StrictMode::Beginner)
        .with_root(BlockInstance::new("m", "main").with_child(BlockInstance::new("p", "print")));
    let out = generate(&program, &teaching_registry());
    assert!(out.lines().any(|line| line == "    printf(\"{msg}\");"));
}

#[test]
fn unresolved_kind_is_commented_at_its_indent() {
    let program = Program::new(Language::C, StrictMode::Beginner).with_root(
        BlockInstance::new("m", "main")
            .with_child(BlockInstance::new("g", "ghost"))
            .with_child(print("p", "after")),
    );
    let out = generate(&program, &teaching_registry());
    assert_eq!(
        out,
        "int main() {\n    // unknown block 'ghost'\n    printf(\"after\");\n}\n"
    );
}

#[test]
fn two_level_nesting_closes_in_reverse_order() {
    let program = Program::new(Language::C, StrictMode::Beginner).with_root(
        BlockInstance::new("outer", "loop")
            .with_child(BlockInstance::new("inner", "loop").with_child(print("p", "x"))),
    );
    assert_eq!(
        generate(&program, &teaching_registry()),
        concat!(
            "#include <stdio.h>\n",
            "\n",
            "int main() {\n",
            "    while (1) {\n",
            "        while (1) {\n",
            "            printf(\"x\");\n",
            "        }\n",
            "    }\n",
            "    return 0;\n",
            "}\n"
        )
    );
}

#[test]
fn preamble_is_hoisted_in_original_relative_order() {
    let registry = Registry::builtin();
    let program = Program::new(Language::C, StrictMode::Advanced)
        .with_root(BlockInstance::new("p1", "print_text").with_param("msg", "a"))
        .with_root(BlockInstance::new("i1", "include_math"))
        .with_root(BlockInstance::new("p2", "print_text").with_param("msg", "b"))
        .with_root(BlockInstance::new("i2", "include_stdlib"))
        .with_root(BlockInstance::new("i3", "include_stdio"));
    let out = generate(&program, &registry);
    let (preamble, body) = out.split_once("\n\n").expect("preamble and body");
    assert_eq!(
        preamble,
        "#include <math.h>\n#include <stdlib.h>\n#include <stdio.h>"
    );
    assert!(body.starts_with("int main() {\n"));
    assert!(body.find("\"a\\n\"").unwrap_or(usize::MAX) < body.find("\"b\\n\"").unwrap_or(0));
}

#[test]
fn generation_is_deterministic() {
    let registry = Registry::builtin();
    let program = Program::new(Language::Java, StrictMode::Beginner)
        .with_root(BlockInstance::new("d", "declare_int").with_param("name", "n").with_param("value", "3"))
        .with_root(
            BlockInstance::new("w", "while")
                .with_param("condition", "n > 0")
                .with_child(BlockInstance::new("dec", "raw_code").with_param("code", "n--;")),
        );
    let first = generate(&program, &registry);
    let second = generate(&program, &registry);
    assert_eq!(first, second);
    assert_eq!(first.matches("public class Main").count(), 1);
}

#[test]
fn generated_source_never_double_wraps() {
    let registry = teaching_registry();
    let program = Program::new(Language::C, StrictMode::Beginner).with_root(print("p", "x"));
    let wrapped = generate(&program, &registry);
    let (_, body) = wrapped.split_once("\n\n").expect("preamble and body");

    let reparsed = Program::new(Language::C, StrictMode::Beginner).with_root(
        BlockInstance::new("raw", "code").with_param("code", body.trim_end()),
    );
    let raw_registry = Registry::new(vec![BlockKind {
        id: "code".to_string(),
        label: "code".to_string(),
        category: Category::Syntax,
        templates: vec![(Language::C, "{code}".to_string())],
        params: Vec::new(),
        allows_children: false,
    }])
    .expect("registry");
    let again = generate(&reparsed, &raw_registry);
    assert_eq!(again.matches("int main()").count(), 1);
    assert!(!again.contains("#include"));
}
