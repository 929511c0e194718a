//! Multi-entry builds with a shared chunk.

mod helpers;

use fob_dts::{ChunkKind, DtsBundleConfig, EntrySpec, Export, Import};
use helpers::*;

fn shared_fixture() -> fob_dts::StaticFrontEnd {
    frontend(vec![
        module("src/common.d.ts")
            .declaration(interface("Base", "interface % { id: string; }"))
            .declaration(global("global { interface Window { shared: true; } }"))
            .export(Export::named("Base", "Base"))
            .build(),
        module("src/a.d.ts")
            .import(Import::new("./common").named("Base", "Base"))
            .declaration(interface("A", "interface % extends @Base {}"))
            .export(Export::named("A", "A"))
            .build(),
        module("src/b.d.ts")
            .import(Import::new("./common").named("Base", "Base"))
            .declaration(interface("B", "interface % { base: @Base; }"))
            .export(Export::named("B", "B"))
            .export(Export::named("Base", "Base"))
            .build(),
        module("src/c.d.ts")
            .import(Import::new("./common"))
            .declaration(interface("C", "interface % {}"))
            .export(Export::named("C", "C"))
            .build(),
    ])
}

#[test]
fn test_symbols_reached_twice_move_to_shared_chunk() {
    let fe = shared_fixture();
    let output = bundle_chunked(&fe, &["src/a.d.ts", "src/b.d.ts", "src/c.d.ts"])
        .into_result()
        .unwrap();

    let names: Vec<&str> = output.chunks.iter().map(|c| c.file_name.as_str()).collect();
    assert_eq!(names, vec!["a.d.ts", "b.d.ts", "c.d.ts", "shared.d.ts"]);

    let shared = output.shared_chunk().unwrap();
    assert_eq!(shared.kind, ChunkKind::Shared);
    assert_eq!(shared.exports, vec!["Base".to_string()]);
    assert_eq!(
        shared.code,
        "//#region src/common.d.ts\n\
         interface Base { id: string; }\n\
         declare global { interface Window { shared: true; } }\n\
         //#endregion src/common.d.ts\n\
         \n\
         export { Base };\n"
    );

    assert_eq!(
        code(&output, "a.d.ts"),
        "import { Base } from \"./shared.js\";\n\
         \n\
         //#region src/a.d.ts\n\
         interface A extends Base {}\n\
         //#endregion src/a.d.ts\n\
         \n\
         export { A };\n"
    );
    assert_eq!(
        code(&output, "b.d.ts"),
        "import { Base } from \"./shared.js\";\n\
         \n\
         //#region src/b.d.ts\n\
         interface B { base: Base; }\n\
         //#endregion src/b.d.ts\n\
         \n\
         export { B, Base };\n"
    );
    // c only needs the global augmentation.
    assert_eq!(
        code(&output, "c.d.ts"),
        "import \"./shared.js\";\n\
         \n\
         //#region src/c.d.ts\n\
         interface C {}\n\
         //#endregion src/c.d.ts\n\
         \n\
         export { C };\n"
    );
}

#[test]
fn test_shared_declarations_are_emitted_once() {
    let fe = shared_fixture();
    let output = bundle_chunked(&fe, &["src/a.d.ts", "src/b.d.ts", "src/c.d.ts"]);

    let declared: usize = output
        .chunks
        .iter()
        .map(|chunk| chunk.code.matches("interface Base {").count())
        .sum();
    assert_eq!(declared, 1);

    let globals: usize = output
        .chunks
        .iter()
        .map(|chunk| chunk.code.matches("declare global").count())
        .sum();
    assert_eq!(globals, 1);
}

#[test]
fn test_manifest_lists_entry_file_first() {
    let fe = shared_fixture();
    let output = bundle_chunked(&fe, &["src/a.d.ts", "src/b.d.ts", "src/c.d.ts"]);

    assert_eq!(output.manifest.len(), 3);
    assert_eq!(
        output.manifest.files("src/a.d.ts"),
        Some(&["a.d.ts".to_string(), "shared.d.ts".to_string()][..])
    );
    assert_eq!(
        output.manifest.files("src/c.d.ts"),
        Some(&["c.d.ts".to_string(), "shared.d.ts".to_string()][..])
    );

    let json = output.manifest.to_json().unwrap();
    assert!(json.contains("\"src/b.d.ts\""));
}

#[test]
fn test_disjoint_entries_need_no_shared_chunk() {
    let fe = frontend(vec![
        module("src/a.d.ts")
            .declaration(interface("A", "interface % {}"))
            .export(Export::named("A", "A"))
            .build(),
        module("src/b.d.ts")
            .declaration(interface("B", "interface % {}"))
            .export(Export::named("B", "B"))
            .build(),
    ]);

    let output = bundle_chunked(&fe, &["src/a.d.ts", "src/b.d.ts"])
        .into_result()
        .unwrap();

    assert!(output.shared_chunk().is_none());
    assert_eq!(output.chunks.len(), 2);
    assert!(!code(&output, "a.d.ts").contains("import"));
    assert_eq!(
        output.manifest.files("src/b.d.ts"),
        Some(&["b.d.ts".to_string()][..])
    );
}

#[test]
fn test_names_are_unified_across_entries() {
    let fe = frontend(vec![
        module("src/a.d.ts")
            .declaration(interface("Foo", "interface % { a: 1; }"))
            .export(Export::named("Foo", "Foo"))
            .build(),
        module("src/b.d.ts")
            .declaration(interface("Foo", "interface % { b: 2; }"))
            .export(Export::named("Foo", "Foo"))
            .build(),
    ]);

    let output = bundle_chunked(&fe, &["src/a.d.ts", "src/b.d.ts"])
        .into_result()
        .unwrap();

    assert!(code(&output, "a.d.ts").contains("interface Foo { a: 1; }"));
    let b = code(&output, "b.d.ts");
    assert!(b.contains("interface Foo$1 { b: 2; }"));
    assert!(b.ends_with("export { Foo$1 as Foo };\n"));
}

#[test]
fn test_nested_entry_imports_shared_chunk_relatively() {
    let fe = shared_fixture();
    let config = DtsBundleConfig::new([
        EntrySpec::from("src/a.d.ts"),
        EntrySpec::Named {
            name: "sub/b".to_string(),
            path: "src/b.d.ts".to_string(),
        },
    ])
    .chunking(true)
    .shared_chunk_name("common");

    let output = bundle_with(&fe, config).into_result().unwrap();

    assert!(output.chunk("common.d.ts").is_some());
    assert!(code(&output, "a.d.ts").starts_with("import { Base } from \"./common.js\";\n"));
    assert!(code(&output, "sub/b.d.ts").starts_with("import { Base } from \"../common.js\";\n"));
}

#[test]
fn test_failed_entry_does_not_block_the_others() {
    let fe = frontend(vec![
        module("src/a.d.ts")
            .declaration(interface("A", "interface % {}"))
            .export(Export::named("A", "A"))
            .build(),
        module("src/broken.d.ts")
            .declaration(interface("Broken", "interface % { x: @Missing; }"))
            .export(Export::named("Broken", "Broken"))
            .build(),
    ]);

    let output = bundle_chunked(&fe, &["src/a.d.ts", "src/broken.d.ts"]);

    assert_eq!(output.failures.len(), 1);
    assert!(output.failure(&id("src/broken.d.ts")).is_some());
    assert!(output.chunk("a.d.ts").is_some());
    assert!(output.chunk("broken.d.ts").is_none());
}
