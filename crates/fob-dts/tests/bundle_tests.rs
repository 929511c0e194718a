//! End-to-end tests for single-entry declaration bundles.

mod helpers;

use fob_dts::{
    Declaration, DeclarationKind, DtsBundleConfig, Error, Export, Import, StaticFrontEnd,
};
use helpers::*;

#[test]
fn test_dependency_block_comes_before_dependent() {
    let fe = frontend(vec![
        module("src/a.d.ts")
            .import(Import::new("./b").named("Bar", "Bar"))
            .declaration(interface("Foo", "interface % { bar: @Bar; }"))
            .export(Export::named("Foo", "Foo"))
            .build(),
        module("src/b.d.ts")
            .declaration(interface("Bar", "interface % { id: string; }"))
            .export(Export::named("Bar", "Bar"))
            .build(),
    ]);

    let output = bundle(&fe, &["src/a.d.ts"]).into_result().unwrap();

    assert_eq!(
        code(&output, "a.d.ts"),
        "//#region src/b.d.ts\n\
         interface Bar { id: string; }\n\
         //#endregion src/b.d.ts\n\
         \n\
         //#region src/a.d.ts\n\
         interface Foo { bar: Bar; }\n\
         //#endregion src/a.d.ts\n\
         \n\
         export { Foo };\n"
    );
}

#[test]
fn test_single_module_without_collisions_is_unchanged() {
    let fe = frontend(vec![
        module("src/index.d.ts")
            .declaration(type_alias("Id", "type % = string;"))
            .declaration(interface("User", "interface % { id: @Id; name: string; }"))
            .export(Export::named("Id", "Id"))
            .export(Export::named("User", "User"))
            .build(),
    ]);

    let config = DtsBundleConfig::new(["src/index.d.ts"]).region_markers(false);
    let output = bundle_with(&fe, config).into_result().unwrap();

    assert_eq!(
        code(&output, "index.d.ts"),
        "type Id = string;\n\
         interface User { id: Id; name: string; }\n\
         \n\
         export { Id, User };\n"
    );
}

#[test]
fn test_collision_follows_traversal_order() {
    let m1 = module("src/m1.d.ts")
        .declaration(interface("Foo", "interface % { a: string; }"))
        .export(Export::named("Foo", "Foo"))
        .build();
    // Declared after an unrelated type so source position differs from m1.
    let m2 = module("src/m2.d.ts")
        .declaration(type_alias("Other", "type % = number;"))
        .declaration(interface("Foo", "interface % { b: number; }"))
        .export(Export::named("Foo", "Foo"))
        .build();

    let fe = frontend(vec![
        module("src/index.d.ts")
            .export(Export::re_export("Foo", "Foo", "./m1"))
            .export(Export::re_export("Foo2", "Foo", "./m2"))
            .build(),
        m1.clone(),
        m2.clone(),
    ]);
    let output = bundle(&fe, &["src/index.d.ts"]).into_result().unwrap();
    assert_eq!(
        code(&output, "index.d.ts"),
        "//#region src/m1.d.ts\n\
         interface Foo { a: string; }\n\
         //#endregion src/m1.d.ts\n\
         \n\
         //#region src/m2.d.ts\n\
         interface Foo$1 { b: number; }\n\
         //#endregion src/m2.d.ts\n\
         \n\
         export { Foo, Foo$1 as Foo2 };\n"
    );

    // Visiting m2 first hands it the bare name.
    let fe = frontend(vec![
        module("src/index.d.ts")
            .export(Export::re_export("Foo2", "Foo", "./m2"))
            .export(Export::re_export("Foo", "Foo", "./m1"))
            .build(),
        m1,
        m2,
    ]);
    let output = bundle(&fe, &["src/index.d.ts"]).into_result().unwrap();
    let code = code(&output, "index.d.ts");
    assert!(code.contains("interface Foo { b: number; }"));
    assert!(code.contains("interface Foo$1 { a: string; }"));
    assert!(code.ends_with("export { Foo as Foo2, Foo$1 as Foo };\n"));
}

#[test]
fn test_unreachable_helpers_are_pruned_but_global_blocks_kept() {
    let fe = frontend(vec![
        module("src/index.d.ts")
            .declaration(interface("Public", "interface % { value: string; }"))
            .declaration(
                interface("Unused", "interface % { secret: string; }")
                    .with_doc("/** Internal helper. */"),
            )
            .declaration(global("global { interface Window { appVersion: string; } }"))
            .export(Export::named("Public", "Public"))
            .build(),
    ]);

    let output = bundle(&fe, &["src/index.d.ts"]).into_result().unwrap();
    let code = code(&output, "index.d.ts");

    assert!(code.contains("interface Public { value: string; }"));
    assert!(!code.contains("Unused"));
    assert!(!code.contains("Internal helper"));
    assert!(code.contains("declare global { interface Window { appVersion: string; } }"));
}

#[test]
fn test_namespace_import_and_re_export_share_one_object() {
    let fe = frontend(vec![
        module("src/index.d.ts")
            .import(Import::new("./utils").namespace_as("utils"))
            .declaration(interface("Config", "interface % { helper: @utils.Helper; }"))
            .export(Export::named("Config", "Config"))
            .export(Export::namespace("tools", "./utils"))
            .build(),
        module("src/utils.d.ts")
            .declaration(interface("Helper", "interface % {}"))
            .declaration(type_alias("Mode", "type % = \"a\" | \"b\";"))
            .export(Export::named("Helper", "Helper"))
            .export(Export::named("Mode", "Mode"))
            .build(),
    ]);

    let output = bundle(&fe, &["src/index.d.ts"]).into_result().unwrap();

    assert_eq!(
        code(&output, "index.d.ts"),
        "//#region src/utils.d.ts\n\
         interface Helper {}\n\
         type Mode = \"a\" | \"b\";\n\
         declare namespace utils {\n  export { Helper, Mode };\n}\n\
         //#endregion src/utils.d.ts\n\
         \n\
         //#region src/index.d.ts\n\
         interface Config { helper: utils.Helper; }\n\
         //#endregion src/index.d.ts\n\
         \n\
         export { Config, utils as tools };\n"
    );
}

#[test]
fn test_default_exports_get_synthetic_names() {
    let fe = frontend(vec![
        module("src/index.d.ts")
            .declaration(interface("Props", "interface % { label: string; }"))
            .export(Export::re_export("Button", "default", "./button"))
            .export(Export::default_of("Props"))
            .build(),
        module("src/button.d.ts")
            .declaration(
                Declaration::from_template(
                    DeclarationKind::Function,
                    None,
                    "export default function %(): void;",
                )
                .unwrap(),
            )
            .export(Export::anonymous_default())
            .build(),
    ]);

    let output = bundle(&fe, &["src/index.d.ts"]).into_result().unwrap();

    assert_eq!(
        code(&output, "index.d.ts"),
        "//#region src/button.d.ts\n\
         declare function button_default(): void;\n\
         //#endregion src/button.d.ts\n\
         \n\
         //#region src/index.d.ts\n\
         interface src_default { label: string; }\n\
         //#endregion src/index.d.ts\n\
         \n\
         export { button_default as Button, src_default as default };\n"
    );
}

#[test]
fn test_external_imports_and_star_exports_pass_through() {
    let fe = frontend(vec![
        module("src/index.d.ts")
            .import(Import::new("react").named("ReactNode", "ReactNode"))
            .import(Import::new("react").default_as("React"))
            .declaration(interface(
                "Props",
                "interface % { children: @ReactNode; ref: @React.Ref<unknown>; }",
            ))
            .export(Export::named("Props", "Props"))
            .export(Export::star("lodash"))
            .build(),
    ]);

    let output = bundle(&fe, &["src/index.d.ts"]).into_result().unwrap();

    assert_eq!(
        code(&output, "index.d.ts"),
        "import React from \"react\";\n\
         import { ReactNode } from \"react\";\n\
         \n\
         //#region src/index.d.ts\n\
         interface Props { children: ReactNode; ref: React.Ref<unknown>; }\n\
         //#endregion src/index.d.ts\n\
         \n\
         export { Props };\n\
         export * from \"lodash\";\n"
    );
}

#[test]
fn test_global_names_are_never_shadowed() {
    let fe = frontend(vec![
        module("src/index.d.ts")
            .import(Import::new("./local").named("Promise", "LocalPromise"))
            .declaration(interface(
                "Api",
                "interface % { load: @Promise<string>; local: @LocalPromise; }",
            ))
            .export(Export::named("Api", "Api"))
            .build(),
        module("src/local.d.ts")
            .declaration(interface("Promise", "interface % { local: true; }"))
            .export(Export::named("Promise", "Promise"))
            .build(),
    ])
    .with_global("Promise");

    let output = bundle(&fe, &["src/index.d.ts"]).into_result().unwrap();

    assert_eq!(
        code(&output, "index.d.ts"),
        "//#region src/local.d.ts\n\
         interface Promise$1 { local: true; }\n\
         //#endregion src/local.d.ts\n\
         \n\
         //#region src/index.d.ts\n\
         interface Api { load: Promise<string>; local: Promise$1; }\n\
         //#endregion src/index.d.ts\n\
         \n\
         export { Api };\n"
    );
}

#[test]
fn test_directives_are_hoisted_and_deduplicated() {
    let fe = frontend(vec![
        module("src/a.d.ts")
            .directive("/// <reference types=\"node\" />")
            .directive("/// <reference lib=\"dom\" />")
            .import(Import::new("./b").named("B", "B"))
            .declaration(interface("A", "interface % { b: @B; }"))
            .export(Export::named("A", "A"))
            .build(),
        module("src/b.d.ts")
            .directive("/// <reference types=\"node\" />")
            .declaration(interface("B", "interface % {}"))
            .export(Export::named("B", "B"))
            .build(),
    ]);

    let config = DtsBundleConfig::new(["src/a.d.ts"]).banner("// generated by fob-dts");
    let output = bundle_with(&fe, config).into_result().unwrap();
    let code = code(&output, "a.d.ts");

    assert!(code.starts_with(
        "// generated by fob-dts\n\
         \n\
         /// <reference types=\"node\" />\n\
         /// <reference lib=\"dom\" />\n\
         \n\
         //#region src/b.d.ts\n"
    ));
    assert_eq!(code.matches("reference types").count(), 1);
}

#[test]
fn test_type_only_exports_and_declare_normalization() {
    let fe = frontend(vec![
        module("src/index.d.ts")
            .declaration(decl(
                DeclarationKind::Class,
                "Widget",
                "export class % { size: @Size; }",
            ))
            .declaration(type_alias("Size", "type % = number;"))
            .declaration(decl(
                DeclarationKind::Variable,
                "version",
                "const %: string;",
            ))
            .export(Export::named("Widget", "Widget"))
            .export(Export::named("Size", "Size").type_only())
            .export(Export::named("version", "version"))
            .build(),
    ]);

    let config = DtsBundleConfig::new(["src/index.d.ts"]).region_markers(false);
    let output = bundle_with(&fe, config).into_result().unwrap();

    assert_eq!(
        code(&output, "index.d.ts"),
        "declare class Widget { size: Size; }\n\
         type Size = number;\n\
         declare const version: string;\n\
         \n\
         export { Widget, type Size, version };\n"
    );
}

#[test]
fn test_bundling_is_deterministic() {
    let build = || {
        let fe = frontend(vec![
            module("src/index.d.ts")
                .import(Import::new("./a").named("Foo", "A"))
                .import(Import::new("./b").named("Foo", "B"))
                .declaration(interface("Both", "interface % { a: @A; b: @B; }"))
                .export(Export::named("Both", "Both"))
                .build(),
            module("src/a.d.ts")
                .declaration(interface("Foo", "interface % { a: 1; }"))
                .export(Export::named("Foo", "Foo"))
                .build(),
            module("src/b.d.ts")
                .declaration(interface("Foo", "interface % { b: 2; }"))
                .export(Export::named("Foo", "Foo"))
                .build(),
        ]);
        bundle(&fe, &["src/index.d.ts"])
            .into_result()
            .unwrap()
            .chunks
            .remove(0)
            .code
    };

    let first = build();
    for _ in 0..5 {
        assert_eq!(build(), first);
    }
    assert!(first.contains("interface Both { a: Foo; b: Foo$1; }"));
}

#[test]
fn test_unresolved_module_fails_only_that_entry() {
    let fe = frontend(vec![
        module("src/good.d.ts")
            .declaration(interface("Good", "interface % {}"))
            .export(Export::named("Good", "Good"))
            .build(),
        module("src/bad.d.ts")
            .import(Import::new("./missing").named("Gone", "Gone"))
            .declaration(interface("Bad", "interface % { gone: @Gone; }"))
            .export(Export::named("Bad", "Bad"))
            .build(),
    ]);

    let output = bundle(&fe, &["src/good.d.ts", "src/bad.d.ts"]);

    assert_eq!(output.chunks.len(), 1);
    assert!(output.chunk("good.d.ts").is_some());
    assert!(output.chunk("bad.d.ts").is_none());
    assert!(output.manifest.files("src/bad.d.ts").is_none());

    match output.failure(&id("src/bad.d.ts")) {
        Some(Error::UnresolvedModule {
            specifier,
            importer,
        }) => {
            assert_eq!(specifier, "./missing");
            assert_eq!(importer.as_ref(), Some(&id("src/bad.d.ts")));
        }
        other => panic!("expected unresolved module, got {other:?}"),
    }

    match output.into_result() {
        Err(Error::EntriesFailed(failures)) => assert_eq!(failures.len(), 1),
        other => panic!("expected entries failure, got {other:?}"),
    }
}

#[test]
fn test_unresolved_symbol_names_the_declaration() {
    let fe = frontend(vec![
        module("src/index.d.ts")
            .declaration(interface("Foo", "interface % { x: @Nowhere; }"))
            .export(Export::named("Foo", "Foo"))
            .build(),
    ]);

    let output = bundle(&fe, &["src/index.d.ts"]);
    match output.failure(&id("src/index.d.ts")) {
        Some(Error::UnresolvedSymbol {
            name,
            module,
            declaration,
        }) => {
            assert_eq!(name, "Nowhere");
            assert_eq!(module, &id("src/index.d.ts"));
            assert_eq!(declaration.as_deref(), Some("Foo"));
        }
        other => panic!("expected unresolved symbol, got {other:?}"),
    }
}

#[test]
fn test_missing_entry_is_unresolved() {
    let output = bundle(&StaticFrontEnd::new(), &["src/nope.d.ts"]);
    assert!(matches!(
        output.failure(&id("src/nope.d.ts")),
        Some(Error::UnresolvedModule { importer: None, .. })
    ));
}

#[test]
fn test_rename_exhaustion_is_reported() {
    let modules = ["m1", "m2", "m3"].map(|name| {
        module(&format!("src/{name}.d.ts"))
            .declaration(interface("Foo", "interface % {}"))
            .export(Export::named("Foo", "Foo"))
            .build()
    });
    let fe = frontend(
        std::iter::once(
            module("src/index.d.ts")
                .export(Export::re_export("A", "Foo", "./m1"))
                .export(Export::re_export("B", "Foo", "./m2"))
                .export(Export::re_export("C", "Foo", "./m3"))
                .build(),
        )
        .chain(modules)
        .collect(),
    );

    let bundler = fob_dts::DtsBundler::new(DtsBundleConfig::new(["src/index.d.ts"]))
        .unwrap()
        .max_rename_suffix(1);
    let output = bundler.bundle(&fe);

    match output.failure(&id("src/index.d.ts")) {
        Some(Error::RenameExhausted(exhausted)) => {
            assert_eq!(exhausted.name, "Foo");
            assert_eq!(exhausted.limit, 1);
        }
        other => panic!("expected rename exhaustion, got {other:?}"),
    }
}

#[test]
fn test_retained_doc_comment_is_copied_verbatim() {
    let fe = frontend(vec![
        module("src/index.d.ts")
            .declaration(
                interface("Options", "interface % { retries: number; }")
                    .with_doc("/**\n * Client options.\n *\n * @public\n */"),
            )
            .export(Export::named("Options", "Options"))
            .build(),
    ]);

    let output = bundle(&fe, &["src/index.d.ts"]).into_result().unwrap();

    assert_eq!(
        code(&output, "index.d.ts"),
        "//#region src/index.d.ts\n\
         /**\n * Client options.\n *\n * @public\n */\n\
         interface Options { retries: number; }\n\
         //#endregion src/index.d.ts\n\
         \n\
         export { Options };\n"
    );
}

#[test]
fn test_merged_symbol_keeps_doc_on_first_declaration_only() {
    let fe = frontend(vec![
        module("src/index.d.ts")
            .declaration(
                interface("Foo", "interface % { id: string; }").with_doc("/** Foo docs. */"),
            )
            .declaration(
                decl(
                    DeclarationKind::Namespace,
                    "Foo",
                    "namespace % { const version: string; }",
                )
                .with_doc("/** Foo docs. */"),
            )
            .export(Export::named("Foo", "Foo"))
            .build(),
    ]);

    let output = bundle(&fe, &["src/index.d.ts"]).into_result().unwrap();
    let code = code(&output, "index.d.ts");

    assert_eq!(code.matches("Foo docs").count(), 1);
    assert_eq!(
        code,
        "//#region src/index.d.ts\n\
         /** Foo docs. */\n\
         interface Foo { id: string; }\n\
         declare namespace Foo { const version: string; }\n\
         //#endregion src/index.d.ts\n\
         \n\
         export { Foo };\n"
    );
}

#[test]
fn test_nested_wildcard_namespaces_nest_one_level_per_hop() {
    let fe = frontend(vec![
        module("src/index.d.ts")
            .export(Export::namespace("outer", "./outer"))
            .build(),
        module("src/outer.d.ts")
            .declaration(interface("A", "interface % {}"))
            .export(Export::named("A", "A"))
            .export(Export::namespace("inner", "./inner"))
            .build(),
        module("src/inner.d.ts")
            .declaration(interface("B", "interface % {}"))
            .export(Export::named("B", "B"))
            .build(),
    ]);

    let output = bundle(&fe, &["src/index.d.ts"]).into_result().unwrap();

    assert_eq!(
        code(&output, "index.d.ts"),
        "//#region src/inner.d.ts\n\
         interface B {}\n\
         declare namespace inner {\n  export { B };\n}\n\
         //#endregion src/inner.d.ts\n\
         \n\
         //#region src/outer.d.ts\n\
         interface A {}\n\
         declare namespace outer {\n  export { A, inner };\n}\n\
         //#endregion src/outer.d.ts\n\
         \n\
         export { outer };\n"
    );
}

#[test]
fn test_cyclic_modules_emit_in_discovery_order() {
    let fe = frontend(vec![
        module("src/a.d.ts")
            .import(Import::new("./b").named("B", "B"))
            .declaration(interface("A", "interface % { b: @B; }"))
            .export(Export::named("A", "A"))
            .build(),
        module("src/b.d.ts")
            .import(Import::new("./a").named("A", "A"))
            .declaration(interface("B", "interface % { a: @A; }"))
            .export(Export::named("B", "B"))
            .build(),
    ]);

    let output = bundle(&fe, &["src/a.d.ts"]).into_result().unwrap();

    assert_eq!(
        code(&output, "a.d.ts"),
        "//#region src/a.d.ts\n\
         interface A { b: B; }\n\
         //#endregion src/a.d.ts\n\
         \n\
         //#region src/b.d.ts\n\
         interface B { a: A; }\n\
         //#endregion src/b.d.ts\n\
         \n\
         export { A };\n"
    );
}
