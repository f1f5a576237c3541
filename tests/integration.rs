// ==============================================================================
// Library Integration Tests: Compile Catalog Fixtures End to End
// ==============================================================================
//
// These tests drive the public `Thrift` builder over the catalogs in
// `tests/fixtures/` and check the generated document: declaration order,
// field tags and qualifiers, type translation, reserved-word escaping and
// help-comment layout. The CLI surface is covered separately in `cli.rs`.

mod common;

use common::fixture;
use h2o_thrift::catalog::parse_catalog;
use h2o_thrift::{Catalog, Field, Schema, Thrift};
use pretty_assertions::assert_eq;

/// The text of one `struct`/`enum` block, from its opening line through the
/// closing brace.
fn block<'a>(document: &'a str, opening: &str) -> &'a str {
    let start = document
        .find(&format!("\n{opening} {{\n"))
        .unwrap_or_else(|| panic!("no `{opening}` block in document:\n{document}"))
        + 1;
    let len = document[start..]
        .find("\n}\n")
        .expect("block is closed")
        + 3;
    &document[start..start + len]
}

fn compile_fixture(name: &str) -> h2o_thrift::ThriftOutput {
    Thrift::new()
        .compile_str_named(&fixture(name), name)
        .unwrap_or_else(|e| panic!("{name} should compile: {e:?}"))
}

// ==============================================================================
// Ordering
// ==============================================================================

#[test]
fn test_catalog_declaration_order() {
    let output = compile_fixture("catalog.json");
    assert_eq!(
        output.declarations,
        [
            "Meta",
            "FrameKeyV3",
            "ColType",
            "ColV3",
            "FrameV3",
            "GridSearchV3",
            "TreeV3",
        ]
    );
    assert!(output.warnings.is_empty());
}

/// Every schema a struct references (other than itself) is declared earlier
/// in the document.
#[test]
fn test_dependencies_are_declared_first() {
    let source = fixture("catalog.json");
    let catalog = parse_catalog(&source, "catalog.json").expect("fixture parses");
    let output = Thrift::new()
        .compile_catalog(&catalog)
        .expect("fixture compiles");

    let position = |name: &str| {
        output
            .declarations
            .iter()
            .position(|d| d == name)
            .unwrap_or_else(|| panic!("`{name}` is not declared"))
    };
    for schema in catalog.schemas() {
        for field in &schema.fields {
            let Some(dep) = field.schema_name.as_deref() else {
                continue;
            };
            if dep == schema.name {
                continue;
            }
            assert!(
                position(dep) < position(&schema.name),
                "`{dep}` must precede `{}`",
                schema.name
            );
        }
    }
}

#[test]
fn test_every_declaration_emitted_once() {
    let output = compile_fixture("catalog.json");
    for name in ["Meta", "FrameKeyV3", "ColV3", "FrameV3", "GridSearchV3", "TreeV3"] {
        let opening = format!("\nstruct {name} {{\n");
        assert_eq!(output.document.matches(&opening).count(), 1, "{name}");
    }
    assert_eq!(output.document.matches("\nenum ColType {\n").count(), 1);
    assert_eq!(output.document.matches("\nstruct ").count(), 6);
    assert_eq!(output.document.matches("\nenum ").count(), 1);
}

#[test]
fn test_output_is_deterministic() {
    let first = compile_fixture("catalog.json");
    let second = compile_fixture("catalog.json");
    assert_eq!(first.document, second.document);
    assert_eq!(first.declarations, second.declarations);
}

// ==============================================================================
// Blocks
// ==============================================================================

#[test]
fn test_enum_block() {
    let output = compile_fixture("catalog.json");
    assert_eq!(
        block(&output.document, "enum ColType"),
        "enum ColType {\n  enum = 1,\n  string = 2,\n  int = 3,\n  real = 4,\n  time = 5,\n  uuid = 6,\n}\n"
    );
}

/// Tags count the unrendered `__meta` field, so the first visible field of a
/// metadata-bearing schema is tag 1.
#[test]
fn test_struct_tags_and_qualifiers() {
    let output = compile_fixture("catalog.json");
    let frame_key = block(&output.document, "struct FrameKeyV3");
    assert!(!frame_key.contains("__meta"));
    assert!(!frame_key.contains("Meta"));
    assert!(frame_key.contains("  1: required String name,\n"));
    assert!(frame_key.contains("  2: optional String type_,\n"));
    assert!(frame_key.contains("  3: optional String URL,\n"));

    let meta = block(&output.document, "struct Meta");
    assert!(meta.contains("  0: optional i32 schema_version,\n"));
    assert!(meta.contains("  2: optional String schema_type,\n"));
}

#[test]
fn test_field_type_translation() {
    let output = compile_fixture("catalog.json");
    let doc = &output.document;

    let col = block(doc, "struct ColV3");
    assert!(col.contains("  2: optional ColType type_,\n"));
    assert!(col.contains("  3: optional i64 missing_count,\n"));
    assert!(col.contains("  4: optional list<String> domain,\n"));
    assert!(col.contains("  5: optional list<i64> histogram_bins,\n"));

    let frame = block(doc, "struct FrameV3");
    assert!(frame.contains("  1: required String frame_id,\n"));
    assert!(frame.contains("  3: optional list<ColV3> columns,\n"));
    assert!(frame.contains("  4: optional list<list<String>> compatible_models,\n"));

    let grid = block(doc, "struct GridSearchV3");
    assert!(grid.contains("  2: optional map<String,list<PrimitiveUnion>> hyper_parameters,\n"));
    assert!(grid.contains("  3: optional i32 from_,\n"));
    assert!(grid.contains("  4: optional list<double> lambda_,\n"));

    let tree = block(doc, "struct TreeV3");
    assert!(tree.contains("  1: optional list<TreeV3> children,\n"));
    assert!(tree.contains("  2: optional map<String,i64> split_counts,\n"));
}

#[test]
fn test_help_comments() {
    let output = compile_fixture("catalog.json");
    let grid = block(&output.document, "struct GridSearchV3");
    assert!(grid.contains("\n  # Training frame\n  1: required String training_frame,\n"));
    // Empty help leaves a blank line where the comment would be.
    assert!(grid.contains("\n\n\n  5: optional PrimitiveUnion seed,\n"));

    let meta = block(&output.document, "struct Meta");
    assert!(meta.contains(
        "\n  # Simple name of H2O type that this Schema represents. Must not be changed after creation (treat as final).\n"
    ));
}

/// Appending a schema to the catalog leaves existing blocks untouched.
#[test]
fn test_blocks_are_stable_under_catalog_growth() {
    let source = fixture("catalog.json");
    let mut catalog = parse_catalog(&source, "catalog.json").expect("fixture parses");
    let before = Thrift::new()
        .compile_catalog(&catalog)
        .expect("fixture compiles");

    catalog
        .insert(Schema {
            name: "JobV3".to_string(),
            fields: vec![Field {
                schema_name: Some("FrameV3".to_string()),
                ..Field::new("dest", "FrameV3")
            }],
        })
        .expect("JobV3 is new");
    let after = Thrift::new()
        .compile_catalog(&catalog)
        .expect("grown catalog compiles");

    for opening in ["struct FrameV3", "struct ColV3", "enum ColType"] {
        assert_eq!(block(&before.document, opening), block(&after.document, opening));
    }
    assert_eq!(after.declarations.last().map(String::as_str), Some("JobV3"));
    assert!(after.document.starts_with(before.document.as_str()));
}

#[test]
fn test_empty_catalog() {
    let output = Thrift::new()
        .compile_catalog(&Catalog::new())
        .expect("empty catalog compiles");
    assert!(output.declarations.is_empty());
    assert!(output.document.contains("union PrimitiveUnion {"));
    assert!(output.document.ends_with("  8: string string_field\n}\n\n"));
}

// ==============================================================================
// Whole Documents
// ==============================================================================

#[test]
fn test_point_document() {
    let output = Thrift::new()
        .compile_str(
            r#"{"schemas": [{"name": "Point", "fields": [
                {"name": "x", "type": "int", "schema_name": null, "required": true, "help": "x coord"},
                {"name": "y", "type": "int", "schema_name": null, "required": true, "help": "y coord"}
            ]}]}"#,
        )
        .expect("Point compiles");
    insta::assert_snapshot!(output.document, @r"
#-------------------------------------------------------------------------------
# Thrift bindings for H2O Machine Learning.
#
# This file is auto-generated by h2o-thrift from the H2O schema catalog.
# Copyright 2016 H2O.ai;  Apache License Version 2.0 (see LICENSE for details)
#-------------------------------------------------------------------------------

namespace * water.bindings.structs

union PrimitiveUnion {
  1: bool bool_field
  2: byte byte_field
  3: i16 i16_field
  4: i32 i32_field
  5: i64 i64_field
  6: double double_field
  7: binary binary_field
  8: string string_field
}

struct Point {

  # x coord
  0: required i32 x,

  # y coord
  1: required i32 y,

}
");
}

#[test]
fn test_cycle_compiles_with_warning() {
    let output = compile_fixture("cycle.json");
    assert_eq!(output.declarations, ["ModelV3", "JobV3"]);
    assert_eq!(output.warnings.len(), 1);
    assert_eq!(
        output.warnings[0].to_string(),
        "dependency cycle: JobV3 -> ModelV3 -> JobV3"
    );
}
