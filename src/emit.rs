// ==============================================================================
// Thrift IDL Emission
// ==============================================================================
//
// Emission happens in two steps. `ThriftDocument::lower` walks the ordered
// declarations and translates every field type; this is the only step that
// can fail, so a malformed descriptor aborts before any text exists.
// `ThriftDocument::lines` then produces the document lazily, one line at a
// time, and cannot fail.
//
// Document layout:
//
//   header comment, namespace, the fixed `PrimitiveUnion`, then one enum or
//   struct block per declaration, each followed by a blank line.
//
// Struct field tags are the field's zero-based position among *all* fields of
// the schema, including the `__meta` field that is never rendered. Enum value
// tags start at 1.

use std::borrow::Cow;

use crate::error::UnsupportedStructureError;
use crate::resolve::{Declaration, DeclarationSet};
use crate::translate::{PRIMITIVE_UNION, ThriftType, Translator};

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "water.bindings.structs";

/// Identifiers Thrift rejects as field names. Fields with these names get a
/// trailing underscore.
pub const RESERVED_WORDS: [&str; 5] = ["from", "type", "exception", "lambda", "required"];

/// Help comments are wrapped to this many columns, prefix included.
const WRAP_WIDTH: usize = 120;
const COMMENT_PREFIX: &str = "  # ";

const HEADER: [&str; 6] = [
    "#-------------------------------------------------------------------------------",
    "# Thrift bindings for H2O Machine Learning.",
    "#",
    "# This file is auto-generated by h2o-thrift from the H2O schema catalog.",
    "# Copyright 2016 H2O.ai;  Apache License Version 2.0 (see LICENSE for details)",
    "#-------------------------------------------------------------------------------",
];

/// The union members, in tag order starting at 1.
const UNION_MEMBERS: [&str; 8] = [
    "bool", "byte", "i16", "i32", "i64", "double", "binary", "string",
];

/// A fully translated Thrift document, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThriftDocument<'a> {
    namespace: String,
    blocks: Vec<Block<'a>>,
}

/// One enum or struct declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    Enum {
        name: &'a str,
        values: &'a [String],
    },
    Struct {
        name: &'a str,
        fields: Vec<StructField<'a>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField<'a> {
    pub tag: usize,
    pub required: bool,
    pub ty: ThriftType,
    /// Field name, escaped if it is a reserved word.
    pub name: Cow<'a, str>,
    pub help: &'a str,
}

impl<'a> ThriftDocument<'a> {
    /// Translate every declaration into its Thrift form.
    pub fn lower(
        declarations: &DeclarationSet<'a>,
        namespace: &str,
        translator: &mut Translator,
    ) -> Result<Self, UnsupportedStructureError> {
        let mut blocks = Vec::with_capacity(declarations.len());
        for (name, declaration) in declarations.iter() {
            match *declaration {
                Declaration::Enum(values) => {
                    tracing::debug!("Generating enum {name}");
                    blocks.push(Block::Enum { name, values });
                }
                Declaration::Struct(schema) => {
                    tracing::debug!("Generating struct {name}");
                    let mut fields = Vec::with_capacity(schema.fields.len());
                    for (tag, field) in schema.fields.iter().enumerate() {
                        if field.is_meta() {
                            continue;
                        }
                        fields.push(StructField {
                            tag,
                            required: field.required,
                            ty: translator.translate_field(schema, field)?,
                            name: escape_field_name(&field.name),
                            help: &field.help,
                        });
                    }
                    blocks.push(Block::Struct { name, fields });
                }
            }
        }
        Ok(ThriftDocument {
            namespace: namespace.to_string(),
            blocks,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn blocks(&self) -> &[Block<'a>] {
        &self.blocks
    }

    /// The document as a lazy sequence of lines, without line terminators.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        HEADER
            .into_iter()
            .map(str::to_string)
            .chain([
                String::new(),
                format!("namespace * {}", self.namespace),
                String::new(),
            ])
            .chain(union_lines())
            .chain(self.blocks.iter().flat_map(|block| block.lines()))
    }

    /// The whole document, every line terminated by `\n`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in self.lines() {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

fn union_lines() -> impl Iterator<Item = String> {
    std::iter::once(format!("union {PRIMITIVE_UNION} {{"))
        .chain(
            UNION_MEMBERS
                .into_iter()
                .enumerate()
                .map(|(i, ty)| format!("  {}: {ty} {ty}_field", i + 1)),
        )
        .chain(["}".to_string(), String::new()])
}

impl Block<'_> {
    fn lines(&self) -> Box<dyn Iterator<Item = String> + '_> {
        match self {
            Block::Enum { name, values } => Box::new(
                std::iter::once(format!("enum {name} {{"))
                    .chain(
                        values
                            .iter()
                            .enumerate()
                            .map(|(i, value)| format!("  {value} = {},", i + 1)),
                    )
                    .chain(["}".to_string(), String::new()]),
            ),
            Block::Struct { name, fields } => Box::new(
                [format!("struct {name} {{"), String::new()]
                    .into_iter()
                    .chain(fields.iter().flat_map(|field| field.lines()))
                    .chain(["}".to_string(), String::new()]),
            ),
        }
    }
}

impl StructField<'_> {
    fn lines(&self) -> impl Iterator<Item = String> + '_ {
        let qualifier = if self.required { "required" } else { "optional" };
        wrap_comment(self.help).into_iter().chain([
            format!("  {}: {qualifier} {} {},", self.tag, self.ty, self.name),
            String::new(),
        ])
    }
}

/// Append `_` to field names Thrift reserves.
pub fn escape_field_name(name: &str) -> Cow<'_, str> {
    if RESERVED_WORDS.contains(&name) {
        Cow::Owned(format!("{name}_"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Word-wrap help text into `  # `-prefixed comment lines of at most
/// [`WRAP_WIDTH`] columns. Runs of whitespace collapse to one space; a word
/// too long for a line is split. Empty help yields one empty line.
fn wrap_comment(text: &str) -> Vec<String> {
    let room = WRAP_WIDTH - COMMENT_PREFIX.len();
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        loop {
            let needed = if current_len == 0 {
                word.len()
            } else {
                current_len + 1 + word.len()
            };
            if needed <= room {
                if current_len > 0 {
                    current.push(' ');
                }
                current.extend(word.iter());
                current_len = needed;
                break;
            }
            if current_len > 0 {
                lines.push(format!("{COMMENT_PREFIX}{current}"));
                current.clear();
                current_len = 0;
                continue;
            }
            // The word alone does not fit: emit a full chunk and carry on
            // with the remainder.
            let rest = word.split_off(room);
            lines.push(format!("{COMMENT_PREFIX}{}", word.iter().collect::<String>()));
            word = rest;
        }
    }

    if current_len > 0 {
        lines.push(format!("{COMMENT_PREFIX}{current}"));
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::schema::{Field, Schema};
    use pretty_assertions::assert_eq;

    fn lower<'a>(declarations: &DeclarationSet<'a>) -> ThriftDocument<'a> {
        ThriftDocument::lower(declarations, DEFAULT_NAMESPACE, &mut Translator::new())
            .expect("declarations lower")
    }

    #[test]
    fn reserved_words_are_escaped() {
        assert_eq!(escape_field_name("type"), "type_");
        assert_eq!(escape_field_name("from"), "from_");
        assert_eq!(escape_field_name("lambda"), "lambda_");
        assert_eq!(escape_field_name("color"), "color");
        assert!(matches!(escape_field_name("color"), Cow::Borrowed(_)));
    }

    #[test]
    fn empty_document_has_header_and_union() {
        let declarations = DeclarationSet::new();
        let lines: Vec<String> = lower(&declarations).lines().collect();
        assert_eq!(lines[6], "");
        assert_eq!(lines[7], "namespace * water.bindings.structs");
        assert_eq!(lines[9], "union PrimitiveUnion {");
        assert_eq!(lines[10], "  1: bool bool_field");
        assert_eq!(lines[11], "  2: byte byte_field");
        assert_eq!(lines[16], "  7: binary binary_field");
        assert_eq!(lines[17], "  8: string string_field");
        assert_eq!(lines[18], "}");
        assert_eq!(lines[19], "");
        assert_eq!(lines.len(), 20);
    }

    #[test]
    fn enum_tags_start_at_one() {
        let values = vec!["Train".to_string(), "Valid".to_string()];
        let mut declarations = DeclarationSet::new();
        declarations.insert("Split", Declaration::Enum(&values));
        let doc = lower(&declarations);
        let lines: Vec<String> = doc.blocks()[0].lines().collect();
        assert_eq!(lines, ["enum Split {", "  Train = 1,", "  Valid = 2,", "}", ""]);
    }

    #[test]
    fn struct_tags_count_the_meta_field() {
        let schema = Schema {
            name: "ColV3".to_string(),
            fields: vec![
                Field::new("__meta", "Meta"),
                Field {
                    required: true,
                    help: "Column label".to_string(),
                    ..Field::new("label", "string")
                },
                Field {
                    help: "Column type".to_string(),
                    ..Field::new("type", "string")
                },
            ],
        };
        let mut declarations = DeclarationSet::new();
        declarations.insert("ColV3", Declaration::Struct(&schema));
        let doc = lower(&declarations);
        let lines: Vec<String> = doc.blocks()[0].lines().collect();
        assert_eq!(
            lines,
            [
                "struct ColV3 {",
                "",
                "  # Column label",
                "  1: required String label,",
                "",
                "  # Column type",
                "  2: optional String type_,",
                "",
                "}",
                "",
            ]
        );
    }

    #[test]
    fn empty_help_leaves_a_blank_line() {
        let schema = Schema {
            name: "S".to_string(),
            fields: vec![Field::new("x", "int")],
        };
        let mut declarations = DeclarationSet::new();
        declarations.insert("S", Declaration::Struct(&schema));
        let doc = lower(&declarations);
        let lines: Vec<String> = doc.blocks()[0].lines().collect();
        assert_eq!(
            lines,
            ["struct S {", "", "", "  0: optional i32 x,", "", "}", ""]
        );
    }

    #[test]
    fn malformed_type_fails_lowering() {
        let schema = Schema {
            name: "S".to_string(),
            fields: vec![Field::new("m", "Map<int>")],
        };
        let mut declarations = DeclarationSet::new();
        declarations.insert("S", Declaration::Struct(&schema));
        let err = ThriftDocument::lower(&declarations, DEFAULT_NAMESPACE, &mut Translator::new())
            .unwrap_err();
        assert_eq!(err.field, "m");
    }

    #[test]
    fn rendering_is_deterministic() {
        let schema = Schema {
            name: "S".to_string(),
            fields: vec![Field::new("p", "Polymorphic")],
        };
        let mut declarations = DeclarationSet::new();
        declarations.insert("S", Declaration::Struct(&schema));
        let first = lower(&declarations).render();
        let second = lower(&declarations).render();
        assert_eq!(first, second);
        assert!(first.contains("  0: optional PrimitiveUnion p,\n"));
        assert!(first.ends_with("}\n\n"));
    }

    #[test]
    fn wrap_short_text_is_one_line() {
        assert_eq!(wrap_comment("x coord"), ["  # x coord"]);
        assert_eq!(wrap_comment("  spaced \n  out  "), ["  # spaced out"]);
        assert_eq!(wrap_comment(""), [""]);
        assert_eq!(wrap_comment("   "), [""]);
    }

    #[test]
    fn wrap_breaks_at_width() {
        let text = ["word"; 40].join(" ");
        let lines = wrap_comment(&text);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.starts_with(COMMENT_PREFIX));
            assert!(line.chars().count() <= WRAP_WIDTH, "{line}");
        }
        // 23 four-letter words and their separators take 114 columns after
        // the prefix; a 24th would need 119 of the 116 available.
        assert_eq!(lines[0], format!("{COMMENT_PREFIX}{}", ["word"; 23].join(" ")));
        let rejoined: Vec<&str> = lines
            .iter()
            .flat_map(|l| l[COMMENT_PREFIX.len()..].split(' '))
            .collect();
        assert_eq!(rejoined.len(), 40);
    }

    #[test]
    fn wrap_splits_overlong_words() {
        let long = "x".repeat(250);
        let lines = wrap_comment(&format!("a {long} b"));
        assert_eq!(lines[0], "  # a");
        assert_eq!(lines[1].len(), WRAP_WIDTH);
        assert_eq!(lines[2].len(), WRAP_WIDTH);
        assert_eq!(lines[3], format!("{COMMENT_PREFIX}{} b", "x".repeat(250 - 2 * 116)));
        assert_eq!(lines.len(), 4);
    }
}
