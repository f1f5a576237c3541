// ==============================================================================
// Type Translation: Catalog Descriptors to Thrift Types
// ==============================================================================
//
// The translation table is fixed. Structural descriptors wrap their element
// translation (`T[]` -> `list<T>`, `Map<K,V>` -> `map<String,V>`), and any
// name outside the table passes through unchanged, which is how nested
// schemas and enums are referenced.
//
// Map keys are always emitted as `String` whatever the declared key type,
// and `Key<T>` references become plain `String`s. Downstream bindings rely
// on both.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{UnsupportedStructure, UnsupportedStructureError};
use crate::model::schema::{Field, Schema};
use crate::model::types::{PrimitiveKind, TypeDescriptor};

/// Name of the union standing in for the catalog's polymorphic value type.
pub const PRIMITIVE_UNION: &str = "PrimitiveUnion";

/// A Thrift type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThriftType {
    /// A fixed type name from the translation table.
    Base(&'static str),
    List(Box<ThriftType>),
    Map {
        key: Box<ThriftType>,
        value: Box<ThriftType>,
    },
    /// A nested struct or enum, or a name passed through verbatim.
    Named(String),
}

impl fmt::Display for ThriftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThriftType::Base(name) => f.write_str(name),
            ThriftType::List(inner) => write!(f, "list<{inner}>"),
            ThriftType::Map { key, value } => write!(f, "map<{key},{value}>"),
            ThriftType::Named(name) => f.write_str(name),
        }
    }
}

/// The Thrift spelling of a catalog primitive.
pub fn primitive(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Boolean => "bool",
        PrimitiveKind::Byte => "i8",
        PrimitiveKind::Short => "i16",
        PrimitiveKind::Int => "i32",
        PrimitiveKind::Long => "i64",
        PrimitiveKind::Float => "double",
        PrimitiveKind::String => "String",
    }
}

/// Translate a parsed descriptor. `schema_name` names the enum for `enum`
/// markers; other descriptors ignore it.
pub fn translate(
    descriptor: &TypeDescriptor,
    schema_name: Option<&str>,
) -> Result<ThriftType, UnsupportedStructure> {
    Ok(match descriptor {
        TypeDescriptor::Primitive(kind) => ThriftType::Base(primitive(*kind)),
        TypeDescriptor::Polymorphic => ThriftType::Base(PRIMITIVE_UNION),
        TypeDescriptor::Array(element) => {
            ThriftType::List(Box::new(translate(element, schema_name)?))
        }
        TypeDescriptor::Map { value, .. } => ThriftType::Map {
            key: Box::new(ThriftType::Base(primitive(PrimitiveKind::String))),
            value: Box::new(translate(value, schema_name)?),
        },
        TypeDescriptor::Key(_) => ThriftType::Base(primitive(PrimitiveKind::String)),
        TypeDescriptor::Enum => ThriftType::Named(
            schema_name
                .ok_or(UnsupportedStructure::UnnamedEnum)?
                .to_string(),
        ),
        TypeDescriptor::Named(name) => ThriftType::Named(name.clone()),
    })
}

/// Translates field types and remembers every distinct descriptor it has
/// seen, for the verbose translation report.
#[derive(Debug, Default)]
pub struct Translator {
    seen: IndexMap<(String, Option<String>), String>,
}

impl Translator {
    pub fn new() -> Self {
        Translator {
            seen: IndexMap::new(),
        }
    }

    /// Parse and translate the type of `field`, declared on `schema`.
    pub fn translate_field(
        &mut self,
        schema: &Schema,
        field: &Field,
    ) -> Result<ThriftType, UnsupportedStructureError> {
        let schema_name = field.schema_name.as_deref();
        let result = TypeDescriptor::parse(&field.type_name)
            .map_err(UnsupportedStructure::Malformed)
            .and_then(|descriptor| translate(&descriptor, schema_name));
        let ty = result.map_err(|defect| UnsupportedStructureError {
            schema: schema.name.clone(),
            field: field.name.clone(),
            descriptor: field.type_name.clone(),
            defect,
        })?;

        let key = (field.type_name.clone(), field.schema_name.clone());
        self.seen.entry(key).or_insert_with(|| ty.to_string());
        Ok(ty)
    }

    /// Every `(descriptor, schema_name)` pair translated so far, with its
    /// Thrift rendering, in first-seen order.
    pub fn translations(&self) -> &IndexMap<(String, Option<String>), String> {
        &self.seen
    }

    pub fn into_translations(self) -> IndexMap<(String, Option<String>), String> {
        self.seen
    }
}
