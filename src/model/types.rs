// ==============================================================================
// Field Type Descriptors
// ==============================================================================
//
// Catalog fields describe their type with a short string: a primitive name
// (`int`, `string`, ...), the `Polymorphic` marker, a nested schema name, or
// one of the structural forms `T[]`, `T[][]`, `Map<K,V>`, `Key<T>` and `enum`.
// We parse that string once into a `TypeDescriptor` so translation becomes a
// total match instead of a chain of string prefix checks.

use std::fmt;

/// The primitive kinds the catalog knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    String,
}

impl PrimitiveKind {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "boolean" => PrimitiveKind::Boolean,
            "byte" => PrimitiveKind::Byte,
            "short" => PrimitiveKind::Short,
            "int" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "float" => PrimitiveKind::Float,
            "string" => PrimitiveKind::String,
            _ => return None,
        })
    }
}

/// A parsed field type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    /// The catalog's "any primitive value" marker.
    Polymorphic,
    /// `T[]`. A two-dimensional array `T[][]` is an array of arrays.
    Array(Box<TypeDescriptor>),
    /// `Map<K,V>`.
    Map {
        key: Box<TypeDescriptor>,
        value: Box<TypeDescriptor>,
    },
    /// `Key<T>`: a reference to a server-side object by key.
    Key(String),
    /// The `enum` marker; the enum's name comes from the field's
    /// `schema_name`.
    Enum,
    /// Anything else: a nested schema name or a type the target IDL already
    /// understands.
    Named(String),
}

/// Why a descriptor string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureDefect {
    Empty,
    MissingElementType,
    Unclosed(&'static str),
    MissingMapComma,
    EmptyMapComponent,
    EmptyKeyTarget,
}

impl fmt::Display for StructureDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureDefect::Empty => write!(f, "type descriptor is empty"),
            StructureDefect::MissingElementType => {
                write!(f, "array marker `[]` has no element type")
            }
            StructureDefect::Unclosed(opener) => {
                write!(f, "`{opener}` is not closed with `>`")
            }
            StructureDefect::MissingMapComma => {
                write!(f, "map type must have the form `Map<K,V>`")
            }
            StructureDefect::EmptyMapComponent => {
                write!(f, "map key or value type is empty")
            }
            StructureDefect::EmptyKeyTarget => write!(f, "`Key<>` has no target type"),
        }
    }
}

impl TypeDescriptor {
    /// Parse a catalog type descriptor.
    pub fn parse(descriptor: &str) -> Result<Self, StructureDefect> {
        if descriptor.is_empty() {
            return Err(StructureDefect::Empty);
        }

        if let Some(element) = descriptor.strip_suffix("[]") {
            if element.is_empty() {
                return Err(StructureDefect::MissingElementType);
            }
            return Ok(TypeDescriptor::Array(Box::new(Self::parse(element)?)));
        }

        if let Some(rest) = descriptor.strip_prefix("Map<") {
            let body = rest
                .strip_suffix('>')
                .ok_or(StructureDefect::Unclosed("Map<"))?;
            let (key, value) = body
                .split_once(',')
                .ok_or(StructureDefect::MissingMapComma)?;
            if key.is_empty() || value.is_empty() {
                return Err(StructureDefect::EmptyMapComponent);
            }
            return Ok(TypeDescriptor::Map {
                key: Box::new(Self::parse(key)?),
                value: Box::new(Self::parse(value)?),
            });
        }

        if let Some(rest) = descriptor.strip_prefix("Key<") {
            let target = rest
                .strip_suffix('>')
                .ok_or(StructureDefect::Unclosed("Key<"))?;
            if target.is_empty() {
                return Err(StructureDefect::EmptyKeyTarget);
            }
            return Ok(TypeDescriptor::Key(target.to_string()));
        }

        Ok(match descriptor {
            "enum" => TypeDescriptor::Enum,
            "Polymorphic" => TypeDescriptor::Polymorphic,
            other => match PrimitiveKind::from_name(other) {
                Some(kind) => TypeDescriptor::Primitive(kind),
                None => TypeDescriptor::Named(other.to_string()),
            },
        })
    }
}
