use indexmap::IndexMap;

/// Name of the bookkeeping field every catalog schema carries. It is never
/// emitted, but it still occupies a field position and therefore a tag.
pub const META_FIELD: &str = "__meta";

/// One struct-like API type from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub name: String,
    /// Fields in declaration order. Position determines the emitted tag.
    pub fields: Vec<Field>,
}

/// A member of a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// Raw type descriptor, e.g. `int`, `string[]`, `Map<string,int>`,
    /// `enum`, or a nested schema name.
    pub type_name: String,
    /// Name of the nested schema or enum this field depends on, if any.
    pub schema_name: Option<String>,
    pub required: bool,
    pub help: String,
    /// Enum value names, present when `type_name` is an enum marker.
    pub values: Vec<String>,
}

impl Field {
    /// Create a field with no dependency edge, no help text and no enum values.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            type_name: type_name.into(),
            schema_name: None,
            required: false,
            help: String::new(),
            values: Vec::new(),
        }
    }

    pub fn is_meta(&self) -> bool {
        self.name == META_FIELD
    }

    /// Whether this field's type is an enum marker (`enum`, `enum[]`, ...).
    /// Enum declarations are leaves in the dependency graph: their values are
    /// carried on the field itself rather than in a catalog schema.
    pub fn is_enum(&self) -> bool {
        self.type_name.starts_with("enum")
    }
}

/// The full set of known API schemas, keyed by name, in catalog order.
///
/// Iteration order is the order in which schemas were inserted, which makes
/// every downstream step deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    schemas: IndexMap<String, Schema>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            schemas: IndexMap::new(),
        }
    }

    /// Add a schema. Returns an error if a schema with the same name is
    /// already present.
    pub fn insert(&mut self, schema: Schema) -> Result<(), String> {
        if self.schemas.contains_key(&schema.name) {
            return Err(format!("duplicate schema name: {}", schema.name));
        }
        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Look up a schema by name.
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// All schemas, in catalog order.
    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    /// All schema names, in catalog order. Used to suggest similar names for
    /// typos in `schema_name` references.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl FromIterator<Schema> for Catalog {
    /// Collect schemas into a catalog. Later duplicates replace earlier ones
    /// in place; use [`Catalog::insert`] to reject duplicates instead.
    fn from_iter<I: IntoIterator<Item = Schema>>(iter: I) -> Self {
        Catalog {
            schemas: iter.into_iter().map(|s| (s.name.clone(), s)).collect(),
        }
    }
}
