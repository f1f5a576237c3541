// ==============================================================================
// Declaration Ordering: Dependencies Before Dependents
// ==============================================================================
//
// Thrift requires a type to be declared before a struct can use it. The
// catalog lists schemas in no particular order, so we walk it depth-first
// from each schema, following field references in declaration order, and
// place a schema only after everything it references has been placed. Enums
// are leaves: their values travel on the referencing field and they are
// placed at the point of first use.
//
// A schema is marked as in progress while its fields are visited. That mark
// is what makes the walk terminate on self-references and cycles. A
// self-reference is harmless. A true cycle (A -> B -> A) cannot be ordered:
// whichever schema closes the loop lands before a type it needs. We place it
// anyway and record the cycle so the caller can warn about it (or refuse it).

use indexmap::IndexMap;

use crate::error::MissingSchemaError;
use crate::model::schema::{Catalog, Schema};
use crate::suggest;

/// One entry of the ordered declaration set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declaration<'a> {
    Struct(&'a Schema),
    /// An enum, represented by its value names in declaration order.
    Enum(&'a [String]),
}

/// Declarations keyed by name, in the order they must be emitted.
///
/// Insertion is idempotent: a name is recorded once, at the position of its
/// first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationSet<'a> {
    entries: IndexMap<&'a str, Declaration<'a>>,
}

impl<'a> DeclarationSet<'a> {
    pub fn new() -> Self {
        DeclarationSet {
            entries: IndexMap::new(),
        }
    }

    /// Insert a declaration unless the name is already present. Returns
    /// whether the declaration was inserted.
    pub fn insert(&mut self, name: &'a str, declaration: Declaration<'a>) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        self.entries.insert(name, declaration);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Declaration<'a>> {
        self.entries.get(name)
    }

    /// Position of `name` in declaration order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.get_index_of(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &Declaration<'a>)> {
        self.entries.iter().map(|(name, decl)| (*name, decl))
    }

    pub fn names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accumulates a dependency-ordered declaration set across one or more root
/// schemas.
#[derive(Debug, Default)]
pub struct DependencyOrder<'a> {
    declarations: DeclarationSet<'a>,
    /// Schemas currently being visited, outermost first.
    in_progress: Vec<&'a str>,
    cycles: Vec<Vec<String>>,
}

impl<'a> DependencyOrder<'a> {
    pub fn new() -> Self {
        DependencyOrder {
            declarations: DeclarationSet::new(),
            in_progress: Vec::new(),
            cycles: Vec::new(),
        }
    }

    /// Add `schema` and everything reachable from it through field
    /// references, dependencies first. Schemas already placed or currently
    /// in progress are skipped.
    ///
    /// Fails if a field references a schema that is not in `catalog`.
    pub fn add_schema(
        &mut self,
        schema: &'a Schema,
        catalog: &'a Catalog,
    ) -> Result<(), MissingSchemaError> {
        if self.declarations.contains(&schema.name) || self.is_in_progress(&schema.name) {
            return Ok(());
        }
        self.in_progress.push(&schema.name);
        let result = self.visit_fields(schema, catalog);
        self.in_progress.pop();
        result?;
        self.declarations
            .insert(&schema.name, Declaration::Struct(schema));
        Ok(())
    }

    fn visit_fields(
        &mut self,
        schema: &'a Schema,
        catalog: &'a Catalog,
    ) -> Result<(), MissingSchemaError> {
        for field in &schema.fields {
            let Some(dependency) = field.schema_name.as_deref() else {
                continue;
            };
            if self.is_in_progress(dependency) {
                if !field.is_enum() && dependency != schema.name {
                    self.note_cycle(dependency);
                }
                continue;
            }
            if self.declarations.contains(dependency) {
                continue;
            }
            if field.is_enum() {
                self.declarations
                    .insert(dependency, Declaration::Enum(&field.values));
                continue;
            }
            let nested = catalog.get(dependency).ok_or_else(|| MissingSchemaError {
                schema: schema.name.clone(),
                field: field.name.clone(),
                missing: dependency.to_string(),
                suggestion: suggest::closest(dependency, catalog.names()).map(str::to_string),
            })?;
            self.add_schema(nested, catalog)?;
        }
        Ok(())
    }

    fn is_in_progress(&self, name: &str) -> bool {
        self.in_progress.iter().any(|n| *n == name)
    }

    /// Record the cycle closed by a reference back to `dependency`, which is
    /// still being visited further up the stack.
    fn note_cycle(&mut self, dependency: &str) {
        let Some(start) = self.in_progress.iter().position(|n| *n == dependency) else {
            return;
        };
        let mut path: Vec<String> = self.in_progress[start..]
            .iter()
            .map(|n| n.to_string())
            .collect();
        path.push(dependency.to_string());
        if !self.cycles.contains(&path) {
            self.cycles.push(path);
        }
    }

    pub fn declarations(&self) -> &DeclarationSet<'a> {
        &self.declarations
    }

    /// Cycles found so far, each starting and ending with the same name.
    pub fn cycles(&self) -> &[Vec<String>] {
        &self.cycles
    }

    pub fn into_parts(self) -> (DeclarationSet<'a>, Vec<Vec<String>>) {
        (self.declarations, self.cycles)
    }
}

/// Order the whole catalog: every schema appears exactly once, and schemas
/// nobody references are placed in catalog order.
pub fn order_catalog(catalog: &Catalog) -> Result<DependencyOrder<'_>, MissingSchemaError> {
    let mut order = DependencyOrder::new();
    for schema in catalog.schemas() {
        if !order.declarations.contains(&schema.name) {
            order.add_schema(schema, catalog)?;
        }
    }
    Ok(order)
}
