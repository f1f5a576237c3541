// ==============================================================================
// Diagnostics
// ==============================================================================
//
// Every failure the compiler can report is a concrete type implementing
// `miette::Diagnostic`, so the CLI renders error codes, help text and (for
// JSON syntax errors) source snippets. `miette` is built without its derive
// feature, so the trait impls are written out by hand.

use std::fmt;

use miette::{Diagnostic, LabeledSpan, NamedSource, Severity, SourceSpan};

use crate::model::types::StructureDefect;

/// A catalog parse error with source location information for rich
/// diagnostics.
#[derive(Debug)]
pub struct CatalogDiagnostic {
    pub src: NamedSource<String>,
    pub span: SourceSpan,
    pub message: String,
    /// Label shown at the span. Falls back to `message` when `None`.
    pub label: Option<String>,
    pub help: Option<String>,
}

impl fmt::Display for CatalogDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CatalogDiagnostic {}

impl Diagnostic for CatalogDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("h2o_thrift::catalog"))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let text = self.label.clone().unwrap_or_else(|| self.message.clone());
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(text),
            self.span,
        ))))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }
}

/// A field's `schema_name` names a schema that is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSchemaError {
    /// The schema declaring the field.
    pub schema: String,
    pub field: String,
    /// The referenced name that could not be found.
    pub missing: String,
    /// A catalog name close to `missing`, if any.
    pub suggestion: Option<String>,
}

impl fmt::Display for MissingSchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field `{}` of schema `{}` references unknown schema `{}`",
            self.field, self.schema, self.missing
        )
    }
}

impl std::error::Error for MissingSchemaError {}

impl Diagnostic for MissingSchemaError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("h2o_thrift::missing_schema"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.suggestion {
            Some(name) => format!("did you mean `{name}`?"),
            None => "every referenced schema must be present in the catalog".to_string(),
        };
        Some(Box::new(help))
    }
}

/// A field's type descriptor is structurally malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedStructureError {
    pub schema: String,
    pub field: String,
    pub descriptor: String,
    pub defect: UnsupportedStructure,
}

/// The specific problem behind an [`UnsupportedStructureError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedStructure {
    Malformed(StructureDefect),
    /// An `enum` marker on a field with no `schema_name` to name the enum.
    UnnamedEnum,
}

impl fmt::Display for UnsupportedStructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported type `{}` on field `{}` of schema `{}`: ",
            self.descriptor, self.field, self.schema
        )?;
        match &self.defect {
            UnsupportedStructure::Malformed(defect) => write!(f, "{defect}"),
            UnsupportedStructure::UnnamedEnum => {
                write!(f, "enum field has no `schema_name`")
            }
        }
    }
}

impl std::error::Error for UnsupportedStructureError {}

impl Diagnostic for UnsupportedStructureError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("h2o_thrift::unsupported_structure"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(
            "supported forms are `T`, `T[]`, `T[][]`, `Map<K,V>`, `Key<T>` and `enum`",
        ))
    }
}

/// Schemas that reference each other in a loop. The declaration order emitted
/// for such schemas cannot place every dependency first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCycle {
    /// The cycle, starting and ending with the same schema name.
    pub path: Vec<String>,
    pub severity: Severity,
}

impl DependencyCycle {
    /// The schema that closes the loop. It ends up declared before the type
    /// it references.
    pub fn misordered(&self) -> &str {
        self.path
            .len()
            .checked_sub(2)
            .and_then(|i| self.path.get(i))
            .map(String::as_str)
            .unwrap_or_default()
    }
}

impl fmt::Display for DependencyCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dependency cycle: {}", self.path.join(" -> "))
    }
}

impl std::error::Error for DependencyCycle {}

impl Diagnostic for DependencyCycle {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("h2o_thrift::dependency_cycle"))
    }

    fn severity(&self) -> Option<Severity> {
        Some(self.severity)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!(
            "`{}` is declared before a type it references; Thrift compilers may reject the output",
            self.misordered()
        )))
    }
}

/// Render a diagnostic to a deterministic string for assertions.
/// Uses the non-unicode theme at 80 columns.
#[cfg(test)]
pub(crate) fn render_diagnostic(report: &miette::Report) -> String {
    use miette::{GraphicalReportHandler, GraphicalTheme};

    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::none()).with_width(80);
    let mut buf = String::new();
    handler
        .render_report(&mut buf, report.as_ref())
        .expect("render to String is infallible");
    buf
}
