// ==============================================================================
// Library API: the `Thrift` Builder
// ==============================================================================
//
// `Thrift` runs the whole pipeline: catalog JSON -> `Catalog` -> dependency
// order -> lowered `ThriftDocument` -> rendered text. It follows the
// non-consuming `&mut self` builder pattern, so one builder can be configured
// once and reused; all per-run state is created fresh on each call.
//
// Warnings (dependency cycles) are collected per call. They are returned in
// `ThriftOutput::warnings` on success and kept for `drain_warnings` when the
// call fails.

use std::fs;
use std::path::{Path, PathBuf};

use miette::{Context, IntoDiagnostic, Severity};

use crate::catalog::parse_catalog;
use crate::emit::{DEFAULT_NAMESPACE, ThriftDocument};
use crate::error::DependencyCycle;
use crate::model::schema::Catalog;
use crate::resolve::order_catalog;
use crate::translate::Translator;

/// File name of the generated IDL document.
pub const OUTPUT_FILE_NAME: &str = "H2O.thrift";

/// Builder for compiling a schema catalog to a Thrift IDL document.
///
/// # Examples
///
/// ```no_run
/// use h2o_thrift::Thrift;
///
/// let output = Thrift::new().compile("schemas.json")?;
/// let path = output.write_to("build/")?;
/// println!("wrote {}", path.display());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Thrift {
    namespace: String,
    deny_cycles: bool,
    /// Warnings from the most recent compilation call. Populated even when
    /// the call returns `Err`.
    accumulated_warnings: Vec<miette::Report>,
}

/// One type descriptor seen during compilation and what it became.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub descriptor: String,
    pub schema_name: Option<String>,
    pub thrift: String,
}

/// Result of compiling a catalog.
pub struct ThriftOutput {
    /// The complete IDL document, every line terminated by `\n`.
    pub document: String,
    /// Thrift namespace the document declares.
    pub namespace: String,
    /// Declaration names in emission order.
    pub declarations: Vec<String>,
    /// Distinct type descriptors translated, in first-seen order.
    pub translations: Vec<Translation>,
    /// Non-fatal warnings, each a [`miette::Report`] with
    /// `Severity::Warning`. Print with `eprintln!("{report:?}")`.
    pub warnings: Vec<miette::Report>,
}

impl std::fmt::Debug for ThriftOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThriftOutput")
            .field("namespace", &self.namespace)
            .field("declarations", &self.declarations)
            .field("document", &format_args!("[{} bytes]", self.document.len()))
            .field(
                "warnings",
                &format_args!("[{} warnings]", self.warnings.len()),
            )
            .finish()
    }
}

impl ThriftOutput {
    /// Where the document belongs relative to the destination root: the
    /// namespace with dots turned into directories, then `H2O.thrift`.
    pub fn relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self
            .namespace
            .split('.')
            .filter(|segment| !segment.is_empty())
            .collect();
        path.push(OUTPUT_FILE_NAME);
        path
    }

    /// Write the document under `dest` at [`relative_path`](Self::relative_path),
    /// creating directories as needed. The file is written to a temporary
    /// sibling first and renamed into place, so readers never see a partial
    /// document. Returns the path written.
    pub fn write_to(&self, dest: impl AsRef<Path>) -> miette::Result<PathBuf> {
        let path = dest.as_ref().join(self.relative_path());
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .into_diagnostic()
                .wrap_err_with(|| format!("create {}", dir.display()))?;
        }

        let tmp = path.with_extension("thrift.tmp");
        fs::write(&tmp, &self.document)
            .into_diagnostic()
            .wrap_err_with(|| format!("write {}", tmp.display()))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e)
                .into_diagnostic()
                .wrap_err_with(|| format!("write {}", path.display()));
        }

        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    }
}

impl Default for Thrift {
    fn default() -> Self {
        Self::new()
    }
}

impl Thrift {
    /// Create a builder using the default namespace, with cycles reported as
    /// warnings.
    pub fn new() -> Self {
        Thrift {
            namespace: DEFAULT_NAMESPACE.to_string(),
            deny_cycles: false,
            accumulated_warnings: Vec::new(),
        }
    }

    /// Set the Thrift namespace (also determines the output path).
    pub fn namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.namespace = namespace.into();
        self
    }

    /// Treat dependency cycles as errors instead of warnings.
    pub fn deny_cycles(&mut self, deny: bool) -> &mut Self {
        self.deny_cycles = deny;
        self
    }

    /// Drain warnings accumulated during the most recent `compile*` call.
    ///
    /// On success the same warnings are in [`ThriftOutput::warnings`]; on
    /// failure this is the only way to retrieve them. A second call returns
    /// an empty `Vec`.
    pub fn drain_warnings(&mut self) -> Vec<miette::Report> {
        std::mem::take(&mut self.accumulated_warnings)
    }

    /// Compile a catalog JSON file.
    pub fn compile(&mut self, path: impl AsRef<Path>) -> miette::Result<ThriftOutput> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|e| miette::miette!("{e}"))
            .with_context(|| format!("read {}", path.display()))?;
        self.compile_str_named(&source, &path.display().to_string())
    }

    /// Compile catalog JSON text. Uses `"<input>"` as the source name in
    /// diagnostics.
    pub fn compile_str(&mut self, source: &str) -> miette::Result<ThriftOutput> {
        self.compile_str_named(source, "<input>")
    }

    /// Compile catalog JSON text with a custom source name for diagnostics.
    pub fn compile_str_named(
        &mut self,
        source: &str,
        name: &str,
    ) -> miette::Result<ThriftOutput> {
        self.accumulated_warnings.clear();
        let catalog = parse_catalog(source, name)?;
        self.compile_catalog(&catalog)
    }

    /// Compile an in-memory catalog.
    pub fn compile_catalog(&mut self, catalog: &Catalog) -> miette::Result<ThriftOutput> {
        self.accumulated_warnings.clear();

        let order = order_catalog(catalog)?;
        let (declarations, cycles) = order.into_parts();

        let mut warnings = Vec::new();
        for path in cycles {
            if self.deny_cycles {
                self.accumulated_warnings = warnings;
                return Err(DependencyCycle {
                    path,
                    severity: Severity::Error,
                }
                .into());
            }
            warnings.push(miette::Report::new(DependencyCycle {
                path,
                severity: Severity::Warning,
            }));
        }

        let mut translator = Translator::new();
        let document = match ThriftDocument::lower(&declarations, &self.namespace, &mut translator)
        {
            Ok(document) => document,
            Err(e) => {
                self.accumulated_warnings = warnings;
                return Err(e.into());
            }
        };

        let translations = translator
            .into_translations()
            .into_iter()
            .map(|((descriptor, schema_name), thrift)| Translation {
                descriptor,
                schema_name,
                thrift,
            })
            .collect();

        Ok(ThriftOutput {
            document: document.render(),
            namespace: document.namespace().to_string(),
            declarations: declarations.names().map(str::to_string).collect(),
            translations,
            warnings,
        })
    }
}
