//! Thrift IDL compiler for the H2O REST schema catalog.
//!
//! The catalog describes every request/response schema of the API: structs
//! with typed, named, optionally-required fields, plus the enums those fields
//! use. This crate turns it into a single Thrift IDL file (`H2O.thrift`) that
//! client-binding generators compile for their target languages.
//!
//! The pipeline has three steps:
//!
//! 1. [`resolve`] orders the declarations so that every struct or enum a
//!    struct references is declared before it.
//! 2. [`translate`] maps catalog type descriptors (`int`, `string[]`,
//!    `Map<K,V>`, `enum`, nested schema names, ...) to Thrift types.
//! 3. [`emit`] produces the document: a fixed header, the `PrimitiveUnion`
//!    standing in for polymorphic values, then one block per declaration.
//!
//! [`Thrift`] wraps all of it in a reusable builder.
//!
//! # Compiling a catalog
//!
//! ```no_run
//! use h2o_thrift::Thrift;
//!
//! let output = Thrift::new().compile("schemas.json")?;
//! for warning in &output.warnings {
//!     eprintln!("{warning:?}");
//! }
//! output.write_to(".")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Error handling
//!
//! All fallible entry points return [`miette::Result`]. Errors carry codes and
//! help text, and JSON syntax errors point into the catalog source, when
//! printed with `{:?}`.

pub mod catalog;
pub mod compiler;
pub mod emit;
pub mod error;
pub mod model;
pub mod resolve;
pub mod translate;

pub(crate) mod suggest;

// Re-export the small number of public API at the crate root.
pub use compiler::{OUTPUT_FILE_NAME, Thrift, ThriftOutput, Translation};
pub use model::schema::{Catalog, Field, Schema};
