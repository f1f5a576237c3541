// ==============================================================================
// Catalog Loading from JSON
// ==============================================================================
//
// The schema catalog arrives as JSON, in the shape served by the H2O metadata
// endpoint (`/3/Metadata/schemas`):
//
//     { "schemas": [ { "name": "FrameV3", "fields": [ { "name": ..., "type": ...,
//       "schema_name": ..., "required": ..., "help": ..., "values": [...] } ] } ] }
//
// A bare array of schema objects, or an object keyed by schema name, is also
// accepted. Keys we do not use (`__meta`, `direction`, `is_schema`, ...) are
// ignored.

use serde_json::Value;

use miette::{NamedSource, Result};

use crate::error::CatalogDiagnostic;
use crate::model::schema::{Catalog, Field, Schema};

/// Parse catalog JSON text. `source_name` labels the source in diagnostics.
pub fn parse_catalog(source: &str, source_name: &str) -> Result<Catalog> {
    let json: Value = serde_json::from_str(source).map_err(|e| {
        let offset = line_col_to_offset(source, e.line(), e.column());
        CatalogDiagnostic {
            src: NamedSource::new(source_name, source.to_string()),
            span: (offset, 0).into(),
            message: format!("invalid catalog JSON: {e}"),
            label: Some("here".to_string()),
            help: None,
        }
    })?;
    catalog_from_json(&json)
}

/// Build a catalog from an already-parsed JSON document.
pub fn catalog_from_json(json: &Value) -> Result<Catalog> {
    let mut catalog = Catalog::new();
    // The endpoint wraps the list in `schemas`. A keyed catalog may itself
    // contain a schema called `schemas`, which is an object, not an array.
    let endpoint_list = match json {
        Value::Object(obj) => obj.get("schemas").and_then(Value::as_array),
        _ => None,
    };
    if let Some(list) = endpoint_list {
        for (i, item) in list.iter().enumerate() {
            let schema = json_to_schema(item, None)
                .map_err(|e| miette::miette!("parse schema at index {i}: {e}"))?;
            insert(&mut catalog, schema)?;
        }
        return Ok(catalog);
    }

    match json {
        Value::Array(list) => {
            for (i, item) in list.iter().enumerate() {
                let schema = json_to_schema(item, None)
                    .map_err(|e| miette::miette!("parse schema at index {i}: {e}"))?;
                insert(&mut catalog, schema)?;
            }
        }
        Value::Object(obj) => {
            for (key, item) in obj {
                let schema = json_to_schema(item, Some(key))
                    .map_err(|e| miette::miette!("parse schema `{key}`: {e}"))?;
                insert(&mut catalog, schema)?;
            }
        }
        _ => {
            return Err(miette::miette!(
                "catalog must be a JSON object or array of schemas"
            ));
        }
    }
    Ok(catalog)
}

fn insert(catalog: &mut Catalog, schema: Schema) -> Result<()> {
    catalog.insert(schema).map_err(|e| miette::miette!("{e}"))
}

// ==============================================================================
// Schema and Field Parsers
// ==============================================================================

fn json_to_schema(json: &Value, key_name: Option<&str>) -> Result<Schema> {
    let obj = json
        .as_object()
        .ok_or_else(|| miette::miette!("schema must be an object"))?;

    let name = match obj.get("name").and_then(Value::as_str) {
        Some(n) => n.to_string(),
        None => key_name
            .map(str::to_string)
            .ok_or_else(|| miette::miette!("schema missing 'name'"))?,
    };

    let fields = match obj.get("fields") {
        Some(Value::Array(fields_json)) => fields_json
            .iter()
            .enumerate()
            .map(|(i, f)| {
                json_to_field(f).map_err(|e| {
                    miette::miette!("parse field at index {i} of schema `{name}`: {e}")
                })
            })
            .collect::<Result<Vec<_>>>()?,
        None | Some(Value::Null) => vec![],
        Some(_) => {
            return Err(miette::miette!("`fields` of schema `{name}` must be an array"));
        }
    };

    Ok(Schema { name, fields })
}

fn json_to_field(json: &Value) -> Result<Field> {
    let obj = json
        .as_object()
        .ok_or_else(|| miette::miette!("field must be an object"))?;

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| miette::miette!("field missing 'name'"))?
        .to_string();
    let type_name = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| miette::miette!("field `{name}` missing 'type'"))?
        .to_string();
    let schema_name = match obj.get("schema_name") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(miette::miette!(
                "`schema_name` of field `{name}` must be a string or null"
            ));
        }
    };
    let required = obj
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let help = obj
        .get("help")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let values = match obj.get("values") {
        Some(Value::Array(arr)) => arr
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    miette::miette!("enum values of field `{name}` must be strings")
                })
            })
            .collect::<Result<Vec<_>>>()?,
        None | Some(Value::Null) => {
            if type_name.starts_with("enum") && schema_name.is_some() {
                return Err(miette::miette!(
                    "enum field `{name}` has no `values` array"
                ));
            }
            vec![]
        }
        Some(_) => {
            return Err(miette::miette!("`values` of field `{name}` must be an array"));
        }
    };

    Ok(Field {
        name,
        type_name,
        schema_name,
        required,
        help,
        values,
    })
}

/// Convert serde_json's 1-based line/column into a byte offset, clamped to
/// the source length.
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (i, text) in source.split_inclusive('\n').enumerate() {
        if i + 1 == line {
            return (offset + column.saturating_sub(1)).min(source.len());
        }
        offset += text.len();
    }
    source.len()
}
