//! Publishable metadata extensions built from source records
use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde_json::{Map, Value};

/// One source record flattened for publication, tagged with the schema that describes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataExtension {
    pub schema_url: String,
    pub metadata: Map<String, Value>,
}

/// Flatten `record` into a field mapping and append it to `extensions`.
///
/// An absent record leaves the list untouched. Excluded keys that the record
/// does not have are ignored, and fields whose value is null are left out.
pub fn append_metadata_extension<T: Serialize>(
    extensions: &mut Vec<MetadataExtension>,
    schema_url: &str,
    record: Option<&T>,
    excluded_keys: Option<&[&str]>,
) -> Result<()> {
    let Some(record) = record else {
        return Ok(());
    };

    let mut metadata = match serde_json::to_value(record)
        .with_context(|| format!("Failed to serialize record for {}", schema_url))?
    {
        Value::Object(map) => map,
        other => {
            return Err(anyhow!(
                "Record for {} is not a field mapping: {}",
                schema_url,
                other
            ));
        }
    };

    for key in excluded_keys.unwrap_or_default() {
        metadata.remove(*key);
    }
    metadata.retain(|_, value| !value.is_null());

    extensions.push(MetadataExtension {
        schema_url: schema_url.to_string(),
        metadata,
    });

    Ok(())
}
