use anyhow::Result;
use rsmeta::catalog::schema::{SchemaBase, SchemaExternal};
use rsmeta::constants::SCHEMA_EXCLUDED_KEYS;
use rsmeta::metadata::{MetadataExtension, append_metadata_extension};
use serde_json::json;

fn base() -> SchemaBase {
    SchemaBase {
        database_name: "dev".to_string(),
        schema_name: "sales".to_string(),
        schema_owner: Some(100),
        schema_type: Some("local".to_string()),
        schema_acl: None,
        source_database: None,
        schema_option: None,
    }
}

#[test]
fn test_schema_projection_excludes_identity_and_nulls() -> Result<()> {
    let mut extensions = Vec::new();
    append_metadata_extension(
        &mut extensions,
        "https://example.test/SchemaBase",
        Some(&base()),
        Some(SCHEMA_EXCLUDED_KEYS),
    )?;

    assert_eq!(extensions.len(), 1);
    assert_eq!(
        serde_json::to_value(&extensions[0].metadata)?,
        json!({"schema_owner": 100, "schema_type": "local"})
    );

    Ok(())
}

#[test]
fn test_extensions_accumulate_in_call_order() -> Result<()> {
    let external = SchemaExternal {
        esoid: Some(200_100),
        eskind: Some(1),
        schemaname: "spectrum".to_string(),
        esowner: Some(100),
        databasename: "dev".to_string(),
        esoptions: None,
    };

    let mut extensions = Vec::new();
    append_metadata_extension(&mut extensions, "first", Some(&base()), None)?;
    append_metadata_extension::<SchemaExternal>(&mut extensions, "skipped", None, None)?;
    append_metadata_extension(&mut extensions, "second", Some(&external), None)?;

    let urls: Vec<&str> = extensions.iter().map(|e| e.schema_url.as_str()).collect();
    assert_eq!(urls, vec!["first", "second"]);
    assert!(!extensions[1].metadata.contains_key("esoptions"));
    assert_eq!(extensions[1].metadata["schemaname"], json!("spectrum"));

    Ok(())
}

#[test]
fn test_extension_serializes_with_schema_url() -> Result<()> {
    let mut extensions: Vec<MetadataExtension> = Vec::new();
    append_metadata_extension(&mut extensions, "U", Some(&base()), Some(SCHEMA_EXCLUDED_KEYS))?;

    let value = serde_json::to_value(&extensions)?;
    assert_eq!(value[0]["schema_url"], json!("U"));
    assert_eq!(value[0]["metadata"]["schema_type"], json!("local"));

    Ok(())
}
