use crate::helpers::rows::*;
use anyhow::Result;
use rsmeta::catalog::align::Cursor;
use rsmeta::catalog::id::{RowTuple, TableKey};
use rsmeta::catalog::schema::SchemaRows;
use rsmeta::catalog::table::{TableKind, TableRedshift, TableRows};
use rsmeta::catalog::{Catalog, CatalogRows, align_schemas, align_tables};
use rstest::rstest;

fn names(base: &[&str]) -> Vec<RowTuple> {
    base.iter().map(|t| table_base("public", t)).collect()
}

#[rstest]
#[case::empty(&[])]
#[case::single(&["orders"])]
#[case::several(&["a", "b", "c", "d", "e"])]
fn test_output_matches_base_length_and_order(#[case] tables: &[&str]) -> Result<()> {
    let rows = TableRows {
        base: names(tables),
        redshift: vec![table_redshift("public", "b"), table_redshift("public", "zzz")],
        ..Default::default()
    };

    let aligned = align_tables(&rows)?;
    assert_eq!(aligned.len(), tables.len());
    for (table, expected) in aligned.iter().zip(tables) {
        assert_eq!(table.table_name, *expected);
    }

    Ok(())
}

#[rstest]
#[case::every_row(&["a", "b", "c"])]
#[case::first_and_last(&["a", "c"])]
#[case::middle_only(&["b"])]
#[case::none(&[])]
fn test_subset_auxiliary_attaches_exactly_its_keys(#[case] present: &[&str]) -> Result<()> {
    let rows = TableRows {
        base: names(&["a", "b", "c"]),
        redshift: present.iter().map(|t| table_redshift("public", t)).collect(),
        info: present.iter().map(|t| table_info("public", t, 10)).collect(),
        ..Default::default()
    };

    for table in align_tables(&rows)? {
        let expected = present.contains(&table.table_name.as_str());
        assert_eq!(table.redshift.is_some(), expected, "{}", table.table_name);
        assert_eq!(table.info.is_some(), expected, "{}", table.table_name);
        assert!(table.all.is_none());
        assert!(table.external.is_none());
    }

    Ok(())
}

#[test]
fn test_external_source_matches_on_its_own_field_names() -> Result<()> {
    let rows = TableRows {
        base: vec![
            table_base("spectrum", "clicks"),
            table_base("spectrum", "events"),
            table_base("spectrum", "sessions"),
        ],
        redshift: vec![table_redshift("spectrum", "events")],
        external: vec![
            table_external("spectrum", "clicks"),
            table_external("spectrum", "sessions"),
        ],
        ..Default::default()
    };

    let aligned = align_tables(&rows)?;
    assert_eq!(aligned.len(), 3);

    let clicks = aligned[0].external.as_ref().expect("clicks is external");
    assert_eq!(clicks.tablename, "clicks");
    assert_eq!(clicks.schemaname, "spectrum");
    assert_eq!(clicks.location.as_deref(), Some("s3://lake/spectrum/clicks/"));
    assert!(aligned[0].redshift.is_none());
    assert_eq!(aligned[0].kind(), TableKind::ExternalTable);

    assert!(aligned[1].external.is_none());
    assert!(aligned[1].redshift.is_some());
    assert_eq!(aligned[1].kind(), TableKind::Table);

    let sessions = aligned[2].external.as_ref().expect("sessions is external");
    assert_eq!(sessions.tablename, "sessions");
    assert_eq!(aligned[2].kind(), TableKind::ExternalTable);

    Ok(())
}

#[test]
fn test_alignment_is_idempotent() -> Result<()> {
    let rows = CatalogRows {
        schemas: SchemaRows {
            base: vec![schema_base("public"), schema_base("sales")],
            redshift: vec![schema_redshift("sales")],
            ..Default::default()
        },
        tables: TableRows {
            base: vec![table_base("public", "a"), view_base("sales", "v")],
            all: vec![table_all("sales", "v", Some("SELECT * FROM public.a"))],
            redshift: vec![table_redshift("public", "a")],
            ..Default::default()
        },
        columns: rsmeta::catalog::column::ColumnRows {
            base: vec![column_base("public", "a", "id", 1)],
            ..Default::default()
        },
    };

    let first = Catalog::assemble(&rows)?;
    let second = Catalog::assemble(&rows)?;
    assert_eq!(first.schemas, second.schemas);
    assert_eq!(first.tables, second.tables);
    assert_eq!(
        first.tables[1].dependencies(),
        second.tables[1].dependencies()
    );

    Ok(())
}

#[test]
fn test_out_of_order_auxiliary_under_matches() -> Result<()> {
    // "c" sorts after "a" and "b", so the cursor stalls on it and "a" never attaches
    let rows = TableRows {
        base: names(&["a", "b", "c"]),
        redshift: vec![table_redshift("public", "c"), table_redshift("public", "a")],
        ..Default::default()
    };

    let aligned = align_tables(&rows)?;
    assert!(aligned[0].redshift.is_none());
    assert!(aligned[1].redshift.is_none());
    assert!(aligned[2].redshift.is_some());

    Ok(())
}

#[test]
fn test_extra_auxiliary_row_is_never_consulted() -> Result<()> {
    let base = vec![table_base("s", "t1")];
    let redshift = vec![table_redshift("s", "t1"), table_redshift("s", "t2")];

    let aligned = align_tables(&TableRows {
        base: base.clone(),
        redshift: redshift.clone(),
        ..Default::default()
    })?;
    assert_eq!(aligned.len(), 1);
    assert_eq!(
        aligned[0].redshift.as_ref().map(|r| r.table_name.as_str()),
        Some("t1")
    );

    let mut cursor = Cursor::<TableRedshift>::new(&redshift);
    let t1 = cursor.take_if_key(&TableKey::new(DATABASE, "s", "t1"))?;
    assert!(t1.is_some());
    assert_eq!(cursor.position(), 1);
    assert_eq!(cursor.remaining(), 1);

    Ok(())
}

#[test]
fn test_missing_auxiliary_source_leaves_slots_empty() -> Result<()> {
    let schemas = align_schemas(&SchemaRows {
        base: vec![schema_base("public"), schema_base("sales")],
        ..Default::default()
    })?;

    assert_eq!(schemas.len(), 2);
    assert!(schemas.iter().all(|s| s.redshift.is_none() && s.external.is_none()));

    Ok(())
}

#[test]
fn test_malformed_auxiliary_row_is_an_error() {
    let rows = TableRows {
        base: names(&["a"]),
        redshift: vec![vec![serde_json::json!("dev")]],
        ..Default::default()
    };

    let err = align_tables(&rows).unwrap_err();
    assert!(format!("{:#}", err).contains("svv_redshift_tables"));
}

#[test]
fn test_columns_grouped_under_tables() -> Result<()> {
    let catalog = Catalog::assemble(&CatalogRows {
        tables: TableRows {
            base: names(&["a", "b"]),
            ..Default::default()
        },
        columns: rsmeta::catalog::column::ColumnRows {
            base: vec![
                column_base("public", "a", "id", 1),
                column_base("public", "b", "id", 1),
                column_base("public", "b", "name", 2),
            ],
            ..Default::default()
        },
        ..Default::default()
    })?;

    let column_names = |table: &str| -> Vec<String> {
        catalog
            .tables
            .iter()
            .filter(|t| t.table_name == table)
            .flat_map(|t| t.columns.iter().map(|c| c.column_name.clone()))
            .collect()
    };
    assert_eq!(catalog.tables.len(), 2);
    assert_eq!(column_names("a"), vec!["id"]);
    assert_eq!(column_names("b"), vec!["id", "name"]);

    Ok(())
}
