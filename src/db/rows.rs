//! Convert sqlx rows into positional row tuples
use crate::catalog::id::RowTuple;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Number, Value};
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Column, Row, TypeInfo};
use tracing::debug;

/// Run a catalog query and return its rows as positional tuples.
///
/// `source` names the system view in logs and error messages.
pub async fn fetch_tuples(
    conn: &mut PgConnection,
    source: &str,
    sql: &str,
) -> Result<Vec<RowTuple>> {
    let rows = sqlx::query(sql)
        .fetch_all(&mut *conn)
        .await
        .with_context(|| format!("Failed to query {}", source))?;

    debug!("Fetched {} rows from {}", rows.len(), source);

    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            row_to_tuple(row).with_context(|| format!("Failed to read {} row {}", source, index))
        })
        .collect()
}

pub fn row_to_tuple(row: &PgRow) -> Result<RowTuple> {
    row.columns()
        .iter()
        .map(|column| {
            cell_value(row, column.ordinal(), column.type_info().name())
                .with_context(|| format!("column '{}'", column.name()))
        })
        .collect()
}

fn cell_value(row: &PgRow, index: usize, type_name: &str) -> Result<Value> {
    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(Value::Bool),
        "INT2" => row.try_get::<Option<i16>, _>(index)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(index)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(Value::from),
        "OID" => row
            .try_get::<Option<Oid>, _>(index)?
            .map(|oid| Value::from(oid.0)),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)?
            .and_then(|v| float_value(f64::from(v))),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(index)?
            .and_then(float_value),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)?
            .map(|v| Value::String(v.to_string())),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(|v| Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map(|v| Value::String(v.to_rfc3339())),
        "NUMERIC" => bail!("NUMERIC values must be cast to float8 or int8 in the catalog query"),
        _ => row.try_get::<Option<String>, _>(index)?.map(Value::String),
    };

    Ok(value.unwrap_or(Value::Null))
}

// NaN and infinities have no JSON representation
fn float_value(v: f64) -> Option<Value> {
    Number::from_f64(v).map(Value::Number)
}
