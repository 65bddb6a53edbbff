use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Executor, MySqlPool, Row, ValueRef};
use std::collections::BTreeMap;
use tracing::debug;

use super::models::{PendingRecord, TenantDatabase};
use super::PendingSource;
use crate::error::DbResult;

/// View every tenant database exposes with its unverified payment attempts
pub const PENDING_VIEW: &str = "view_intentos_de_pagos";

/// Reads pending attempts from tenant databases sharing one MySQL pool
pub struct MySqlPendingSource {
    pool: MySqlPool,
}

impl MySqlPendingSource {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PendingSource for MySqlPendingSource {
    async fn fetch_pending(&self, database: &TenantDatabase) -> DbResult<Vec<PendingRecord>> {
        let statement = use_statement(database)?;
        let query = pending_query(database)?;

        let mut conn = self.pool.acquire().await?;

        // Text protocol only: a cached prepared SELECT stays bound to the
        // database it was prepared in.
        (&mut *conn).execute(statement.as_str()).await?;
        let rows = (&mut *conn).fetch_all(query.as_str()).await?;

        debug!("Fetched {} rows from {}", rows.len(), database);

        rows.iter()
            .map(|row| PendingRecord::from_columns(database.clone(), row_to_columns(row)))
            .collect()
    }
}

/// `USE` statement for a tenant, refusing names that are not bare identifiers
pub fn use_statement(database: &TenantDatabase) -> DbResult<String> {
    Ok(format!("USE `{}`", database.as_identifier()?))
}

/// Pending-view query qualified with the tenant's database
pub fn pending_query(database: &TenantDatabase) -> DbResult<String> {
    Ok(format!(
        "SELECT * FROM `{}`.{}",
        database.as_identifier()?,
        PENDING_VIEW
    ))
}

fn row_to_columns(row: &MySqlRow) -> BTreeMap<String, Value> {
    row.columns()
        .iter()
        .map(|column| {
            (
                column.name().to_string(),
                decode_column(row, column.ordinal()),
            )
        })
        .collect()
}

/// Best-effort conversion of a MySQL column into JSON
fn decode_column(row: &MySqlRow, index: usize) -> Value {
    match row.try_get_raw(index) {
        Ok(raw) if !raw.is_null() => {}
        _ => return Value::Null,
    }

    if let Ok(v) = row.try_get::<i64, _>(index) {
        return Value::from(v);
    }
    if let Ok(v) = row.try_get::<u64, _>(index) {
        return Value::from(v);
    }
    if let Ok(v) = row.try_get::<Decimal, _>(index) {
        return Value::String(v.to_string());
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return Value::from(v);
    }
    if let Ok(v) = row.try_get::<NaiveDateTime, _>(index) {
        return Value::String(v.to_string());
    }
    if let Ok(v) = row.try_get::<NaiveDate, _>(index) {
        return Value::String(v.to_string());
    }
    if let Ok(v) = row.try_get::<NaiveTime, _>(index) {
        return Value::String(v.to_string());
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        return Value::String(v);
    }
    // Binary collations, VARBINARY, BLOB, JSON and BIT
    if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
        return Value::String(String::from_utf8_lossy(&v).into_owned());
    }

    debug!("Column {} has an unsupported type, keeping NULL", index);
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatabaseError;

    #[test]
    fn test_use_statement_quotes_identifier() {
        let statement = use_statement(&TenantDatabase::from("portal_olivar")).unwrap();
        assert_eq!(statement, "USE `portal_olivar`");
    }

    #[test]
    fn test_use_statement_rejects_injection() {
        let err = use_statement(&TenantDatabase::from("portal`; DROP DATABASE x; --"))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidIdentifier(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_pending_query_names_tenant_database() {
        let calera = pending_query(&TenantDatabase::from("portal_calera")).unwrap();
        let cholchol = pending_query(&TenantDatabase::from("portal_cholchol")).unwrap();

        assert_eq!(calera, "SELECT * FROM `portal_calera`.view_intentos_de_pagos");
        assert_eq!(
            cholchol,
            "SELECT * FROM `portal_cholchol`.view_intentos_de_pagos"
        );
    }

    #[test]
    fn test_pending_query_rejects_injection() {
        let err = pending_query(&TenantDatabase::from("x`.t; --")).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidIdentifier(_)));
    }
}
