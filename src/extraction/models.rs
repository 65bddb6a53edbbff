use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{DatabaseError, DbResult};

/// The verification API only accepts this many trailing characters of a token
pub const VERIFICATION_TOKEN_LEN: usize = 64;

/// One tenant deployment's database
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantDatabase(String);

impl TenantDatabase {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns the name if it can be interpolated into SQL as a bare identifier
    pub fn as_identifier(&self) -> DbResult<&str> {
        let valid = !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');

        if valid {
            Ok(&self.0)
        } else {
            Err(DatabaseError::InvalidIdentifier(self.0.clone()))
        }
    }
}

impl fmt::Display for TenantDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantDatabase {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A payment attempt awaiting verification, tagged with the tenant it came from
#[derive(Clone, PartialEq)]
pub struct PendingRecord {
    pub id: String,
    /// Identifier the verification API knows the payment by (column `tbkid`)
    pub external_id: String,
    pub client: String,
    pub kind: String,
    pub source: TenantDatabase,
    /// Any other columns the view exposes
    pub extra: BTreeMap<String, Value>,
    token: String,
}

impl PendingRecord {
    /// Builds a record from one view row keyed by column name
    pub fn from_columns(
        source: TenantDatabase,
        mut columns: BTreeMap<String, Value>,
    ) -> DbResult<Self> {
        // Identity columns must hold a value; descriptive ones may be NULL
        let mut take = |column: &str, nullable: bool| match columns.remove(column) {
            None => Err(DatabaseError::MissingColumn {
                database: source.to_string(),
                column: column.to_string(),
            }),
            Some(Value::Null) if !nullable => Err(DatabaseError::NullColumn {
                database: source.to_string(),
                column: column.to_string(),
            }),
            Some(value) => Ok(render_value(&value)),
        };

        let id = take("id", false)?;
        let external_id = take("tbkid", false)?;
        let token = take("token", false)?;
        let client = take("cliente", true)?;
        let kind = take("tipo", true)?;

        Ok(Self {
            id,
            external_id,
            client,
            kind,
            source,
            extra: columns,
            token,
        })
    }

    /// The trailing part of the token sent to the verification API
    pub fn verification_token(&self) -> &str {
        token_suffix(&self.token, VERIFICATION_TOKEN_LEN)
    }
}

impl fmt::Debug for PendingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRecord")
            .field("id", &self.id)
            .field("external_id", &self.external_id)
            .field("client", &self.client)
            .field("kind", &self.kind)
            .field("source", &self.source)
            .field("extra", &self.extra)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Last `len` characters of `token`, or all of it when shorter
pub fn token_suffix(token: &str, len: usize) -> &str {
    let count = token.chars().count();
    if count <= len {
        return token;
    }

    match token.char_indices().nth(count - len) {
        Some((start, _)) => &token[start..],
        None => token,
    }
}

/// Column values as they appear in reports: strings bare, NULL empty
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(token: &str) -> BTreeMap<String, Value> {
        let mut columns = BTreeMap::new();
        columns.insert("id".to_string(), json!(42));
        columns.insert("tbkid".to_string(), json!("APP-9"));
        columns.insert("token".to_string(), json!(token));
        columns.insert("cliente".to_string(), json!("ACME"));
        columns.insert("tipo".to_string(), json!("patente"));
        columns.insert("monto".to_string(), json!("1500.00"));
        columns
    }

    #[test]
    fn test_token_suffix_long_token() {
        let token = format!("{}{}", "x".repeat(36), "a".repeat(64));
        let suffix = token_suffix(&token, 64);
        assert_eq!(suffix.len(), 64);
        assert_eq!(suffix, "a".repeat(64));
    }

    #[test]
    fn test_token_suffix_exact_and_short() {
        let exact = "b".repeat(64);
        assert_eq!(token_suffix(&exact, 64), exact);
        assert_eq!(token_suffix("short", 64), "short");
        assert_eq!(token_suffix("", 64), "");
    }

    #[test]
    fn test_token_suffix_counts_characters() {
        let token = format!("ñ{}", "é".repeat(64));
        assert_eq!(token_suffix(&token, 64), "é".repeat(64));
    }

    #[test]
    fn test_record_from_columns() {
        let record =
            PendingRecord::from_columns(TenantDatabase::from("portal_rengo"), row("tok")).unwrap();

        assert_eq!(record.id, "42");
        assert_eq!(record.external_id, "APP-9");
        assert_eq!(record.client, "ACME");
        assert_eq!(record.kind, "patente");
        assert_eq!(record.source.name(), "portal_rengo");
        assert_eq!(record.verification_token(), "tok");
        assert_eq!(record.extra.len(), 1);
        assert_eq!(record.extra["monto"], json!("1500.00"));
    }

    #[test]
    fn test_record_missing_column() {
        let mut columns = row("tok");
        columns.remove("tbkid");

        let err = PendingRecord::from_columns(TenantDatabase::from("portal_pirque"), columns)
            .unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::MissingColumn { ref column, .. } if column == "tbkid"
        ));
    }

    #[test]
    fn test_record_null_identity_column() {
        for column in ["id", "tbkid", "token"] {
            let mut columns = row("tok");
            columns.insert(column.to_string(), Value::Null);

            let err = PendingRecord::from_columns(TenantDatabase::from("portal_pirque"), columns)
                .unwrap_err();
            assert!(matches!(
                err,
                DatabaseError::NullColumn { column: ref c, .. } if c == column
            ));
        }
    }

    #[test]
    fn test_record_null_descriptive_columns_are_empty() {
        let mut columns = row("tok");
        columns.insert("cliente".to_string(), Value::Null);
        columns.insert("tipo".to_string(), Value::Null);

        let record =
            PendingRecord::from_columns(TenantDatabase::from("portal_rengo"), columns).unwrap();
        assert_eq!(record.client, "");
        assert_eq!(record.kind, "");
        assert_eq!(record.verification_token(), "tok");
    }

    #[test]
    fn test_debug_redacts_token() {
        let record =
            PendingRecord::from_columns(TenantDatabase::from("portal_maipo"), row("s3cr3t"))
                .unwrap();
        let debug = format!("{:?}", record);
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_identifier_validation() {
        assert!(TenantDatabase::from("portal_calera").as_identifier().is_ok());
        assert!(TenantDatabase::from("x; DROP TABLE y").as_identifier().is_err());
        assert!(TenantDatabase::from("").as_identifier().is_err());
    }
}
