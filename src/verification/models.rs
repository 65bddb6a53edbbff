use serde::Deserialize;
use serde_json::Value;

use crate::extraction::PendingRecord;

/// Status the API reports for a payment that went through
pub const AUTHORIZED_STATUS: &str = "AUTHORIZED";

/// Body returned by the verification API.
///
/// Only `status` and `response_code` matter; anything else is ignored.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct VerificationResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub response_code: Option<Value>,
}

impl VerificationResponse {
    /// Authorized means status AUTHORIZED together with a numeric response code of 0
    pub fn is_authorized(&self) -> bool {
        self.status.as_deref() == Some(AUTHORIZED_STATUS) && self.has_zero_code()
    }

    fn has_zero_code(&self) -> bool {
        match &self.response_code {
            Some(Value::Number(n)) => n.as_i64() == Some(0) || n.as_f64() == Some(0.0),
            _ => false,
        }
    }
}

/// A record the API confirmed as paid, surfaced to operators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttentionRecord {
    pub id: String,
    pub client: String,
    pub database: String,
    pub kind: String,
}

impl From<&PendingRecord> for AttentionRecord {
    fn from(record: &PendingRecord) -> Self {
        Self {
            id: record.id.clone(),
            client: record.client.clone(),
            database: record.source.to_string(),
            kind: record.kind.clone(),
        }
    }
}

/// A record whose verification kept failing after every retry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftFailure {
    pub id: String,
    pub database: String,
}

impl SoftFailure {
    /// Line shown under the non-blocking errors section of the summary
    pub fn report_line(&self) -> String {
        format!(
            "Fallo persistente API: Registro {} (DB: {})",
            self.id, self.database
        )
    }
}

impl From<&PendingRecord> for SoftFailure {
    fn from(record: &PendingRecord) -> Self {
        Self {
            id: record.id.clone(),
            database: record.source.to_string(),
        }
    }
}

/// Terminal classification of one pending record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Authorized(AttentionRecord),
    /// Well-formed answer that is not (yet) an authorization; not reported
    NotAuthorized,
    Failed(SoftFailure),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> VerificationResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_authorized_requires_status_and_zero_code() {
        assert!(parse(r#"{"status":"AUTHORIZED","response_code":0}"#).is_authorized());
        assert!(!parse(r#"{"status":"AUTHORIZED","response_code":-1}"#).is_authorized());
        assert!(!parse(r#"{"status":"FAILED","response_code":0}"#).is_authorized());
        assert!(!parse(r#"{"status":"authorized","response_code":0}"#).is_authorized());
    }

    #[test]
    fn test_missing_or_non_numeric_code_is_not_authorized() {
        assert!(!parse(r#"{"status":"AUTHORIZED"}"#).is_authorized());
        assert!(!parse(r#"{"status":"AUTHORIZED","response_code":"0"}"#).is_authorized());
        assert!(!parse(r#"{"status":"AUTHORIZED","response_code":null}"#).is_authorized());
        assert!(!parse("{}").is_authorized());
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let response = parse(
            r#"{"status":"AUTHORIZED","response_code":0,"amount":1000,"buy_order":"X1"}"#,
        );
        assert!(response.is_authorized());
    }

    #[test]
    fn test_soft_failure_line() {
        let failure = SoftFailure {
            id: "17".to_string(),
            database: "portal_cholchol".to_string(),
        };
        assert_eq!(
            failure.report_line(),
            "Fallo persistente API: Registro 17 (DB: portal_cholchol)"
        );
    }
}
