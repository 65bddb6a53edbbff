use thiserror::Error;

use crate::extraction::models::TenantDatabase;

/// Failures talking to a tenant database
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Invalid database identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Row in {database} is missing column {column}")]
    MissingColumn { database: String, column: String },

    #[error("Row in {database} has no value in column {column}")]
    NullColumn { database: String, column: String },
}

impl DatabaseError {
    /// Whether another attempt against the same source can possibly succeed
    pub fn is_transient(&self) -> bool {
        !matches!(self, DatabaseError::InvalidIdentifier(_))
    }
}

/// Failures talking to the payment verification API
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Verification API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid verification response: {0}")]
    Decode(#[from] serde_json::Error),
}

// The request URL carries the verification token, so it never reaches the error
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.without_url())
    }
}

/// Failures delivering an email notification
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Could not build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Conditions that abort the whole run.
///
/// The `Display` text is the body of the critical alert sent to operators.
#[derive(Error, Debug)]
pub enum FatalError {
    #[error("Error al crear el pool: {0}")]
    PoolInit(#[source] DatabaseError),

    #[error("Error al crear el cliente de la API: {0}")]
    ClientInit(#[source] ApiError),

    #[error("CRÍTICO: No se pudo acceder a la DB {database} tras reintentos.")]
    SourceUnreachable {
        database: TenantDatabase,
        #[source]
        source: DatabaseError,
    },

    #[error("Proceso detenido: Se superó el limite de {max_failures} fallos en la API.")]
    FailureCeiling { max_failures: u32 },
}

pub type DbResult<T> = Result<T, DatabaseError>;
pub type ApiResult<T> = Result<T, ApiError>;
pub type NotifyResult<T> = Result<T, NotifyError>;
