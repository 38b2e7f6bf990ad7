/// Shared error type used across all Vocalis crates.
///
/// Variants map onto the error-kind table: `ConfigMissing`,
/// `TransientProvider`, `FatalProvider`, `MediaTransportClosed`,
/// `QueueBackendUnavailable`, `ActionNotAllowed`, `ConditionSkip`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("config missing: {0}")]
    ConfigMissing(String),

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("transient provider error ({provider}): {message}")]
    TransientProvider { provider: String, message: String },

    #[error("fatal provider error ({provider}): {message}")]
    FatalProvider { provider: String, message: String },

    #[error("media transport closed: {0}")]
    MediaTransportClosed(String),

    #[error("queue backend unavailable: {0}")]
    QueueBackendUnavailable(String),

    #[error("action not allowed: {0}")]
    ActionNotAllowed(String),

    #[error("step condition not satisfied, skipped")]
    ConditionSkip,

    #[error("redis: {0}")]
    Redis(String),

    #[error("persistence: {0}")]
    Persistence(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error kind should be treated as transient and retried
    /// once in place before escalating, per the error-handling table.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::TransientProvider { .. } | Error::Timeout(_) | Error::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
