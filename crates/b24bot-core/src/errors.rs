/// Core error type for the robot service.
///
/// Adapter crates map their specific errors into this type so handlers can tell
/// early rejections (nothing was sent anywhere) from failed remote calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("{method} failed with status {status}: {body}")]
    Remote {
        method: String,
        status: u16,
        body: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for failures raised before any network I/O was attempted.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Config(_) | Error::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
