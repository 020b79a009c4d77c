use thiserror::Error;

/// Failures of the REST transport. The display text is what the user sees.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Decode(String),
}

impl ApiError {
    /// Server-provided message, empty when the server sent none.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Status { message, .. } => message,
            ApiError::Transport(message) | ApiError::Decode(message) => message,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("No credentials available: set ORDER_DESK_TOKEN or [auth].token")]
    MissingCredentials,
}

/// Errors surfaced by the orders page service.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PageError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Please login to view and manage orders")]
    LoginRequired,
    #[error("Only administrators can {0}")]
    AdminRequired(&'static str),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Failures while wiring the desk together at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to build HTTP client: {0}")]
    Api(#[from] ApiError),
}
