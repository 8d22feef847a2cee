/// Errors reported by geometry construction and queries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("invalid geometry definition: {0}")]
    Construction(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("state container error: {0}")]
    State(String),
}

impl From<serde_json::Error> for GeometryError {
    fn from(err: serde_json::Error) -> Self {
        GeometryError::State(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeometryError>;
