use thiserror::Error;

pub type SelectionResult<T> = Result<T, SelectionError>;

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error(
        "invalid grid: {width}x{height} requires {expected} pixels but {actual} were supplied"
    )]
    InvalidGrid {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("configuration error: {message}")]
    InvalidConfig { message: String },

    #[error("configuration key `{key}` has unparseable value `{value}`")]
    ConfigValue { key: String, value: String },

    #[error("failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("batch worker pool is not accepting scenes: {reason}")]
    WorkerPool { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SelectionError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn config_value(key: &str, value: &str) -> Self {
        Self::ConfigValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}
