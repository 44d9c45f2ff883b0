use std::{io, path::PathBuf};

/// Failure to turn an inbound message into a device mutation.
///
/// A command that fails with one of these leaves the device state untouched.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("field `{field}` out of range: {value} (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        expected: &'static str,
    },
    #[error("field `{field}` has invalid value {value:?}")]
    InvalidValue { field: &'static str, value: String },
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("{0} is not supported by the emulator")]
    Unsupported(&'static str),
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ProtocolError {
    pub(crate) fn out_of_range(field: &'static str, value: i64, expected: &'static str) -> Self {
        ProtocolError::OutOfRange {
            field,
            value,
            expected,
        }
    }

    /// Name of the offending wire field, when the error concerns one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ProtocolError::OutOfRange { field, .. } | ProtocolError::InvalidValue { field, .. } => {
                Some(*field)
            }
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration value: {0}")]
    Value(#[from] ProtocolError),
}
