//! Crate-wide error type

use thiserror::Error;

/// Errors surfaced by pruning, training, and checkpoint I/O
#[derive(Debug, Error)]
pub enum Error {
    /// Fatal configuration problem: missing checkpoint, unknown model
    /// identifier, invalid prune fraction, empty watermark set.
    #[error("configuration error: {0}")]
    Config(String),

    /// A stored mask no longer matches the live weight tensor it was built
    /// for. Always fatal; masks are never broadcast or truncated.
    #[error("shape mismatch for '{address}': mask {mask:?} vs weight {weight:?}")]
    ShapeMismatch {
        /// Parameter name the mask is registered under
        address: String,
        /// Shape the mask was built with
        mask: Vec<usize>,
        /// Shape of the live weight tensor
        weight: Vec<usize>,
    },

    /// Checkpoint or watermark file could not be encoded/decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Underlying filesystem failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::Config("no checkpoint found".to_string());
        assert_eq!(err.to_string(), "configuration error: no checkpoint found");
    }

    #[test]
    fn test_shape_mismatch_display() {
        let err = Error::ShapeMismatch {
            address: "block1.conv2.weight".to_string(),
            mask: vec![4, 4],
            weight: vec![4, 8],
        };
        let msg = err.to_string();
        assert!(msg.contains("block1.conv2.weight"));
        assert!(msg.contains("[4, 4]"));
        assert!(msg.contains("[4, 8]"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
