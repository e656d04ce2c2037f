//! Error taxonomy for the double-slit core.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SlitError {
    /// The detector's live settings drifted from the ones baked into its wavefunction.
    #[error("{field} attribute has been modified. Screen must be cleared.")]
    ConfigurationStale { field: &'static str },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T> = std::result::Result<T, SlitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_message_asks_for_a_clear() {
        let err = SlitError::ConfigurationStale {
            field: "slit_separation",
        };
        assert_eq!(
            err.to_string(),
            "slit_separation attribute has been modified. Screen must be cleared."
        );
    }
}
