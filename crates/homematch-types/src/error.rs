//! Error types for the HomeMatch clearing engine.
//!
//! All errors use the `HM_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Record / index errors (structural)
//! - 2xx: Engine errors
//! - 3xx: Settlement errors
//! - 9xx: Configuration / internal errors
//!
//! Numeric degeneracies (NaN or non-positive prices) are deliberately not
//! represented here. They are corrected in place and recorded as
//! diagnostics so a long run keeps going.

use thiserror::Error;

use crate::{AgentId, AssetId, OfferId};

/// Central error enum for all HomeMatch operations.
#[derive(Debug, Error)]
pub enum HomematchError {
    // =================================================================
    // Record / Index Errors (1xx)
    // =================================================================
    /// The offer is not in the price-quality index.
    #[error("HM_ERR_100: Offer not found: {0}")]
    OfferNotFound(OfferId),

    /// An offer with this id is already indexed.
    #[error("HM_ERR_101: Offer already indexed: {0}")]
    DuplicateOffer(OfferId),

    /// Quality tier outside `0..tiers`.
    #[error("HM_ERR_102: Quality tier {quality} out of range (tiers: {tiers})")]
    QualityOutOfRange { quality: usize, tiers: usize },

    // =================================================================
    // Engine Errors (2xx)
    // =================================================================
    /// The clearing pass reached a state that cannot occur in a consistent index.
    #[error("HM_ERR_200: Clearing failed: {reason}")]
    ClearingFailed { reason: String },

    // =================================================================
    // Settlement Errors (3xx)
    // =================================================================
    /// The asset is unknown to the ownership collaborator.
    #[error("HM_ERR_300: Asset not found: {0}")]
    AssetNotFound(AssetId),

    /// The recorded owner is not the seller on the listing.
    #[error("HM_ERR_301: Owner mismatch on {asset}: listed by {listed}, owned by {actual}")]
    OwnerMismatch {
        asset: AssetId,
        listed: AgentId,
        actual: AgentId,
    },

    /// The listing has already been completed once.
    #[error("HM_ERR_302: Offer already settled: {0}")]
    OfferAlreadySettled(OfferId),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("HM_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("HM_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid values, missing fields, etc.).
    #[error("HM_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl HomematchError {
    /// Structural errors indicate corrupted collaborator state and must
    /// never be swallowed.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::OfferNotFound(_)
                | Self::DuplicateOffer(_)
                | Self::QualityOutOfRange { .. }
                | Self::AssetNotFound(_)
                | Self::OwnerMismatch { .. }
                | Self::OfferAlreadySettled(_)
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, HomematchError>;

impl From<serde_json::Error> for HomematchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = HomematchError::OfferNotFound(OfferId(7));
        let msg = format!("{err}");
        assert!(msg.starts_with("HM_ERR_100"), "Got: {msg}");
        assert!(msg.contains("offer:7"));
    }

    #[test]
    fn owner_mismatch_display() {
        let err = HomematchError::OwnerMismatch {
            asset: AssetId(1),
            listed: AgentId(2),
            actual: AgentId(3),
        };
        let msg = format!("{err}");
        assert!(msg.contains("HM_ERR_301"));
        assert!(msg.contains("agent:2"));
        assert!(msg.contains("agent:3"));
    }

    #[test]
    fn structural_classification() {
        assert!(HomematchError::OfferNotFound(OfferId(1)).is_structural());
        assert!(HomematchError::OfferAlreadySettled(OfferId(1)).is_structural());
        assert!(!HomematchError::Configuration("x".into()).is_structural());
    }

    #[test]
    fn all_errors_have_hm_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(HomematchError::DuplicateOffer(OfferId(1))),
            Box::new(HomematchError::QualityOutOfRange {
                quality: 9,
                tiers: 4,
            }),
            Box::new(HomematchError::ClearingFailed {
                reason: "test".into(),
            }),
            Box::new(HomematchError::AssetNotFound(AssetId(2))),
            Box::new(HomematchError::Internal("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("HM_ERR_"),
                "Error missing HM_ERR_ prefix: {msg}"
            );
        }
    }

    #[test]
    fn serde_json_error_converts() {
        let bad: std::result::Result<u64, _> = serde_json::from_str("not json");
        let err: HomematchError = bad.unwrap_err().into();
        assert!(matches!(err, HomematchError::Serialization(_)));
    }
}
