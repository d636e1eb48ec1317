//! Reference prices per quality tier.
//!
//! The house-price index is the ratio of what sold dwellings fetched to
//! what their tiers are "worth" on a fixed baseline curve. The curve is
//! supplied by a valuation collaborator, and the sale and rental markets
//! use different ones.

use serde::{Deserialize, Serialize};

use crate::{HomematchError, Result};

/// Baseline valuation of a quality tier.
pub trait ReferencePrice {
    /// Reference price of `quality`. Callers only pass in-range tiers.
    fn reference_price(&self, quality: usize) -> f64;
}

impl<F> ReferencePrice for F
where
    F: Fn(usize) -> f64,
{
    fn reference_price(&self, quality: usize) -> f64 {
        self(quality)
    }
}

/// A tabulated reference curve, one price per tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCurve {
    prices: Vec<f64>,
}

impl ReferenceCurve {
    /// Build from explicit per-tier prices. Every price must be finite and
    /// positive.
    pub fn from_prices(prices: Vec<f64>) -> Result<Self> {
        if prices.is_empty() {
            return Err(HomematchError::Configuration(
                "reference curve needs at least one tier".into(),
            ));
        }
        if let Some((q, p)) = prices
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p <= 0.0)
        {
            return Err(HomematchError::Configuration(format!(
                "reference price for tier {q} must be positive (got {p})"
            )));
        }
        Ok(Self { prices })
    }

    /// `lowest * ratio^q` for `q` in `0..tiers`.
    pub fn geometric(lowest: f64, ratio: f64, tiers: usize) -> Result<Self> {
        let mut prices = Vec::with_capacity(tiers);
        let mut price = lowest;
        for _ in 0..tiers {
            prices.push(price);
            price *= ratio;
        }
        Self::from_prices(prices)
    }

    /// Default curve for the house-sale market.
    pub fn sale_preset(tiers: usize) -> Result<Self> {
        Self::geometric(75_000.0, 1.05, tiers)
    }

    /// Default curve for the rental market (monthly rent).
    pub fn rental_preset(tiers: usize) -> Result<Self> {
        Self::geometric(350.0, 1.04, tiers)
    }

    #[must_use]
    pub fn tiers(&self) -> usize {
        self.prices.len()
    }

    #[must_use]
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }
}

impl ReferencePrice for ReferenceCurve {
    fn reference_price(&self, quality: usize) -> f64 {
        // out-of-range tiers read the top of the curve
        self.prices
            .get(quality)
            .or_else(|| self.prices.last())
            .copied()
            .unwrap_or(f64::NAN)
    }
}
