//! Configuration for a housing market instance.

use serde::{Deserialize, Serialize};

use crate::{HomematchError, Result, constants};

/// Tunables for one market (sale or rental).
///
/// Every field has a default, so a JSON document only needs to name the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Number of quality tiers `Q`; tiers are `0..Q`.
    pub quality_tiers: usize,
    /// Target population; scales round count and bid-up pressure.
    pub population_cap: usize,
    /// Multiplicative bid-up step. `1.0` disables bid-up.
    pub bid_up: f64,
    /// Time under offer, in periods.
    pub under_offer: f64,
    /// Length of the rolling HPI window.
    pub hpi_length: usize,
    /// `T = stats_sample_fraction * population_cap`.
    pub stats_sample_fraction: f64,
    /// Days in one period (days-on-market bookkeeping).
    pub days_per_period: f64,
    /// Starting smoothed days-on-market.
    pub initial_days_on_market: f64,
    /// Trades needed before the HPI is recomputed.
    pub min_sales_for_hpi: usize,
    /// Weight of the old per-tier average when blending in the new HPI.
    pub hpi_decay: f64,
    /// Replacement value for degenerate prices and averages.
    pub price_floor: f64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            quality_tiers: constants::DEFAULT_QUALITY_TIERS,
            population_cap: constants::DEFAULT_POPULATION_CAP,
            bid_up: constants::DEFAULT_BID_UP,
            under_offer: constants::DEFAULT_UNDER_OFFER,
            hpi_length: constants::DEFAULT_HPI_LENGTH,
            stats_sample_fraction: constants::DEFAULT_STATS_SAMPLE_FRACTION,
            days_per_period: constants::DEFAULT_DAYS_PER_PERIOD,
            initial_days_on_market: constants::DEFAULT_INITIAL_DAYS_ON_MARKET,
            min_sales_for_hpi: constants::DEFAULT_MIN_SALES_FOR_HPI,
            hpi_decay: constants::DEFAULT_HPI_DECAY,
            price_floor: constants::DEFAULT_PRICE_FLOOR,
        }
    }
}

impl MarketConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Same as the default but with bid-up switched off.
    #[must_use]
    pub fn without_bid_up() -> Self {
        Self {
            bid_up: 1.0,
            ..Self::default()
        }
    }

    /// Check every field for values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.quality_tiers == 0 {
            return Err(HomematchError::Configuration(
                "quality_tiers must be at least 1".into(),
            ));
        }
        if self.population_cap < constants::ROUNDS_POPULATION_DIVISOR {
            return Err(HomematchError::Configuration(format!(
                "population_cap must be at least {} (got {})",
                constants::ROUNDS_POPULATION_DIVISOR,
                self.population_cap
            )));
        }
        if !self.bid_up.is_finite() || self.bid_up < 1.0 {
            return Err(HomematchError::Configuration(format!(
                "bid_up must be a finite factor >= 1 (got {})",
                self.bid_up
            )));
        }
        if !self.under_offer.is_finite() || self.under_offer <= 0.0 {
            return Err(HomematchError::Configuration(format!(
                "under_offer must be positive (got {})",
                self.under_offer
            )));
        }
        if self.hpi_length < constants::MIN_HPI_LENGTH {
            return Err(HomematchError::Configuration(format!(
                "hpi_length must be at least {} (got {})",
                constants::MIN_HPI_LENGTH,
                self.hpi_length
            )));
        }
        if !self.stats_sample_fraction.is_finite() || self.stats_sample_fraction <= 0.0 {
            return Err(HomematchError::Configuration(format!(
                "stats_sample_fraction must be positive (got {})",
                self.stats_sample_fraction
            )));
        }
        if !self.days_per_period.is_finite() || self.days_per_period <= 0.0 {
            return Err(HomematchError::Configuration(format!(
                "days_per_period must be positive (got {})",
                self.days_per_period
            )));
        }
        if !(0.0..1.0).contains(&self.hpi_decay) {
            return Err(HomematchError::Configuration(format!(
                "hpi_decay must lie in [0, 1) (got {})",
                self.hpi_decay
            )));
        }
        if !self.price_floor.is_finite() || self.price_floor <= 0.0 {
            return Err(HomematchError::Configuration(format!(
                "price_floor must be positive (got {})",
                self.price_floor
            )));
        }
        Ok(())
    }

    /// Whether the sale price is ever bid up above the list price.
    #[must_use]
    pub fn bid_up_enabled(&self) -> bool {
        (self.bid_up - 1.0).abs() > f64::EPSILON
    }

    /// Characteristic number of samples `T` over which statistics average.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn characteristic_samples(&self) -> f64 {
        self.stats_sample_fraction * self.population_cap as f64
    }

    /// `E = exp(-1/T)`: decay of the days-on-market average, per sale.
    #[must_use]
    pub fn days_on_market_decay(&self) -> f64 {
        (-1.0 / self.characteristic_samples()).exp()
    }

    /// `G = exp(-Q/T)`: decay of a tier's average sale price, per sale.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sale_price_decay(&self) -> f64 {
        (-(self.quality_tiers as f64) / self.characteristic_samples()).exp()
    }

    /// Round cap for one clearing cycle:
    /// `min(cap / 1000, 1 + (offers + bids) / 500)`.
    #[must_use]
    pub fn clearing_rounds(&self, offers: usize, bids: usize) -> usize {
        let by_population = self.population_cap / constants::ROUNDS_POPULATION_DIVISOR;
        let by_load = 1 + (offers + bids) / constants::ROUNDS_RECORDS_PER_ROUND;
        by_population.min(by_load)
    }

    /// Reject a tier index outside `0..quality_tiers`.
    pub fn check_quality(&self, quality: usize) -> Result<()> {
        if quality >= self.quality_tiers {
            return Err(HomematchError::QualityOutOfRange {
                quality,
                tiers: self.quality_tiers,
            });
        }
        Ok(())
    }
}
