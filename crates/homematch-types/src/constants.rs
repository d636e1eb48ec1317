//! System-wide constants for the HomeMatch clearing engine.

/// Default number of quality tiers.
pub const DEFAULT_QUALITY_TIERS: usize = 48;

/// Default target population the market is scaled for.
pub const DEFAULT_POPULATION_CAP: usize = 10_000;

/// Smallest proportional price increase that can outbid a rival.
pub const DEFAULT_BID_UP: f64 = 1.0075;

/// Time (in periods) a dwelling stays under offer before completion.
pub const DEFAULT_UNDER_OFFER: f64 = 7.0 / 30.0;

/// Length of the rolling house-price-index window (periods).
pub const DEFAULT_HPI_LENGTH: usize = 15;

/// Minimum window length that `house_price_appreciation` can read.
pub const MIN_HPI_LENGTH: usize = 15;

/// Characteristic sample size as a fraction of the population cap.
pub const DEFAULT_STATS_SAMPLE_FRACTION: f64 = 0.02;

/// Days in one period.
pub const DEFAULT_DAYS_PER_PERIOD: f64 = 30.0;

/// Starting value of the smoothed days-on-market.
pub const DEFAULT_INITIAL_DAYS_ON_MARKET: f64 = 30.0;

/// Trades needed since the last recompute before the HPI is recomputed.
pub const DEFAULT_MIN_SALES_FOR_HPI: usize = 5;

/// Weight of the previous per-tier average in the HPI recompute.
pub const DEFAULT_HPI_DECAY: f64 = 0.25;

/// Floor substituted for degenerate prices and averages.
pub const DEFAULT_PRICE_FLOOR: f64 = 0.01;

/// Divisor of the population cap in the round-count formula.
pub const ROUNDS_POPULATION_DIVISOR: usize = 1_000;

/// Records per extra clearing round.
pub const ROUNDS_RECORDS_PER_ROUND: usize = 500;

/// Bid count (per 10 000 agents) at which bid-up pressure saturates.
pub const MAX_ENOUGH_BIDS: f64 = 4.0;

/// Population scale used to normalise the matched-bid count.
pub const BID_PRESSURE_SCALE: f64 = 10_000.0;

/// Number of HPI points averaged on each side of the appreciation ratio.
pub const APPRECIATION_SPAN: usize = 3;

/// Lag (periods) between the two sides of the appreciation ratio.
pub const APPRECIATION_LAG: usize = 12;

/// Smallest initial list price that feeds the sold-to-list ratio.
pub const MIN_LIST_PRICE_FOR_RATIO: f64 = 0.01;

/// Anomalies retained in the diagnostics ring.
pub const DIAGNOSTICS_RETAINED: usize = 256;

/// Settled listings remembered by the settlement guard.
pub const SETTLEMENT_GUARD_CAPACITY: usize = 500_000;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "HomeMatch";
