//! # homematch-matchcore
//!
//! **Deterministic clearing engine for HomeMatch housing markets.**
//!
//! MatchCore is the compute plane. Each period it matches queued bids
//! against listed dwellings, bids prices up on oversubscribed listings,
//! draws winners and keeps the market statistics. It has:
//!
//! - **Explicit randomness**: every draw comes from a caller-supplied `Rng`
//! - **Deterministic output**: same seed and submissions -> same transactions
//! - **Self-trade prevention**: a bid never wins its own bidder's listing
//! - **Gated pricing**: listing prices change only through the engine's
//!   [`PriceAuthority`], so the index order cannot be corrupted from outside
//! - **Pluggable completion**: sale and rental markets share the engine and
//!   differ only in their [`homematch_types::CompletionStrategy`]

pub mod clearing;
pub mod determinism;
pub mod diagnostics;
pub mod market;
pub mod matcher;
pub mod price_quality_index;
mod rank_tree;
pub mod record;
pub mod statistics;

pub use clearing::{Resolution, bid_up_price, enough_bids, resolve, sample_geometric};
pub use determinism::{compute_transaction_root, verify_transaction_root};
pub use diagnostics::{AnomalyKind, Diagnostics, NumericAnomaly};
pub use market::{CycleSummary, HousingMarket, MarketSnapshot};
pub use matcher::{ClearingEngine, ClearingReport, Sale};
pub use price_quality_index::{OfferCursor, OfferKey, PriceQualityIndex};
pub use record::{BuyOffer, MarketRecord, OfferHandle, PriceAuthority, SaleOffer};
pub use statistics::{MarketActivity, MarketStatistics, SaleSample};
