//! # homematch-settlement
//!
//! **Completion plane**: what happens to a dwelling once the clearing
//! engine has matched it.
//!
//! ## Architecture
//!
//! MatchCore hands every completed [`Transaction`](homematch_types::Transaction)
//! to the market's completion strategy, which:
//! 1. Guards against completing the same listing twice
//! 2. Skips the transfer if the buyer already holds the dwelling
//! 3. Moves ownership (sale market) or starts a tenancy (rental market)
//!
//! ## Two Markets, One Engine
//!
//! - [`SaleMarket`]: [`SaleCompletion`] over an [`OwnershipLedger`]
//! - [`RentalMarket`]: [`RentalCompletion`] over a [`TenancyLedger`]

pub mod guard;
pub mod ledger;
pub mod rental;
pub mod sale;

use homematch_matchcore::HousingMarket;
use homematch_types::{MarketConfig, ReferenceCurve, Result};

pub use guard::SettlementGuard;
pub use ledger::{AssetRegistry, OwnershipLedger, Tenancy, TenancyLedger};
pub use rental::RentalCompletion;
pub use sale::SaleCompletion;

/// The house-sale market.
pub type SaleMarket<L, P = ReferenceCurve> = HousingMarket<SaleCompletion<L>, P>;

/// The rental market.
pub type RentalMarket<L, P = ReferenceCurve> = HousingMarket<RentalCompletion<L>, P>;

/// A sale market on the default sale reference curve.
///
/// # Errors
/// `Configuration` if `config` does not validate.
pub fn sale_market<L: OwnershipLedger>(config: MarketConfig, ledger: L) -> Result<SaleMarket<L>> {
    let curve = ReferenceCurve::sale_preset(config.quality_tiers)?;
    HousingMarket::new(config, SaleCompletion::new(ledger), curve)
}

/// A rental market on the default rental reference curve.
///
/// # Errors
/// `Configuration` if `config` does not validate.
pub fn rental_market<L: TenancyLedger>(
    config: MarketConfig,
    ledger: L,
) -> Result<RentalMarket<L>> {
    let curve = ReferenceCurve::rental_preset(config.quality_tiers)?;
    HousingMarket::new(config, RentalCompletion::new(ledger), curve)
}
