//! Resolution of a single oversubscribed listing.
//!
//! Given a listing and the bids matched to it in this round:
//! 1. Bid the price up by `bid_up^U`, `U ~ Geometric(p)`, where `p` falls as
//!    more bids compete for the dwelling
//! 2. If no bid reaches the bid-up price, sell to the highest bid at its
//!    own ceiling
//! 3. Otherwise choose uniformly among the bids at or above the bid-up
//!    price. Ranking them by ceiling would use private reservation prices
//!    the seller never sees.
//!
//! All randomness comes from the caller's generator, so the outcome is a
//! pure function of the inputs and the generator state.

use homematch_types::{HomematchError, MarketConfig, Result, constants};
use rand::Rng;
use rand_distr::{Distribution, Geometric};

use crate::record::{BuyOffer, MarketRecord};

/// Outcome of clearing one listing.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The bid that wins the dwelling.
    pub winner: BuyOffer,
    /// Every other matched bid, ascending by ceiling.
    pub losers: Vec<BuyOffer>,
    /// The final price.
    pub sale_price: f64,
    /// Number of bid-up steps drawn.
    pub bid_up_steps: u32,
}

/// Competing-bid pressure: `min(4, floor(0.5 + K * 10000 / cap))`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn enough_bids(matched: usize, population_cap: usize) -> f64 {
    (0.5 + matched as f64 * constants::BID_PRESSURE_SCALE / population_cap as f64)
        .floor()
        .min(constants::MAX_ENOUGH_BIDS)
}

/// Probability that a bid-up step does *not* happen.
#[must_use]
pub fn bid_up_success_probability(matched: usize, config: &MarketConfig) -> f64 {
    (-enough_bids(matched, config.population_cap) * config.under_offer).exp()
}

/// Failures before the first success in Bernoulli(`p`) trials.
/// `p >= 1` returns 0 without touching the generator.
pub fn sample_geometric<R: Rng>(p: f64, rng: &mut R) -> u32 {
    if p >= 1.0 || p.is_nan() || p <= 0.0 {
        return 0;
    }
    let Ok(geometric) = Geometric::new(p) else {
        return 0;
    };
    u32::try_from(geometric.sample(rng)).unwrap_or(u32::MAX)
}

/// The bid-up price of a listing with `matched` bids attached.
pub fn bid_up_price<R: Rng>(
    list_price: f64,
    matched: usize,
    config: &MarketConfig,
    rng: &mut R,
) -> (f64, u32) {
    if !config.bid_up_enabled() {
        return (list_price, 0);
    }
    let steps = sample_geometric(bid_up_success_probability(matched, config), rng);
    let exponent = i32::try_from(steps).unwrap_or(i32::MAX);
    (list_price * config.bid_up.powi(exponent), steps)
}

/// Clear one listing against its matched bids.
///
/// # Errors
/// `ClearingFailed` if `bids` is empty; the engine only resolves listings
/// that were matched this round.
pub fn resolve<R: Rng>(
    list_price: f64,
    mut bids: Vec<BuyOffer>,
    config: &MarketConfig,
    rng: &mut R,
) -> Result<Resolution> {
    if bids.is_empty() {
        return Err(HomematchError::ClearingFailed {
            reason: "resolve called on a listing with no matched bids".into(),
        });
    }

    let (mut sale_price, bid_up_steps) = bid_up_price(list_price, bids.len(), config, rng);

    // stable: equal ceilings keep submission order
    bids.sort_by(|a, b| a.price().total_cmp(&b.price()));
    let top = bids.len() - 1;

    let winner_idx = if bids[top].price() < sale_price {
        sale_price = bids[top].price();
        top
    } else {
        let first_eligible = bids.partition_point(|b| b.price() < sale_price);
        rng.gen_range(first_eligible..bids.len())
    };

    let winner = bids.remove(winner_idx);
    Ok(Resolution {
        winner,
        losers: bids,
        sale_price,
        bid_up_steps,
    })
}
