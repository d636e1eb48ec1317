//! The record of one completed sale (or letting).
//!
//! A [`Transaction`] is produced by the clearing pass for every offer that
//! found a winning bid, and handed to the market's completion strategy.

use serde::{Deserialize, Serialize};

use crate::{AgentId, AssetId, BidId, OfferId, Period};

/// A completed match between a listing and its winning bid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The listing that was sold.
    pub offer_id: OfferId,
    /// The winning bid.
    pub bid_id: BidId,
    /// The dwelling changing hands.
    pub asset: AssetId,
    /// Quality tier of the dwelling.
    pub quality: usize,
    /// Agent that listed the dwelling.
    pub seller: AgentId,
    /// Agent whose bid won.
    pub buyer: AgentId,
    /// Final clearing price.
    pub price: f64,
    /// The winner's price ceiling.
    pub bid_price: f64,
    /// Price the dwelling was first listed at.
    pub initial_list_price: f64,
    /// Period the listing was created in.
    pub listed_at: Period,
    /// Period the sale completed in.
    pub sold_at: Period,
}

impl Transaction {
    /// Whole periods the listing spent on the market.
    #[must_use]
    pub fn periods_on_market(&self) -> u64 {
        self.sold_at.since(self.listed_at)
    }

    /// `true` when buyer and seller are the same agent.
    #[must_use]
    pub fn is_self_trade(&self) -> bool {
        self.buyer == self.seller
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Transaction[{} <- {}] {} q{} {} -> {} @ {:.2}",
            self.offer_id, self.bid_id, self.asset, self.quality, self.seller, self.buyer, self.price,
        )
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Transaction {
    pub fn dummy(asset: AssetId, seller: AgentId, buyer: AgentId, price: f64) -> Self {
        Self {
            offer_id: OfferId(0),
            bid_id: BidId(1),
            asset,
            quality: 0,
            seller,
            buyer,
            price,
            bid_price: price,
            initial_list_price: price,
            listed_at: Period(0),
            sold_at: Period(0),
        }
    }
}
