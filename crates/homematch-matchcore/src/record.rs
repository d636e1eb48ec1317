//! Market records: listings ([`SaleOffer`]) and bids ([`BuyOffer`]).
//!
//! A listing's price is part of its position in the price-quality index,
//! so changing it behind the index's back would corrupt the sort order.
//! Price mutation therefore requires a [`PriceAuthority`], which only this
//! crate can construct. The engine removes the record from the index,
//! applies the new price with its authority and re-inserts it.

use homematch_types::{AgentId, AssetId, BidId, MarketId, OfferId, Period};
use serde::{Deserialize, Serialize};

/// Capability to change a record's canonical price.
///
/// Cannot be built outside `homematch-matchcore`.
#[derive(Debug)]
pub struct PriceAuthority {
    _private: (),
}

impl PriceAuthority {
    pub(crate) const fn new() -> Self {
        Self { _private: () }
    }
}

/// Behaviour shared by both sides of the market.
pub trait MarketRecord {
    /// Monotonic id; the final tie-break of every ordering.
    fn record_id(&self) -> u64;

    /// Current price (list price for offers, ceiling for bids).
    fn price(&self) -> f64;

    /// Replace the price. Gated by [`PriceAuthority`].
    fn set_price(&mut self, price: f64, authority: &PriceAuthority);
}

/// Handle returned to the seller when a listing is submitted.
///
/// Only the market that issued it will honour it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferHandle {
    pub market: MarketId,
    pub id: OfferId,
}

/// A bid: a buyer's price ceiling for the best dwelling it can get.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyOffer {
    id: BidId,
    price: f64,
    buyer: AgentId,
}

impl BuyOffer {
    #[must_use]
    pub fn new(id: BidId, buyer: AgentId, price: f64) -> Self {
        Self { id, price, buyer }
    }

    #[must_use]
    pub fn id(&self) -> BidId {
        self.id
    }

    #[must_use]
    pub fn buyer(&self) -> AgentId {
        self.buyer
    }
}

impl MarketRecord for BuyOffer {
    fn record_id(&self) -> u64 {
        self.id.0
    }

    fn price(&self) -> f64 {
        self.price
    }

    fn set_price(&mut self, price: f64, _authority: &PriceAuthority) {
        self.price = price;
    }
}

/// A dwelling on the market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleOffer {
    id: OfferId,
    market: MarketId,
    price: f64,
    initial_price: f64,
    quality: usize,
    asset: AssetId,
    seller: AgentId,
    listed_at: Period,
    /// Bids attached during the current round's match pass.
    matched_bids: Vec<BuyOffer>,
}

impl SaleOffer {
    #[must_use]
    pub fn new(
        id: OfferId,
        asset: AssetId,
        seller: AgentId,
        quality: usize,
        price: f64,
        listed_at: Period,
    ) -> Self {
        Self {
            id,
            market: MarketId::default(),
            price,
            initial_price: price,
            quality,
            asset,
            seller,
            listed_at,
            matched_bids: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> OfferId {
        self.id
    }

    /// Tag the listing with the market that holds it.
    pub(crate) fn listed_in(mut self, market: MarketId) -> Self {
        self.market = market;
        self
    }

    #[must_use]
    pub fn market(&self) -> MarketId {
        self.market
    }

    #[must_use]
    pub fn handle(&self) -> OfferHandle {
        OfferHandle {
            market: self.market,
            id: self.id,
        }
    }

    #[must_use]
    pub fn quality(&self) -> usize {
        self.quality
    }

    #[must_use]
    pub fn asset(&self) -> AssetId {
        self.asset
    }

    #[must_use]
    pub fn seller(&self) -> AgentId {
        self.seller
    }

    #[must_use]
    pub fn listed_at(&self) -> Period {
        self.listed_at
    }

    /// Price at first listing, before any update or bid-up.
    #[must_use]
    pub fn initial_price(&self) -> f64 {
        self.initial_price
    }

    #[must_use]
    pub fn matched_bids(&self) -> &[BuyOffer] {
        &self.matched_bids
    }

    #[must_use]
    pub fn has_matches(&self) -> bool {
        !self.matched_bids.is_empty()
    }

    pub(crate) fn match_with(&mut self, bid: BuyOffer) {
        self.matched_bids.push(bid);
    }

    pub(crate) fn take_matches(&mut self) -> Vec<BuyOffer> {
        std::mem::take(&mut self.matched_bids)
    }
}

impl MarketRecord for SaleOffer {
    fn record_id(&self) -> u64 {
        self.id.0
    }

    fn price(&self) -> f64 {
        self.price
    }

    fn set_price(&mut self, price: f64, _authority: &PriceAuthority) {
        self.price = price;
    }
}
