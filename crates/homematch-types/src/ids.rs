//! Identifiers used throughout HomeMatch.
//!
//! Market records (offers and bids) draw their ids from a single
//! [`IdSequence`] owned by the market. Ids are handed out in strictly
//! increasing order and never returned to the pool, so the
//! `(price, quality, id)` order of the index is stable and reproducible.
//! Every market also takes a [`MarketId`] from a process-wide counter;
//! the pair `(MarketId, OfferId)` names a listing uniquely for the whole
//! process.
//! Agents and assets are identified by ids assigned by the collaborators
//! that own them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_MARKET_ID: AtomicU64 = AtomicU64::new(1);

// ---------------------------------------------------------------------------
// MarketId
// ---------------------------------------------------------------------------

/// Process-unique tag of one market instance.
///
/// `MarketId(0)` is never issued; records built outside a market carry it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct MarketId(pub u64);

impl MarketId {
    /// Take the next tag. Never returns the same value twice in a process.
    #[must_use]
    pub fn fresh() -> Self {
        Self(NEXT_MARKET_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "market:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// OfferId
// ---------------------------------------------------------------------------

/// Identifier of a for-sale (or for-rent) listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OfferId(pub u64);

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offer:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// BidId
// ---------------------------------------------------------------------------

/// Identifier of a buy offer (bid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BidId(pub u64);

impl fmt::Display for BidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bid:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AgentId
// ---------------------------------------------------------------------------

/// A household (or any other market participant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AssetId
// ---------------------------------------------------------------------------

/// A dwelling traded on the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Period
// ---------------------------------------------------------------------------

/// Simulation clock, one tick per clearing cycle (one month in the
/// default configuration).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct Period(pub u64);

impl Period {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Whole periods elapsed since `earlier`. Saturates at zero.
    #[must_use]
    pub fn since(self, earlier: Period) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "period:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// IdSequence
// ---------------------------------------------------------------------------

/// Monotonic id source shared by offers and bids of one market.
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    #[must_use]
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Take the next raw id.
    pub fn next_raw(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn next_offer(&mut self) -> OfferId {
        OfferId(self.next_raw())
    }

    pub fn next_bid(&mut self) -> BidId {
        BidId(self.next_raw())
    }

    /// Number of ids handed out so far.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.next
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_strictly_increasing_across_kinds() {
        let mut seq = IdSequence::new();
        let a = seq.next_offer();
        let b = seq.next_bid();
        let c = seq.next_offer();
        assert!(a.0 < b.0 && b.0 < c.0);
        assert_eq!(seq.issued(), 3);
    }

    #[test]
    fn market_ids_are_fresh_and_nonzero() {
        let a = MarketId::fresh();
        let b = MarketId::fresh();
        assert_ne!(a, b);
        assert!(b > a);
        assert_ne!(a, MarketId::default());
        assert_eq!(MarketId(2).to_string(), "market:2");
    }

    #[test]
    fn period_next_and_since() {
        let p = Period(5);
        assert_eq!(p.next(), Period(6));
        assert_eq!(Period(9).since(p), 4);
        assert_eq!(p.since(Period(9)), 0);
    }

    #[test]
    fn display_prefixes() {
        assert_eq!(OfferId(3).to_string(), "offer:3");
        assert_eq!(BidId(4).to_string(), "bid:4");
        assert_eq!(AgentId(5).to_string(), "agent:5");
        assert_eq!(AssetId(6).to_string(), "asset:6");
        assert_eq!(Period(7).to_string(), "period:7");
    }

    #[test]
    fn serde_roundtrips() {
        let id = OfferId(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: OfferId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
