//! The index of active listings.
//!
//! Listings are stored in a `BTreeMap` keyed by [`OfferKey`], giving the
//! primary order **price asc -> quality asc -> id asc**. Ids are unique and
//! never reused, so this order is total and identical across reruns.
//!
//! An auxiliary `HashMap<OfferId, OfferKey>` gives identity-based removal in
//! O(log N), and a price-ordered treap answers "highest quality at or under
//! a ceiling" in O(log N).

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use homematch_types::{HomematchError, OfferId, Result};

use crate::rank_tree::RankTree;
use crate::record::{MarketRecord, PriceAuthority, SaleOffer};

/// Position of a listing in the index.
#[derive(Debug, Clone, Copy)]
pub struct OfferKey {
    pub price: f64,
    pub quality: usize,
    pub id: OfferId,
}

impl OfferKey {
    #[must_use]
    pub fn of(offer: &SaleOffer) -> Self {
        Self {
            price: offer.price(),
            quality: offer.quality(),
            id: offer.id(),
        }
    }
}

impl Ord for OfferKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.price
            .total_cmp(&other.price)
            .then(self.quality.cmp(&other.quality))
            .then(self.id.cmp(&other.id))
    }
}

impl PartialOrd for OfferKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OfferKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OfferKey {}

/// Active listings ordered by (price, quality, id).
#[derive(Debug, Default)]
pub struct PriceQualityIndex {
    /// Listings in primary order.
    offers: BTreeMap<OfferKey, SaleOffer>,
    /// Fast lookup: `OfferId -> OfferKey` for identity-based removal.
    keys: HashMap<OfferId, OfferKey>,
    /// Best-quality-under-ceiling queries.
    ranks: RankTree,
}

impl PriceQualityIndex {
    /// Create a new empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            offers: BTreeMap::new(),
            keys: HashMap::new(),
            ranks: RankTree::new(),
        }
    }

    // =================================================================
    // Insertion / removal
    // =================================================================

    /// Insert a listing at its current price.
    pub fn insert(&mut self, offer: SaleOffer) -> Result<()> {
        if self.keys.contains_key(&offer.id()) {
            return Err(HomematchError::DuplicateOffer(offer.id()));
        }
        debug_assert!(offer.price() > 0.0, "indexed prices must be positive");

        let key = OfferKey::of(&offer);
        self.keys.insert(key.id, key);
        self.ranks.insert(key);
        self.offers.insert(key, offer);
        Ok(())
    }

    /// Remove a listing by id and return it.
    pub fn remove(&mut self, id: OfferId) -> Result<SaleOffer> {
        let key = self
            .keys
            .remove(&id)
            .ok_or(HomematchError::OfferNotFound(id))?;
        self.ranks.remove(&key);
        self.offers
            .remove(&key)
            .ok_or(HomematchError::OfferNotFound(id))
    }

    /// Change a listing's price and move it to its new position.
    pub fn reprice(&mut self, id: OfferId, price: f64, authority: &PriceAuthority) -> Result<()> {
        let mut offer = self.remove(id)?;
        offer.set_price(price, authority);
        self.insert(offer)
    }

    /// Remove every listing.
    pub fn drain_all(&mut self) -> Vec<SaleOffer> {
        self.keys.clear();
        self.ranks.clear();
        std::mem::take(&mut self.offers).into_values().collect()
    }

    // =================================================================
    // Queries
    // =================================================================

    /// The highest-quality listing priced at or below `ceiling`, ties
    /// broken by lowest id. `None` if nothing is affordable.
    #[must_use]
    pub fn peek_best_for(&self, ceiling: f64) -> Option<&SaleOffer> {
        let id = self.ranks.best_at_or_below(ceiling)?;
        self.get(id)
    }

    #[must_use]
    pub fn get(&self, id: OfferId) -> Option<&SaleOffer> {
        let key = self.keys.get(&id)?;
        self.offers.get(key)
    }

    /// Mutable access for matched-bid bookkeeping. The price must not be
    /// changed through this reference.
    pub(crate) fn get_mut(&mut self, id: OfferId) -> Option<&mut SaleOffer> {
        let key = self.keys.get(&id)?;
        self.offers.get_mut(key)
    }

    #[must_use]
    pub fn contains(&self, id: OfferId) -> bool {
        self.keys.contains_key(&id)
    }

    /// Number of active listings.
    #[must_use]
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.offers.len(), self.ranks.len());
        self.offers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    // =================================================================
    // Iteration
    // =================================================================

    /// Listings in primary order.
    pub fn iter(&self) -> impl Iterator<Item = &SaleOffer> {
        self.offers.values()
    }

    /// A restartable cursor that tolerates removals between steps.
    #[must_use]
    pub fn cursor(&self) -> OfferCursor {
        OfferCursor::default()
    }

    fn first_after(&self, last: Option<&OfferKey>) -> Option<OfferKey> {
        match last {
            None => self.offers.keys().next().copied(),
            Some(key) => self
                .offers
                .range((Bound::Excluded(*key), Bound::Unbounded))
                .next()
                .map(|(k, _)| *k),
        }
    }
}

/// Walks the index in primary order one listing at a time.
///
/// The cursor remembers the last key it yielded rather than borrowing the
/// index, so the caller may remove listings (including the current one)
/// between calls to [`OfferCursor::advance`].
#[derive(Debug, Clone, Default)]
pub struct OfferCursor {
    last: Option<OfferKey>,
}

impl OfferCursor {
    /// Id of the next listing after the last one yielded.
    pub fn advance(&mut self, index: &PriceQualityIndex) -> Option<OfferId> {
        let next = index.first_after(self.last.as_ref())?;
        self.last = Some(next);
        Some(next.id)
    }

    /// Start again from the cheapest listing.
    pub fn restart(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use homematch_types::{AgentId, AssetId, Period};

    use super::*;

    fn make_offer(id: u64, price: f64, quality: usize) -> SaleOffer {
        SaleOffer::new(
            OfferId(id),
            AssetId(id),
            AgentId(100 + id),
            quality,
            price,
            Period(0),
        )
    }

    fn scenario_index() -> PriceQualityIndex {
        let mut index = PriceQualityIndex::new();
        index.insert(make_offer(1, 100.0, 1)).unwrap();
        index.insert(make_offer(2, 100.0, 2)).unwrap();
        index.insert(make_offer(3, 150.0, 1)).unwrap();
        index
    }

    #[test]
    fn peek_best_for_picks_highest_quality_under_ceiling() {
        let index = scenario_index();
        assert_eq!(index.peek_best_for(120.0).map(SaleOffer::id), Some(OfferId(2)));
        assert!(index.peek_best_for(90.0).is_none());
        assert_eq!(index.peek_best_for(100.0).map(SaleOffer::id), Some(OfferId(2)));
    }

    #[test]
    fn iteration_is_price_then_quality_then_id() {
        let mut index = PriceQualityIndex::new();
        index.insert(make_offer(5, 200.0, 0)).unwrap();
        index.insert(make_offer(4, 100.0, 3)).unwrap();
        index.insert(make_offer(3, 100.0, 1)).unwrap();
        index.insert(make_offer(6, 100.0, 1)).unwrap();
        let ids: Vec<u64> = index.iter().map(|o| o.id().0).collect();
        assert_eq!(ids, vec![3, 6, 4, 5]);
    }

    #[test]
    fn remove_absent_offer_fails() {
        let mut index = scenario_index();
        assert!(matches!(
            index.remove(OfferId(99)),
            Err(HomematchError::OfferNotFound(OfferId(99)))
        ));
        index.remove(OfferId(2)).unwrap();
        assert!(matches!(
            index.remove(OfferId(2)),
            Err(HomematchError::OfferNotFound(_))
        ));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn duplicate_offer_rejected() {
        let mut index = scenario_index();
        let result = index.insert(make_offer(1, 500.0, 0));
        assert!(matches!(result, Err(HomematchError::DuplicateOffer(OfferId(1)))));
    }

    #[test]
    fn reprice_moves_offer() {
        let mut index = scenario_index();
        let authority = PriceAuthority::new();
        index.reprice(OfferId(2), 200.0, &authority).unwrap();
        assert_eq!(index.peek_best_for(120.0).map(SaleOffer::id), Some(OfferId(1)));
        let ids: Vec<u64> = index.iter().map(|o| o.id().0).collect();
        assert_eq!(ids, vec![1, 3, 2]);
        assert!(index.reprice(OfferId(42), 1.0, &authority).is_err());
    }

    #[test]
    fn cursor_survives_removal_mid_iteration() {
        let mut index = scenario_index();
        index.insert(make_offer(4, 120.0, 0)).unwrap();
        let mut cursor = index.cursor();
        let mut seen = Vec::new();
        while let Some(id) = cursor.advance(&index) {
            seen.push(id.0);
            if id.0 % 2 == 0 {
                index.remove(id).unwrap();
            }
        }
        assert_eq!(seen, vec![1, 2, 4, 3]);
        assert_eq!(index.len(), 2);

        cursor.restart();
        let again: Vec<u64> = std::iter::from_fn(|| cursor.advance(&index))
            .map(|id| id.0)
            .collect();
        assert_eq!(again, vec![1, 3]);
    }

    #[test]
    fn drain_all_empties_index() {
        let mut index = scenario_index();
        let drained = index.drain_all();
        assert_eq!(drained.len(), 3);
        assert!(index.is_empty());
        assert!(index.peek_best_for(1e9).is_none());
    }

    #[test]
    fn empty_index() {
        let index = PriceQualityIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert!(index.peek_best_for(1e12).is_none());
        assert!(index.get(OfferId(0)).is_none());
    }
}
