//! Settlement guard: each listing completes at most once.
//!
//! Completing the same `OfferId` a second time returns
//! [`HomematchError::OfferAlreadySettled`]. The guard keeps a bounded
//! memory with oldest-first eviction so long runs stay within a fixed
//! footprint.

use std::collections::{HashSet, VecDeque};

use homematch_types::{HomematchError, OfferId, Result, constants};

/// Remembers which listings have already been completed.
#[derive(Debug, Clone)]
pub struct SettlementGuard {
    settled: HashSet<OfferId>,
    /// Insertion order for eviction (front = oldest).
    order: VecDeque<OfferId>,
    capacity: usize,
}

impl Default for SettlementGuard {
    fn default() -> Self {
        Self::new(constants::SETTLEMENT_GUARD_CAPACITY)
    }
}

impl SettlementGuard {
    /// A guard remembering up to `capacity` listings (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            settled: HashSet::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    /// Fail if a listing was already completed. Does not mark it.
    ///
    /// # Errors
    /// [`HomematchError::OfferAlreadySettled`] if it was marked before and
    /// has not been evicted since.
    pub fn check(&self, offer: OfferId) -> Result<()> {
        if self.settled.contains(&offer) {
            return Err(HomematchError::OfferAlreadySettled(offer));
        }
        Ok(())
    }

    /// Mark a listing as completed.
    ///
    /// # Errors
    /// [`HomematchError::OfferAlreadySettled`] if it was marked before and
    /// has not been evicted since.
    pub fn mark_settled(&mut self, offer: OfferId) -> Result<()> {
        self.check(offer)?;

        if self.settled.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.settled.remove(&oldest);
            }
        }

        self.settled.insert(offer);
        self.order.push_back(offer);
        Ok(())
    }

    #[must_use]
    pub fn is_settled(&self, offer: OfferId) -> bool {
        self.settled.contains(&offer)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.settled.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settled.is_empty()
    }
}
