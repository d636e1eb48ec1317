//! Completion for the house-sale market.
//!
//! 1. Guard against completing the same listing twice
//! 2. No-op if the buyer already owns the dwelling
//! 3. Otherwise transfer ownership from seller to buyer

use homematch_types::{CompletionOutcome, CompletionStrategy, Result, Transaction};

use crate::guard::SettlementGuard;
use crate::ledger::OwnershipLedger;

/// Moves ownership on every completed sale.
#[derive(Debug)]
pub struct SaleCompletion<L> {
    ledger: L,
    guard: SettlementGuard,
    transferred: u64,
    already_held: u64,
}

impl<L: OwnershipLedger> SaleCompletion<L> {
    #[must_use]
    pub fn new(ledger: L) -> Self {
        Self::with_guard(ledger, SettlementGuard::default())
    }

    #[must_use]
    pub fn with_guard(ledger: L, guard: SettlementGuard) -> Self {
        Self {
            ledger,
            guard,
            transferred: 0,
            already_held: 0,
        }
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    #[must_use]
    pub fn guard(&self) -> &SettlementGuard {
        &self.guard
    }

    /// Sales that moved ownership.
    #[must_use]
    pub fn transferred(&self) -> u64 {
        self.transferred
    }

    /// Sales where the buyer was already the owner.
    #[must_use]
    pub fn already_held(&self) -> u64 {
        self.already_held
    }
}

impl<L: OwnershipLedger> CompletionStrategy for SaleCompletion<L> {
    fn complete(&mut self, transaction: &Transaction) -> Result<CompletionOutcome> {
        self.guard.check(transaction.offer_id)?;

        let outcome = if self.ledger.owner_of(transaction.asset) == Some(transaction.buyer) {
            tracing::debug!(
                asset = %transaction.asset,
                buyer = %transaction.buyer,
                "Buyer already owns asset, transfer skipped"
            );
            self.already_held += 1;
            CompletionOutcome::AlreadyHeld
        } else {
            self.ledger
                .transfer(transaction.asset, transaction.seller, transaction.buyer)?;
            self.transferred += 1;
            CompletionOutcome::Transferred
        };

        self.guard.mark_settled(transaction.offer_id)?;
        Ok(outcome)
    }
}
