//! The seam between the clearing engine and the household/contract layer.
//!
//! The sale and rental markets run the same clearing algorithm and differ
//! only in what happens once a match completes. That difference is a
//! [`CompletionStrategy`] plugged into the market.

use serde::{Deserialize, Serialize};

use crate::{Result, Transaction};

/// What a completion strategy did with a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompletionOutcome {
    /// Ownership or tenancy moved to the buyer.
    Transferred,
    /// The buyer already held the asset; nothing changed.
    AlreadyHeld,
}

/// Side effects of a completed transaction.
pub trait CompletionStrategy {
    /// Apply the transfer. Must be a no-op returning
    /// [`CompletionOutcome::AlreadyHeld`] when the buyer already holds the
    /// asset. Errors are structural and abort the clearing cycle.
    fn complete(&mut self, transaction: &Transaction) -> Result<CompletionOutcome>;
}

/// Strategy that only records transactions; used where no ownership
/// collaborator exists.
#[derive(Debug, Default, Clone)]
pub struct RecordOnly {
    pub completed: Vec<Transaction>,
}

impl CompletionStrategy for RecordOnly {
    fn complete(&mut self, transaction: &Transaction) -> Result<CompletionOutcome> {
        self.completed.push(transaction.clone());
        Ok(CompletionOutcome::Transferred)
    }
}
