//! Completion for the rental market: a cleared listing becomes a tenancy
//! at the clearing rent.

use homematch_types::{CompletionOutcome, CompletionStrategy, Result, Transaction};

use crate::guard::SettlementGuard;
use crate::ledger::TenancyLedger;

/// Records a tenancy on every completed letting.
#[derive(Debug)]
pub struct RentalCompletion<L> {
    ledger: L,
    guard: SettlementGuard,
    lettings: u64,
}

impl<L: TenancyLedger> RentalCompletion<L> {
    #[must_use]
    pub fn new(ledger: L) -> Self {
        Self {
            ledger,
            guard: SettlementGuard::default(),
            lettings: 0,
        }
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// Tenancies started so far.
    #[must_use]
    pub fn lettings(&self) -> u64 {
        self.lettings
    }
}

impl<L: TenancyLedger> CompletionStrategy for RentalCompletion<L> {
    fn complete(&mut self, transaction: &Transaction) -> Result<CompletionOutcome> {
        self.guard.check(transaction.offer_id)?;

        let outcome = if self.ledger.tenant_of(transaction.asset) == Some(transaction.buyer) {
            tracing::debug!(
                asset = %transaction.asset,
                tenant = %transaction.buyer,
                "Buyer already rents asset, letting skipped"
            );
            CompletionOutcome::AlreadyHeld
        } else {
            self.ledger
                .let_to(transaction.asset, transaction.buyer, transaction.price)?;
            self.lettings += 1;
            CompletionOutcome::Transferred
        };

        self.guard.mark_settled(transaction.offer_id)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use homematch_types::{AgentId, AssetId, HomematchError, OfferId};

    use super::*;
    use crate::ledger::AssetRegistry;

    #[test]
    fn letting_records_tenant_and_rent() {
        let mut registry = AssetRegistry::new();
        registry.register(AssetId(4), AgentId(1));
        let mut completion = RentalCompletion::new(registry);
        let tx = Transaction::dummy(AssetId(4), AgentId(1), AgentId(7), 900.0);
        assert_eq!(completion.complete(&tx).unwrap(), CompletionOutcome::Transferred);
        let tenancy = completion.ledger().tenancy(AssetId(4)).unwrap();
        assert_eq!(tenancy.tenant, AgentId(7));
        assert!((tenancy.rent - 900.0).abs() < f64::EPSILON);
        assert_eq!(completion.lettings(), 1);
    }

    #[test]
    fn sitting_tenant_is_a_noop() {
        let mut registry = AssetRegistry::new();
        registry.register(AssetId(4), AgentId(1));
        registry.let_to(AssetId(4), AgentId(7), 850.0).unwrap();
        let mut completion = RentalCompletion::new(registry);
        let tx = Transaction::dummy(AssetId(4), AgentId(1), AgentId(7), 900.0);
        assert_eq!(completion.complete(&tx).unwrap(), CompletionOutcome::AlreadyHeld);
        // rent unchanged
        let rent = completion.ledger().tenancy(AssetId(4)).unwrap().rent;
        assert!((rent - 850.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unregistered_dwelling_is_structural() {
        let mut completion = RentalCompletion::new(AssetRegistry::new());
        let tx = Transaction {
            offer_id: OfferId(3),
            ..Transaction::dummy(AssetId(9), AgentId(1), AgentId(2), 500.0)
        };
        assert!(matches!(
            completion.complete(&tx),
            Err(HomematchError::AssetNotFound(AssetId(9)))
        ));
        // nothing was let, so the listing is not marked settled
        assert!(!completion.guard.is_settled(OfferId(3)));
        completion.ledger_mut().register(AssetId(9), AgentId(1));
        assert_eq!(completion.complete(&tx).unwrap(), CompletionOutcome::Transferred);
        assert!(completion.guard.is_settled(OfferId(3)));
    }
}
