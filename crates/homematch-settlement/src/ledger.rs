//! Ownership and tenancy ledgers.
//!
//! The clearing engine never owns dwellings; it reports completed deals
//! to these collaborators. [`AssetRegistry`] is the in-memory
//! implementation of both.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use homematch_types::{AgentId, AssetId, HomematchError, Result};

/// Who owns which dwelling.
pub trait OwnershipLedger {
    fn owner_of(&self, asset: AssetId) -> Option<AgentId>;

    /// Move `asset` from `from` to `to`.
    ///
    /// # Errors
    /// `AssetNotFound` for an unknown asset, `OwnerMismatch` if `from` is
    /// not the current owner.
    fn transfer(&mut self, asset: AssetId, from: AgentId, to: AgentId) -> Result<()>;
}

/// Who rents which dwelling.
pub trait TenancyLedger {
    fn tenant_of(&self, asset: AssetId) -> Option<AgentId>;

    /// Start a tenancy of `asset` for `tenant` at `rent` per period.
    ///
    /// # Errors
    /// `AssetNotFound` for an unknown asset.
    fn let_to(&mut self, asset: AssetId, tenant: AgentId, rent: f64) -> Result<()>;
}

/// An active letting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tenancy {
    pub tenant: AgentId,
    pub rent: f64,
}

/// In-memory register of owners and tenants.
#[derive(Debug, Default, Clone)]
pub struct AssetRegistry {
    owners: HashMap<AssetId, AgentId>,
    tenancies: HashMap<AssetId, Tenancy>,
    transfers: u64,
}

impl AssetRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `owner` as the owner of `asset`. Returns the previous owner.
    pub fn register(&mut self, asset: AssetId, owner: AgentId) -> Option<AgentId> {
        self.owners.insert(asset, owner)
    }

    #[must_use]
    pub fn tenancy(&self, asset: AssetId) -> Option<&Tenancy> {
        self.tenancies.get(&asset)
    }

    /// End the tenancy of `asset`, if any.
    pub fn end_tenancy(&mut self, asset: AssetId) -> Option<Tenancy> {
        self.tenancies.remove(&asset)
    }

    /// Assets owned by `agent`, ascending by id.
    #[must_use]
    pub fn assets_of(&self, agent: AgentId) -> Vec<AssetId> {
        let mut assets: Vec<AssetId> = self
            .owners
            .iter()
            .filter(|(_, owner)| **owner == agent)
            .map(|(asset, _)| *asset)
            .collect();
        assets.sort_unstable();
        assets
    }

    /// Ownership changes recorded so far.
    #[must_use]
    pub fn transfers(&self) -> u64 {
        self.transfers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

impl OwnershipLedger for AssetRegistry {
    fn owner_of(&self, asset: AssetId) -> Option<AgentId> {
        self.owners.get(&asset).copied()
    }

    fn transfer(&mut self, asset: AssetId, from: AgentId, to: AgentId) -> Result<()> {
        let owner = self
            .owners
            .get_mut(&asset)
            .ok_or(HomematchError::AssetNotFound(asset))?;
        if *owner != from {
            return Err(HomematchError::OwnerMismatch {
                asset,
                listed: from,
                actual: *owner,
            });
        }
        *owner = to;
        self.transfers += 1;
        Ok(())
    }
}

impl TenancyLedger for AssetRegistry {
    fn tenant_of(&self, asset: AssetId) -> Option<AgentId> {
        self.tenancies.get(&asset).map(|t| t.tenant)
    }

    fn let_to(&mut self, asset: AssetId, tenant: AgentId, rent: f64) -> Result<()> {
        if !self.owners.contains_key(&asset) {
            return Err(HomematchError::AssetNotFound(asset));
        }
        self.tenancies.insert(asset, Tenancy { tenant, rent });
        Ok(())
    }
}

// A sale market and a rental market can share one registry.

impl<T: OwnershipLedger> OwnershipLedger for Rc<RefCell<T>> {
    fn owner_of(&self, asset: AssetId) -> Option<AgentId> {
        self.borrow().owner_of(asset)
    }

    fn transfer(&mut self, asset: AssetId, from: AgentId, to: AgentId) -> Result<()> {
        self.borrow_mut().transfer(asset, from, to)
    }
}

impl<T: TenancyLedger> TenancyLedger for Rc<RefCell<T>> {
    fn tenant_of(&self, asset: AssetId) -> Option<AgentId> {
        self.borrow().tenant_of(asset)
    }

    fn let_to(&mut self, asset: AssetId, tenant: AgentId, rent: f64) -> Result<()> {
        self.borrow_mut().let_to(asset, tenant, rent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_moves_ownership() {
        let mut registry = AssetRegistry::new();
        registry.register(AssetId(1), AgentId(10));
        registry.transfer(AssetId(1), AgentId(10), AgentId(20)).unwrap();
        assert_eq!(registry.owner_of(AssetId(1)), Some(AgentId(20)));
        assert_eq!(registry.transfers(), 1);
        assert_eq!(registry.assets_of(AgentId(20)), vec![AssetId(1)]);
        assert!(registry.assets_of(AgentId(10)).is_empty());
    }

    #[test]
    fn transfer_from_wrong_owner_fails() {
        let mut registry = AssetRegistry::new();
        registry.register(AssetId(1), AgentId(10));
        let err = registry
            .transfer(AssetId(1), AgentId(11), AgentId(20))
            .unwrap_err();
        assert!(matches!(
            err,
            HomematchError::OwnerMismatch {
                listed: AgentId(11),
                actual: AgentId(10),
                ..
            }
        ));
        assert_eq!(registry.owner_of(AssetId(1)), Some(AgentId(10)));
    }

    #[test]
    fn unknown_asset_fails() {
        let mut registry = AssetRegistry::new();
        assert!(matches!(
            registry.transfer(AssetId(5), AgentId(1), AgentId(2)),
            Err(HomematchError::AssetNotFound(AssetId(5)))
        ));
        assert!(matches!(
            registry.let_to(AssetId(5), AgentId(2), 700.0),
            Err(HomematchError::AssetNotFound(AssetId(5)))
        ));
    }

    #[test]
    fn tenancy_replaces_previous_tenant() {
        let mut registry = AssetRegistry::new();
        registry.register(AssetId(3), AgentId(1));
        registry.let_to(AssetId(3), AgentId(2), 800.0).unwrap();
        registry.let_to(AssetId(3), AgentId(4), 850.0).unwrap();
        assert_eq!(registry.tenant_of(AssetId(3)), Some(AgentId(4)));
        assert!((registry.tenancy(AssetId(3)).unwrap().rent - 850.0).abs() < f64::EPSILON);
        assert!(registry.end_tenancy(AssetId(3)).is_some());
        assert_eq!(registry.tenant_of(AssetId(3)), None);
    }

    #[test]
    fn shared_registry_sees_both_sides() {
        let shared = Rc::new(RefCell::new(AssetRegistry::new()));
        shared.borrow_mut().register(AssetId(1), AgentId(1));
        let mut owners = Rc::clone(&shared);
        let mut tenants = Rc::clone(&shared);
        owners.transfer(AssetId(1), AgentId(1), AgentId(2)).unwrap();
        tenants.let_to(AssetId(1), AgentId(3), 500.0).unwrap();
        assert_eq!(shared.borrow().owner_of(AssetId(1)), Some(AgentId(2)));
        assert_eq!(shared.borrow().tenant_of(AssetId(1)), Some(AgentId(3)));
    }
}
