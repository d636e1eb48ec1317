//! Reproducibility digests.
//!
//! Two runs from the same seed and the same submissions must produce the
//! same transactions in the same order. The `transaction_root` is a
//! SHA-256 over a cycle's transactions, so runs can be compared without
//! diffing full journals.

use homematch_types::Transaction;
use sha2::{Digest, Sha256};

/// Hash a cycle's transactions, in order.
///
/// Covers ids, parties, tier, periods and the exact bit patterns of the
/// prices, so any divergence in the random stream shows up.
#[must_use]
pub fn compute_transaction_root(transactions: &[Transaction]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"homematch:transaction_root:v1:");
    hasher.update((transactions.len() as u64).to_le_bytes());

    for tx in transactions {
        hasher.update(tx.offer_id.0.to_le_bytes());
        hasher.update(tx.bid_id.0.to_le_bytes());
        hasher.update(tx.asset.0.to_le_bytes());
        hasher.update((tx.quality as u64).to_le_bytes());
        hasher.update(tx.seller.0.to_le_bytes());
        hasher.update(tx.buyer.0.to_le_bytes());
        hasher.update(tx.price.to_bits().to_le_bytes());
        hasher.update(tx.bid_price.to_bits().to_le_bytes());
        hasher.update(tx.initial_list_price.to_bits().to_le_bytes());
        hasher.update(tx.listed_at.0.to_le_bytes());
        hasher.update(tx.sold_at.0.to_le_bytes());
    }

    let digest = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&digest);
    root
}

/// Recompute the root and compare.
#[must_use]
pub fn verify_transaction_root(transactions: &[Transaction], expected_root: &[u8; 32]) -> bool {
    compute_transaction_root(transactions) == *expected_root
}
