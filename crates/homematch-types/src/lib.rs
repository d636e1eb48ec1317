//! # homematch-types
//!
//! Shared types, errors, and configuration for the **HomeMatch** housing
//! market clearing engine.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`OfferId`], [`BidId`], [`AgentId`], [`AssetId`], [`Period`], [`IdSequence`]
//! - **Transaction model**: [`Transaction`]
//! - **Completion seam**: [`CompletionStrategy`], [`CompletionOutcome`]
//! - **Valuation**: [`ReferencePrice`], [`ReferenceCurve`]
//! - **Configuration**: [`MarketConfig`]
//! - **Errors**: [`HomematchError`] with `HM_ERR_` prefix codes
//! - **Constants**: engine defaults and limits

pub mod completion;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod reference;
pub mod transaction;

// Re-export all primary types at crate root for ergonomic imports:
//   use homematch_types::{OfferId, MarketConfig, Transaction, ...};

pub use completion::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use reference::*;
pub use transaction::*;

// Constants are accessed via `homematch_types::constants::FOO`
// (not re-exported to avoid name collisions).
