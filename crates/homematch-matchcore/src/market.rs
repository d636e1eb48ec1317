//! The market façade: one clearing engine, its statistics and a completion
//! strategy behind the public submission / clearing / query surface.
//!
//! The sale and rental markets are the same type with different
//! [`CompletionStrategy`] and [`ReferencePrice`] parameters.

use homematch_types::{
    AgentId, AssetId, BidId, CompletionOutcome, CompletionStrategy, HomematchError, MarketConfig,
    Period, ReferencePrice, Result, Transaction,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::determinism::compute_transaction_root;
use crate::diagnostics::{AnomalyKind, Diagnostics};
use crate::matcher::{ClearingEngine, Sale};
use crate::price_quality_index::PriceQualityIndex;
use crate::record::{MarketRecord, OfferHandle, SaleOffer};
use crate::statistics::{MarketActivity, MarketStatistics, SaleSample};

/// What one clearing cycle did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    /// Period the cycle cleared.
    pub period: Period,
    pub round_cap: usize,
    pub rounds: usize,
    pub matches: usize,
    pub sales: usize,
    /// Sales where the buyer already held the asset.
    pub already_held: usize,
    pub self_trade_skips: usize,
    pub expired_bids: usize,
    /// Whether the HPI was recomputed at the end of the cycle.
    pub hpi_recomputed: bool,
    /// Digest of the cycle's transactions, in order.
    pub transaction_root: [u8; 32],
}

impl CycleSummary {
    #[must_use]
    pub fn transaction_root_hex(&self) -> String {
        hex::encode(self.transaction_root)
    }
}

/// Serializable view of a market's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub period: Period,
    pub house_price_index: f64,
    pub house_price_appreciation: f64,
    pub average_days_on_market: f64,
    pub sold_to_list_ratio: f64,
    pub average_sale_prices: Vec<f64>,
    pub activity: MarketActivity,
    pub offers_on_market: usize,
    pub pending_bids: usize,
    pub anomalies: u64,
}

/// A housing market, parameterised by what happens when a sale completes.
#[derive(Debug)]
pub struct HousingMarket<C, P> {
    config: MarketConfig,
    engine: ClearingEngine,
    statistics: MarketStatistics,
    diagnostics: Diagnostics,
    completion: C,
    reference: P,
    period: Period,
    last_cycle: Option<CycleSummary>,
    last_transactions: Vec<Transaction>,
}

impl<C: CompletionStrategy, P: ReferencePrice> HousingMarket<C, P> {
    /// Build a market with every tier at its reference price and a flat
    /// HPI history.
    ///
    /// # Errors
    /// `Configuration` if `config` does not validate.
    pub fn new(config: MarketConfig, completion: C, reference: P) -> Result<Self> {
        config.validate()?;
        let mut diagnostics = Diagnostics::default();
        let statistics = MarketStatistics::new(&config, &reference, &mut diagnostics);
        Ok(Self {
            config,
            engine: ClearingEngine::new(),
            statistics,
            diagnostics,
            completion,
            reference,
            period: Period::default(),
            last_cycle: None,
            last_transactions: Vec::new(),
        })
    }

    // =================================================================
    // Submissions
    // =================================================================

    /// List `asset` (owned by `seller`, tier `quality`) at `list_price`.
    ///
    /// # Errors
    /// `QualityOutOfRange` for a tier outside the configured range.
    pub fn submit_offer(
        &mut self,
        asset: AssetId,
        seller: AgentId,
        quality: usize,
        list_price: f64,
    ) -> Result<OfferHandle> {
        self.config.check_quality(quality)?;
        let price = self.diagnostics.positive_or_floor(
            AnomalyKind::OfferPrice,
            list_price,
            self.config.price_floor,
            Some(quality),
            self.period,
        );
        self.engine
            .submit_offer(asset, seller, quality, price, self.period)
    }

    /// Reprice a listing; it moves to its new place in the index.
    ///
    /// # Errors
    /// `OfferNotFound` if the listing has sold or been withdrawn.
    pub fn update_offer_price(&mut self, handle: OfferHandle, new_price: f64) -> Result<()> {
        let quality = self
            .engine
            .offer(handle.id)
            .filter(|o| o.market() == handle.market)
            .map(SaleOffer::quality)
            .ok_or(HomematchError::OfferNotFound(handle.id))?;
        let price = self.diagnostics.positive_or_floor(
            AnomalyKind::OfferPrice,
            new_price,
            self.config.price_floor,
            Some(quality),
            self.period,
        );
        self.engine.update_offer_price(handle, price)
    }

    /// Remove a listing without a sale.
    ///
    /// # Errors
    /// `OfferNotFound` if the listing has sold or been withdrawn.
    pub fn withdraw_offer(&mut self, handle: OfferHandle) -> Result<SaleOffer> {
        self.engine.withdraw_offer(handle)
    }

    /// Queue a bid for the next clearing cycle.
    pub fn submit_bid(&mut self, buyer: AgentId, price_ceiling: f64) -> BidId {
        let price = self.diagnostics.positive_or_floor(
            AnomalyKind::BidPrice,
            price_ceiling,
            self.config.price_floor,
            None,
            self.period,
        );
        self.engine.submit_bid(buyer, price)
    }

    // =================================================================
    // Clearing
    // =================================================================

    /// Clear the market for the current period.
    ///
    /// Snapshots market depth, runs the bounded match/clear rounds
    /// (completing every sale through the strategy), expires leftover bids,
    /// updates the statistics and advances the period.
    ///
    /// # Errors
    /// Any structural error from the index or the completion strategy.
    /// Sales completed before the error are still folded into the
    /// statistics; the period does not advance.
    pub fn run_clearing_cycle<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        let period = self.period;
        self.statistics.begin_period(MarketActivity::observe(
            self.engine.pending_bids().iter().map(MarketRecord::price),
            self.engine.index().iter().map(MarketRecord::price),
        ));

        let mut journal: Vec<Transaction> = Vec::new();
        let mut already_held = 0;
        let outcome = {
            let Self {
                config,
                engine,
                diagnostics,
                completion,
                ..
            } = self;
            engine.run_cycle(config, rng, diagnostics, |sale| {
                let tx = transaction_of(sale, period);
                let completed = completion.complete(&tx)?;
                tracing::debug!(
                    offer = %tx.offer_id,
                    bid = %tx.bid_id,
                    asset = %tx.asset,
                    quality = tx.quality,
                    price = tx.price,
                    bid_up_steps = sale.bid_up_steps,
                    competing_bids = sale.competing_bids,
                    outcome = ?completed,
                    "Sale completed"
                );
                if completed == CompletionOutcome::AlreadyHeld {
                    already_held += 1;
                }
                journal.push(tx);
                Ok(())
            })
        };

        for tx in &journal {
            self.record_sale(tx);
        }
        let report = outcome?;

        let hpi_recomputed =
            self.statistics
                .end_period(&self.reference, &mut self.diagnostics, period);

        let summary = CycleSummary {
            period,
            round_cap: report.round_cap,
            rounds: report.rounds,
            matches: report.matches,
            sales: report.sales,
            already_held,
            self_trade_skips: report.self_trade_skips,
            expired_bids: report.expired_bids,
            hpi_recomputed,
            transaction_root: compute_transaction_root(&journal),
        };

        tracing::info!(
            period = period.0,
            rounds = summary.rounds,
            round_cap = summary.round_cap,
            sales = summary.sales,
            expired_bids = summary.expired_bids,
            self_trade_skips = summary.self_trade_skips,
            hpi = self.statistics.house_price_index(),
            transaction_root = %summary.transaction_root_hex(),
            "Clearing cycle complete"
        );

        self.last_cycle = Some(summary);
        self.last_transactions = journal;
        self.period = period.next();
        Ok(())
    }

    fn record_sale(&mut self, tx: &Transaction) {
        let reference_price = self.diagnostics.positive_or_floor(
            AnomalyKind::ReferencePrice,
            self.reference.reference_price(tx.quality),
            self.config.price_floor,
            Some(tx.quality),
            tx.sold_at,
        );
        self.statistics.record_sale(
            &SaleSample {
                quality: tx.quality,
                price: tx.price,
                initial_list_price: tx.initial_list_price,
                periods_on_market: tx.periods_on_market(),
            },
            reference_price,
            &mut self.diagnostics,
            tx.sold_at,
        );
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Reference price of tier `quality`.
    ///
    /// # Errors
    /// `QualityOutOfRange` for a tier outside the configured range.
    pub fn reference_price(&self, quality: usize) -> Result<f64> {
        self.config.check_quality(quality)?;
        Ok(self.reference.reference_price(quality))
    }

    /// Smoothed average sale price of tier `quality`, never below the
    /// price floor.
    ///
    /// # Errors
    /// `QualityOutOfRange` for a tier outside the configured range.
    pub fn average_sale_price(&self, quality: usize) -> Result<f64> {
        self.config.check_quality(quality)?;
        let average = self
            .statistics
            .average_sale_price(quality)
            .unwrap_or(self.config.price_floor);
        Ok(if average > 0.0 {
            average
        } else {
            self.config.price_floor
        })
    }

    /// Best tier whose average sale price is at or below `price`.
    #[must_use]
    pub fn max_quality_affordable(&self, price: f64) -> Option<usize> {
        self.statistics.max_quality_affordable(price)
    }

    #[must_use]
    pub fn house_price_appreciation(&self) -> f64 {
        self.statistics.house_price_appreciation()
    }

    #[must_use]
    pub fn house_price_index(&self) -> f64 {
        self.statistics.house_price_index()
    }

    /// Period the next clearing cycle will clear.
    #[must_use]
    pub fn period(&self) -> Period {
        self.period
    }

    #[must_use]
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    #[must_use]
    pub fn statistics(&self) -> &MarketStatistics {
        &self.statistics
    }

    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    #[must_use]
    pub fn offers(&self) -> &PriceQualityIndex {
        self.engine.index()
    }

    #[must_use]
    pub fn pending_bid_count(&self) -> usize {
        self.engine.pending_bids().len()
    }

    #[must_use]
    pub fn completion(&self) -> &C {
        &self.completion
    }

    pub fn completion_mut(&mut self) -> &mut C {
        &mut self.completion
    }

    /// Summary of the most recent clearing cycle.
    #[must_use]
    pub fn last_cycle(&self) -> Option<&CycleSummary> {
        self.last_cycle.as_ref()
    }

    /// Transactions of the most recent clearing cycle, in completion order.
    #[must_use]
    pub fn last_cycle_transactions(&self) -> &[Transaction] {
        &self.last_transactions
    }

    /// Digest of the most recent cycle's transactions; the digest of an
    /// empty journal before the first cycle.
    #[must_use]
    pub fn cycle_digest(&self) -> [u8; 32] {
        self.last_cycle.as_ref().map_or_else(
            || compute_transaction_root(&[]),
            |summary| summary.transaction_root,
        )
    }

    #[must_use]
    pub fn snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            period: self.period,
            house_price_index: self.statistics.house_price_index(),
            house_price_appreciation: self.statistics.house_price_appreciation(),
            average_days_on_market: self.statistics.average_days_on_market(),
            sold_to_list_ratio: self.statistics.sold_to_list_ratio(),
            average_sale_prices: self.statistics.average_sale_prices().to_vec(),
            activity: self.statistics.activity().clone(),
            offers_on_market: self.engine.index().len(),
            pending_bids: self.engine.pending_bids().len(),
            anomalies: self.diagnostics.total(),
        }
    }
}

fn transaction_of(sale: &Sale, sold_at: Period) -> Transaction {
    let offer = &sale.offer;
    Transaction {
        offer_id: offer.id(),
        bid_id: sale.winner.id(),
        asset: offer.asset(),
        quality: offer.quality(),
        seller: offer.seller(),
        buyer: sale.winner.buyer(),
        price: offer.price(),
        bid_price: sale.winner.price(),
        initial_list_price: offer.initial_price(),
        listed_at: offer.listed_at(),
        sold_at,
    }
}
