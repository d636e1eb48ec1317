//! The two-pass clearing engine.
//!
//! ```text
//! run_cycle(config, rng, diagnostics, on_sale) -> ClearingReport
//! ```
//!
//! Each round runs two passes over the market:
//!
//! 1. **Match**: every pending bid, in submission order, attaches to the
//!    best listing it can afford (highest quality, price <= ceiling). The
//!    pending list is then emptied.
//! 2. **Clear**: every listing with matched bids is resolved (bid-up plus
//!    winner draw), removed from the index, repriced through the engine's
//!    [`PriceAuthority`] and handed to the completion callback. Losing bids
//!    return to the pending list for the next round.
//!
//! Rounds are capped by [`MarketConfig::clearing_rounds`]. Bids still
//! pending after the last round expire.
//!
//! If the completion callback fails, the failed listing goes back into the
//! index at its list price and every bid touched by the round returns to
//! the pending list in submission order. No listing keeps matched bids
//! past the end of a round, aborted or not.
//!
//! ## Self-Trade Prevention
//!
//! If the best listing under a bid's ceiling belongs to the bidder, the bid
//! is skipped. There is no fallback search for a second-best listing, and
//! like every bid that attaches nowhere it leaves the pending list.

use homematch_types::{
    AgentId, AssetId, BidId, HomematchError, IdSequence, MarketConfig, MarketId, OfferId, Period,
    Result,
};
use rand::Rng;

use crate::clearing::{self, Resolution};
use crate::diagnostics::Diagnostics;
use crate::price_quality_index::PriceQualityIndex;
use crate::record::{BuyOffer, MarketRecord, OfferHandle, PriceAuthority, SaleOffer};

/// A listing that cleared, as handed to the completion callback.
#[derive(Debug, Clone)]
pub struct Sale {
    /// The listing, already out of the index and repriced to the sale price.
    pub offer: SaleOffer,
    /// The winning bid.
    pub winner: BuyOffer,
    /// Bids that competed for the listing, winner included.
    pub competing_bids: usize,
    pub bid_up_steps: u32,
}

/// Counters for one call to [`ClearingEngine::run_cycle`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearingReport {
    /// Round cap computed at the start of the cycle.
    pub round_cap: usize,
    /// Match + clear passes actually run.
    pub rounds: usize,
    /// Bids attached to a listing, summed over rounds.
    pub matches: usize,
    pub sales: usize,
    pub self_trade_skips: usize,
    /// Bids discarded unmatched, during the rounds or at the end.
    pub expired_bids: usize,
}

#[derive(Debug, Default)]
struct RoundMatches {
    matches: usize,
    self_trade_skips: usize,
    dropped: usize,
}

/// Owns the listing index, the pending bids and the price authority.
#[derive(Debug)]
pub struct ClearingEngine {
    index: PriceQualityIndex,
    pending_bids: Vec<BuyOffer>,
    market: MarketId,
    ids: IdSequence,
    authority: PriceAuthority,
}

impl Default for ClearingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ClearingEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: PriceQualityIndex::new(),
            pending_bids: Vec::new(),
            market: MarketId::fresh(),
            ids: IdSequence::new(),
            authority: PriceAuthority::new(),
        }
    }

    // =================================================================
    // Submissions
    // =================================================================

    /// List a dwelling. `price` must already be positive.
    pub fn submit_offer(
        &mut self,
        asset: AssetId,
        seller: AgentId,
        quality: usize,
        price: f64,
        listed_at: Period,
    ) -> Result<OfferHandle> {
        let offer = SaleOffer::new(self.ids.next_offer(), asset, seller, quality, price, listed_at)
            .listed_in(self.market);
        let handle = offer.handle();
        self.index.insert(offer)?;
        Ok(handle)
    }

    /// Move a listing to a new price.
    ///
    /// # Errors
    /// `OfferNotFound` if the listing is not on the market, or the handle
    /// was issued by another market.
    pub fn update_offer_price(&mut self, handle: OfferHandle, price: f64) -> Result<()> {
        self.check_handle(handle)?;
        self.index.reprice(handle.id, price, &self.authority)
    }

    /// Take a listing off the market without a sale.
    ///
    /// # Errors
    /// `OfferNotFound` if the listing is not on the market, or the handle
    /// was issued by another market.
    pub fn withdraw_offer(&mut self, handle: OfferHandle) -> Result<SaleOffer> {
        self.check_handle(handle)?;
        self.index.remove(handle.id)
    }

    fn check_handle(&self, handle: OfferHandle) -> Result<()> {
        if handle.market == self.market {
            Ok(())
        } else {
            tracing::warn!(
                offer = %handle.id,
                handle_market = %handle.market,
                market = %self.market,
                "Handle from another market rejected"
            );
            Err(HomematchError::OfferNotFound(handle.id))
        }
    }

    /// Queue a bid for the next cycle.
    pub fn submit_bid(&mut self, buyer: AgentId, price: f64) -> BidId {
        let id = self.ids.next_bid();
        self.pending_bids.push(BuyOffer::new(id, buyer, price));
        id
    }

    // =================================================================
    // Clearing
    // =================================================================

    /// Run the bounded match/clear rounds, then expire leftover bids.
    ///
    /// `on_sale` is called once per cleared listing, in index order within
    /// each round. An error from it aborts the cycle.
    pub fn run_cycle<R, F>(
        &mut self,
        config: &MarketConfig,
        rng: &mut R,
        diagnostics: &mut Diagnostics,
        mut on_sale: F,
    ) -> Result<ClearingReport>
    where
        R: Rng,
        F: FnMut(&Sale) -> Result<()>,
    {
        let round_cap = config.clearing_rounds(self.index.len(), self.pending_bids.len());
        let mut report = ClearingReport {
            round_cap,
            ..ClearingReport::default()
        };

        for _ in 0..round_cap {
            if self.pending_bids.is_empty() || self.index.is_empty() {
                break;
            }
            let round = self.match_bids(diagnostics);
            let sales = self.clear_matches(config, rng, &mut on_sale)?;
            report.rounds += 1;
            report.matches += round.matches;
            report.self_trade_skips += round.self_trade_skips;
            report.expired_bids += round.dropped;
            report.sales += sales;
        }

        report.expired_bids += self.expire_bids();
        Ok(report)
    }

    /// Pass 1. Empties the pending list: a bid that attaches nowhere is
    /// dropped, only pass-2 losers come back.
    fn match_bids(&mut self, diagnostics: &mut Diagnostics) -> RoundMatches {
        let mut round = RoundMatches::default();

        for bid in std::mem::take(&mut self.pending_bids) {
            let Some(best) = self.index.peek_best_for(bid.price()) else {
                round.dropped += 1;
                continue;
            };
            let (offer_id, seller) = (best.id(), best.seller());
            if seller == bid.buyer() {
                tracing::debug!(
                    bid = %bid.id(),
                    offer = %offer_id,
                    agent = %seller,
                    "Self-trade skipped"
                );
                diagnostics.note_self_trade_skip();
                round.self_trade_skips += 1;
                round.dropped += 1;
                continue;
            }
            if let Some(offer) = self.index.get_mut(offer_id) {
                offer.match_with(bid);
                round.matches += 1;
            }
        }
        round
    }

    /// Pass 2. Returns the number of sales.
    fn clear_matches<R, F>(
        &mut self,
        config: &MarketConfig,
        rng: &mut R,
        on_sale: &mut F,
    ) -> Result<usize>
    where
        R: Rng,
        F: FnMut(&Sale) -> Result<()>,
    {
        let mut sales = 0;
        let mut cursor = self.index.cursor();

        while let Some(id) = cursor.advance(&self.index) {
            let Some(offer) = self.index.get_mut(id) else {
                continue;
            };
            if !offer.has_matches() {
                continue;
            }
            let bids = offer.take_matches();
            let list_price = offer.price();
            let competing_bids = bids.len();

            let Resolution {
                winner,
                losers,
                sale_price,
                bid_up_steps,
            } = clearing::resolve(list_price, bids, config, rng)?;

            let mut offer = self.index.remove(id)?;
            offer.set_price(sale_price, &self.authority);

            let sale = Sale {
                offer,
                winner,
                competing_bids,
                bid_up_steps,
            };
            if let Err(err) = on_sale(&sale) {
                self.abort_round(sale, list_price, losers);
                return Err(err);
            }

            self.pending_bids.extend(losers);
            sales += 1;
        }

        debug_assert!(self.index.iter().all(|o| !o.has_matches()));
        Ok(sales)
    }

    /// Undo the failed sale and release every bid still attached to a
    /// listing, so the index and the pending list are consistent again.
    fn abort_round(&mut self, sale: Sale, list_price: f64, losers: Vec<BuyOffer>) {
        let Sale {
            mut offer, winner, ..
        } = sale;
        let offer_id = offer.id();
        offer.set_price(list_price, &self.authority);
        if let Err(err) = self.index.insert(offer) {
            tracing::warn!(offer = %offer_id, error = %err, "Failed listing could not be restored");
        }
        self.pending_bids.push(winner);
        self.pending_bids.extend(losers);

        let still_matched: Vec<OfferId> = self
            .index
            .iter()
            .filter(|o| o.has_matches())
            .map(SaleOffer::id)
            .collect();
        for id in still_matched {
            if let Some(offer) = self.index.get_mut(id) {
                self.pending_bids.extend(offer.take_matches());
            }
        }
        self.pending_bids.sort_by_key(BuyOffer::id);

        tracing::warn!(
            offer = %offer_id,
            pending = self.pending_bids.len(),
            "Clearing round aborted"
        );
    }

    /// Discard every pending bid. Returns how many were dropped.
    pub fn expire_bids(&mut self) -> usize {
        let expired = self.pending_bids.len();
        self.pending_bids.clear();
        expired
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn index(&self) -> &PriceQualityIndex {
        &self.index
    }

    #[must_use]
    pub fn pending_bids(&self) -> &[BuyOffer] {
        &self.pending_bids
    }

    /// Tag carried by every handle this engine issues.
    #[must_use]
    pub fn market(&self) -> MarketId {
        self.market
    }

    #[must_use]
    pub fn offer(&self, id: OfferId) -> Option<&SaleOffer> {
        self.index.get(id)
    }

    /// Ids handed out so far (listings and bids share one sequence).
    #[must_use]
    pub fn ids_issued(&self) -> u64 {
        self.ids.issued()
    }
}
