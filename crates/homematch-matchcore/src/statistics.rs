//! Exponentially smoothed market statistics.
//!
//! Two clocks drive the aggregates:
//!
//! - **Per sale**: days-on-market (decay `E = exp(-1/T)`) and the sold
//!   tier's average price (decay `G = exp(-Q/T)`) are nudged towards the
//!   new observation, and the period's price / reference-price sums grow.
//! - **Per period**: once enough sales have accumulated, the house-price
//!   index `m = sum(price) / sum(reference)` is recomputed and every tier's
//!   average is blended towards `m * reference(q)`. The index value (new or
//!   unchanged) is appended to a fixed-length rolling window.

use std::collections::VecDeque;

use homematch_types::{MarketConfig, Period, ReferencePrice, constants};
use serde::{Deserialize, Serialize};

use crate::diagnostics::{AnomalyKind, Diagnostics};

/// What the statistics need to know about one completed sale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaleSample {
    pub quality: usize,
    pub price: f64,
    pub initial_list_price: f64,
    pub periods_on_market: u64,
}

/// Market depth observed at the start of a clearing cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketActivity {
    /// Bids waiting to be matched.
    pub buyers: usize,
    /// Listings on the market.
    pub sellers: usize,
    /// Mean bid ceiling, `0.0` with no bids.
    pub average_bid_price: f64,
    /// Mean list price, `0.0` with no listings.
    pub average_offer_price: f64,
}

impl MarketActivity {
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn observe(
        bid_prices: impl Iterator<Item = f64>,
        offer_prices: impl Iterator<Item = f64>,
    ) -> Self {
        let (buyers, bid_sum) = bid_prices.fold((0usize, 0.0), |(n, s), p| (n + 1, s + p));
        let (sellers, offer_sum) = offer_prices.fold((0usize, 0.0), |(n, s), p| (n + 1, s + p));
        Self {
            buyers,
            sellers,
            average_bid_price: if buyers > 0 { bid_sum / buyers as f64 } else { 0.0 },
            average_offer_price: if sellers > 0 {
                offer_sum / sellers as f64
            } else {
                0.0
            },
        }
    }
}

/// Running aggregates for one market.
#[derive(Debug, Clone)]
pub struct MarketStatistics {
    average_sale_price: Vec<f64>,
    average_days_on_market: f64,
    house_price_index: f64,
    hpi_window: VecDeque<f64>,
    hpi_length: usize,

    // accumulators since the last HPI recompute
    sold_price_sum: f64,
    sold_reference_sum: f64,
    sales_since_recompute: usize,

    sold_to_list_ratio: f64,
    sales_this_period: usize,
    activity: MarketActivity,

    days_decay: f64,
    price_decay: f64,
    hpi_decay: f64,
    min_sales_for_hpi: usize,
    days_per_period: f64,
    price_floor: f64,
}

impl MarketStatistics {
    /// Fresh statistics: every tier at its reference price, HPI 1.0, the
    /// whole window filled with 1.0.
    pub fn new<P: ReferencePrice>(
        config: &MarketConfig,
        reference: &P,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let average_sale_price = (0..config.quality_tiers)
            .map(|q| {
                diagnostics.positive_or_floor(
                    AnomalyKind::ReferencePrice,
                    reference.reference_price(q),
                    config.price_floor,
                    Some(q),
                    Period::default(),
                )
            })
            .collect();

        Self {
            average_sale_price,
            average_days_on_market: config.initial_days_on_market,
            house_price_index: 1.0,
            hpi_window: std::iter::repeat_n(1.0, config.hpi_length).collect(),
            hpi_length: config.hpi_length,
            sold_price_sum: 0.0,
            sold_reference_sum: 0.0,
            sales_since_recompute: 0,
            sold_to_list_ratio: 1.0,
            sales_this_period: 0,
            activity: MarketActivity::default(),
            days_decay: config.days_on_market_decay(),
            price_decay: config.sale_price_decay(),
            hpi_decay: config.hpi_decay,
            min_sales_for_hpi: config.min_sales_for_hpi,
            days_per_period: config.days_per_period,
            price_floor: config.price_floor,
        }
    }

    // =================================================================
    // Updates
    // =================================================================

    /// Start of a clearing cycle: store the depth snapshot and reset the
    /// period's sale counter.
    pub fn begin_period(&mut self, activity: MarketActivity) {
        self.activity = activity;
        self.sales_this_period = 0;
    }

    /// Fold one completed sale into the smoothed aggregates.
    pub fn record_sale(
        &mut self,
        sale: &SaleSample,
        reference_price: f64,
        diagnostics: &mut Diagnostics,
        period: Period,
    ) {
        let e = self.days_decay;
        #[allow(clippy::cast_precision_loss)]
        let days = self.days_per_period * sale.periods_on_market as f64;
        let smoothed_days = e * self.average_days_on_market + (1.0 - e) * days;
        self.average_days_on_market = if smoothed_days.is_finite() && smoothed_days >= 0.0 {
            smoothed_days
        } else {
            diagnostics.positive_or_floor(
                AnomalyKind::DaysOnMarket,
                smoothed_days,
                self.price_floor,
                Some(sale.quality),
                period,
            )
        };

        let g = self.price_decay;
        let q = sale.quality;
        let smoothed = g * self.average_sale_price[q] + (1.0 - g) * sale.price;
        self.average_sale_price[q] = diagnostics.positive_or_floor(
            AnomalyKind::AverageSalePrice,
            smoothed,
            self.price_floor,
            Some(q),
            period,
        );

        self.sold_reference_sum += reference_price;
        self.sold_price_sum += sale.price;
        self.sales_since_recompute += 1;
        self.sales_this_period += 1;

        if sale.initial_list_price > constants::MIN_LIST_PRICE_FOR_RATIO {
            self.sold_to_list_ratio =
                e * self.sold_to_list_ratio + (1.0 - e) * sale.price / sale.initial_list_price;
        }
    }

    /// End of a clearing cycle: recompute the HPI if enough sales have
    /// accumulated, then append it to the rolling window. Returns whether
    /// a recompute happened.
    pub fn end_period<P: ReferencePrice>(
        &mut self,
        reference: &P,
        diagnostics: &mut Diagnostics,
        period: Period,
    ) -> bool {
        let recomputed = self.sales_since_recompute >= self.min_sales_for_hpi;
        if recomputed {
            let ratio = self.sold_price_sum / self.sold_reference_sum;
            self.sold_price_sum = 0.0;
            self.sold_reference_sum = 0.0;
            self.sales_since_recompute = 0;

            // a degenerate ratio keeps the previous index
            let m = diagnostics.positive_or_floor(
                AnomalyKind::HousePriceIndex,
                ratio,
                self.house_price_index,
                None,
                period,
            );
            self.house_price_index = m;

            let decay = self.hpi_decay;
            for (q, average) in self.average_sale_price.iter_mut().enumerate() {
                let reference_price = diagnostics.positive_or_floor(
                    AnomalyKind::ReferencePrice,
                    reference.reference_price(q),
                    self.price_floor,
                    Some(q),
                    period,
                );
                let blended = decay * *average + (1.0 - decay) * (m * reference_price);
                *average = diagnostics.positive_or_floor(
                    AnomalyKind::AverageSalePrice,
                    blended,
                    self.price_floor,
                    Some(q),
                    period,
                );
            }
        }

        if self.hpi_window.len() >= self.hpi_length {
            self.hpi_window.pop_front();
        }
        self.hpi_window.push_back(self.house_price_index);
        recomputed
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Smoothed average sale price of tier `quality`, or `None` if the tier
    /// does not exist. Always positive.
    #[must_use]
    pub fn average_sale_price(&self, quality: usize) -> Option<f64> {
        self.average_sale_price.get(quality).copied()
    }

    #[must_use]
    pub fn average_sale_prices(&self) -> &[f64] {
        &self.average_sale_price
    }

    /// Highest tier whose average sale price is at or below `price`,
    /// scanning down from the top tier. `None` if even the lowest tier is
    /// out of reach.
    #[must_use]
    pub fn max_quality_affordable(&self, price: f64) -> Option<usize> {
        (0..self.average_sale_price.len())
            .rev()
            .find(|&q| self.average_sale_price[q] <= price)
    }

    /// Annualised appreciation: mean of the last three window values over
    /// the mean of the three values twelve periods earlier, minus one.
    #[must_use]
    pub fn house_price_appreciation(&self) -> f64 {
        let len = self.hpi_window.len();
        let span = constants::APPRECIATION_SPAN;
        let lag = constants::APPRECIATION_LAG;
        if len < span + lag {
            return 0.0;
        }
        let recent: f64 = self.hpi_window.range(len - span..).sum();
        let earlier: f64 = self.hpi_window.range(len - span - lag..len - lag).sum();
        recent / earlier - 1.0
    }

    #[must_use]
    pub fn house_price_index(&self) -> f64 {
        self.house_price_index
    }

    /// The rolling HPI window, oldest first.
    pub fn hpi_history(&self) -> impl Iterator<Item = f64> + '_ {
        self.hpi_window.iter().copied()
    }

    #[must_use]
    pub fn average_days_on_market(&self) -> f64 {
        self.average_days_on_market
    }

    /// Smoothed ratio of sale price to first list price.
    #[must_use]
    pub fn sold_to_list_ratio(&self) -> f64 {
        self.sold_to_list_ratio
    }

    /// Sales folded in since the last HPI recompute.
    #[must_use]
    pub fn pending_sales(&self) -> usize {
        self.sales_since_recompute
    }

    #[must_use]
    pub fn sales_this_period(&self) -> usize {
        self.sales_this_period
    }

    #[must_use]
    pub fn activity(&self) -> &MarketActivity {
        &self.activity
    }
}

#[cfg(test)]
mod tests {
    use homematch_types::ReferenceCurve;

    use super::*;

    fn config(tiers: usize) -> MarketConfig {
        MarketConfig {
            quality_tiers: tiers,
            ..MarketConfig::default()
        }
    }

    fn sample(quality: usize, price: f64) -> SaleSample {
        SaleSample {
            quality,
            price,
            initial_list_price: price,
            periods_on_market: 1,
        }
    }

    #[test]
    fn starts_at_reference_prices_and_flat_window() {
        let cfg = config(3);
        let curve = ReferenceCurve::from_prices(vec![100.0, 200.0, 400.0]).unwrap();
        let mut diag = Diagnostics::default();
        let stats = MarketStatistics::new(&cfg, &curve, &mut diag);
        assert_eq!(stats.average_sale_prices(), &[100.0, 200.0, 400.0]);
        assert!((stats.house_price_index() - 1.0).abs() < f64::EPSILON);
        assert_eq!(stats.hpi_history().count(), 15);
        assert!(stats.house_price_appreciation().abs() < f64::EPSILON);
        assert!((stats.average_days_on_market() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn five_sales_recompute_matches_decay_formula() {
        let cfg = config(3);
        let refs = [100.0, 200.0, 400.0];
        let curve = ReferenceCurve::from_prices(refs.to_vec()).unwrap();
        let mut diag = Diagnostics::default();
        let mut stats = MarketStatistics::new(&cfg, &curve, &mut diag);

        let sales = [(0, 110.0), (0, 120.0), (1, 230.0), (2, 420.0), (2, 460.0)];
        let g = cfg.sale_price_decay();
        let mut expected = refs.to_vec();
        let (mut price_sum, mut ref_sum) = (0.0, 0.0);
        for (q, price) in sales {
            stats.record_sale(&sample(q, price), refs[q], &mut diag, Period(0));
            expected[q] = g * expected[q] + (1.0 - g) * price;
            price_sum += price;
            ref_sum += refs[q];
        }
        assert_eq!(stats.pending_sales(), 5);

        assert!(stats.end_period(&curve, &mut diag, Period(0)));
        let m = price_sum / ref_sum;
        assert!((stats.house_price_index() - m).abs() < 1e-12);
        for q in 0..3 {
            let want = 0.25 * expected[q] + 0.75 * (m * refs[q]);
            let got = stats.average_sale_price(q).unwrap();
            assert!((got - want).abs() < 1e-9, "tier {q}: got {got}, want {want}");
        }
        assert_eq!(stats.pending_sales(), 0);
        assert_eq!(stats.hpi_history().last(), Some(m));
        assert_eq!(diag.total(), 0);
    }

    #[test]
    fn fewer_than_five_sales_only_advances_window() {
        let cfg = config(2);
        let curve = ReferenceCurve::from_prices(vec![100.0, 200.0]).unwrap();
        let mut diag = Diagnostics::default();
        let mut stats = MarketStatistics::new(&cfg, &curve, &mut diag);
        for _ in 0..4 {
            stats.record_sale(&sample(0, 150.0), 100.0, &mut diag, Period(0));
        }
        let before = stats.average_sale_price(1).unwrap();
        assert!(!stats.end_period(&curve, &mut diag, Period(0)));
        assert!((stats.house_price_index() - 1.0).abs() < f64::EPSILON);
        assert!((stats.average_sale_price(1).unwrap() - before).abs() < f64::EPSILON);
        assert_eq!(stats.hpi_history().count(), 15);
        // the accumulators carry over to the next period
        assert_eq!(stats.pending_sales(), 4);
    }

    #[test]
    fn appreciation_compares_quarters_a_year_apart() {
        let cfg = config(1);
        let curve = ReferenceCurve::from_prices(vec![100.0]).unwrap();
        let mut diag = Diagnostics::default();
        let mut stats = MarketStatistics::new(&cfg, &curve, &mut diag);
        // push HPI to 1.1 for the last three periods
        for period in 0..3 {
            for _ in 0..5 {
                stats.record_sale(&sample(0, 110.0), 100.0, &mut diag, Period(period));
            }
            stats.end_period(&curve, &mut diag, Period(period));
        }
        // window: twelve 1.0s then 1.1, 1.1, 1.1 -> compares against 1.0s
        let hpa = stats.house_price_appreciation();
        assert!((hpa - 0.1).abs() < 1e-9, "hpa = {hpa}");
    }

    #[test]
    fn days_on_market_and_sold_to_list_ratio_are_smoothed() {
        let cfg = config(1);
        let curve = ReferenceCurve::from_prices(vec![100.0]).unwrap();
        let mut diag = Diagnostics::default();
        let mut stats = MarketStatistics::new(&cfg, &curve, &mut diag);
        let e = cfg.days_on_market_decay();
        stats.record_sale(
            &SaleSample {
                quality: 0,
                price: 90.0,
                initial_list_price: 100.0,
                periods_on_market: 3,
            },
            100.0,
            &mut diag,
            Period(3),
        );
        assert!((stats.average_days_on_market() - (e * 30.0 + (1.0 - e) * 90.0)).abs() < 1e-9);
        assert!((stats.sold_to_list_ratio() - (e + (1.0 - e) * 0.9)).abs() < 1e-12);
        assert_eq!(stats.sales_this_period(), 1);
    }

    #[test]
    fn negative_sale_price_is_floored_not_fatal() {
        let cfg = config(1);
        let curve = ReferenceCurve::from_prices(vec![1.0]).unwrap();
        let mut diag = Diagnostics::default();
        let mut stats = MarketStatistics::new(&cfg, &curve, &mut diag);
        stats.record_sale(&sample(0, -1.0e9), 1.0, &mut diag, Period(0));
        assert!((stats.average_sale_price(0).unwrap() - cfg.price_floor).abs() < f64::EPSILON);
        assert_eq!(diag.count(AnomalyKind::AverageSalePrice), 1);
    }

    #[test]
    fn max_quality_affordable_scans_from_the_top() {
        let cfg = config(3);
        let curve = ReferenceCurve::from_prices(vec![100.0, 200.0, 400.0]).unwrap();
        let mut diag = Diagnostics::default();
        let stats = MarketStatistics::new(&cfg, &curve, &mut diag);
        assert_eq!(stats.max_quality_affordable(1_000.0), Some(2));
        assert_eq!(stats.max_quality_affordable(250.0), Some(1));
        assert_eq!(stats.max_quality_affordable(100.0), Some(0));
        assert_eq!(stats.max_quality_affordable(99.0), None);
    }

    #[test]
    fn activity_snapshot_means() {
        let activity =
            MarketActivity::observe([100.0, 200.0].into_iter(), std::iter::empty::<f64>());
        assert_eq!(activity.buyers, 2);
        assert_eq!(activity.sellers, 0);
        assert!((activity.average_bid_price - 150.0).abs() < f64::EPSILON);
        assert!(activity.average_offer_price.abs() < f64::EPSILON);
    }
}
