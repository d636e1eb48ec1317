//! Numeric anomaly diagnostics.
//!
//! A NaN or non-positive price, yield or average must not halt a long
//! run. Each occurrence is replaced by a floor value, logged at `warn`,
//! counted per kind, and kept in a bounded ring for later inspection.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use homematch_types::{Period, constants};
use serde::{Deserialize, Serialize};

/// Where a degenerate value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum AnomalyKind {
    /// A listing submitted or repriced at a non-positive / NaN price.
    OfferPrice,
    /// A bid submitted with a non-positive / NaN ceiling.
    BidPrice,
    /// A tier's smoothed average sale price went non-positive / NaN.
    AverageSalePrice,
    /// The reference price of a tier was non-positive / NaN.
    ReferencePrice,
    /// The HPI ratio came out non-positive / NaN.
    HousePriceIndex,
    /// The smoothed days-on-market went negative / NaN.
    DaysOnMarket,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OfferPrice => write!(f, "OFFER_PRICE"),
            Self::BidPrice => write!(f, "BID_PRICE"),
            Self::AverageSalePrice => write!(f, "AVERAGE_SALE_PRICE"),
            Self::ReferencePrice => write!(f, "REFERENCE_PRICE"),
            Self::HousePriceIndex => write!(f, "HOUSE_PRICE_INDEX"),
            Self::DaysOnMarket => write!(f, "DAYS_ON_MARKET"),
        }
    }
}

/// One corrected value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericAnomaly {
    pub kind: AnomalyKind,
    /// Quality tier involved, if any.
    pub quality: Option<usize>,
    /// The degenerate value as observed.
    pub observed: f64,
    /// The value used instead.
    pub replacement: f64,
    pub period: Period,
}

/// Queryable store of numeric anomalies.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    counts: BTreeMap<AnomalyKind, u64>,
    recent: VecDeque<NumericAnomaly>,
    retained: usize,
    self_trade_skips: u64,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(constants::DIAGNOSTICS_RETAINED)
    }
}

impl Diagnostics {
    #[must_use]
    pub fn new(retained: usize) -> Self {
        Self {
            counts: BTreeMap::new(),
            recent: VecDeque::with_capacity(retained),
            retained,
            self_trade_skips: 0,
        }
    }

    /// Return `value` if it is a usable positive number, otherwise record
    /// an anomaly and return `floor`.
    pub fn positive_or_floor(
        &mut self,
        kind: AnomalyKind,
        value: f64,
        floor: f64,
        quality: Option<usize>,
        period: Period,
    ) -> f64 {
        if value.is_finite() && value > 0.0 {
            return value;
        }
        self.record(NumericAnomaly {
            kind,
            quality,
            observed: value,
            replacement: floor,
            period,
        });
        floor
    }

    pub fn record(&mut self, anomaly: NumericAnomaly) {
        tracing::warn!(
            kind = %anomaly.kind,
            quality = ?anomaly.quality,
            observed = anomaly.observed,
            replacement = anomaly.replacement,
            period = anomaly.period.0,
            "Numeric anomaly corrected"
        );
        *self.counts.entry(anomaly.kind).or_insert(0) += 1;
        if self.retained == 0 {
            return;
        }
        if self.recent.len() >= self.retained {
            self.recent.pop_front();
        }
        self.recent.push_back(anomaly);
    }

    pub(crate) fn note_self_trade_skip(&mut self) {
        self.self_trade_skips += 1;
    }

    /// Anomalies of `kind` seen so far.
    #[must_use]
    pub fn count(&self, kind: AnomalyKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Anomalies of every kind seen so far.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Most recent anomalies, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &NumericAnomaly> {
        self.recent.iter()
    }

    /// Bids skipped because their best match was the bidder's own listing.
    #[must_use]
    pub fn self_trade_skips(&self) -> u64 {
        self.self_trade_skips
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_values_pass_through() {
        let mut diag = Diagnostics::default();
        let v = diag.positive_or_floor(AnomalyKind::OfferPrice, 5.0, 0.01, None, Period(0));
        assert!((v - 5.0).abs() < f64::EPSILON);
        assert_eq!(diag.total(), 0);
    }

    #[test]
    fn degenerate_values_are_floored_and_counted() {
        let mut diag = Diagnostics::default();
        for bad in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let v = diag.positive_or_floor(
                AnomalyKind::AverageSalePrice,
                bad,
                0.01,
                Some(2),
                Period(7),
            );
            assert!((v - 0.01).abs() < f64::EPSILON);
        }
        assert_eq!(diag.count(AnomalyKind::AverageSalePrice), 4);
        assert_eq!(diag.count(AnomalyKind::BidPrice), 0);
        let last = diag.recent().last().unwrap();
        assert_eq!(last.quality, Some(2));
        assert_eq!(last.period, Period(7));
    }

    #[test]
    fn ring_is_bounded() {
        let mut diag = Diagnostics::new(2);
        for i in 0..5 {
            diag.positive_or_floor(AnomalyKind::BidPrice, -1.0, 1.0, None, Period(i));
        }
        assert_eq!(diag.total(), 5);
        let periods: Vec<u64> = diag.recent().map(|a| a.period.0).collect();
        assert_eq!(periods, vec![3, 4]);
    }
}
