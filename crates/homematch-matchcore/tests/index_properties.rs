//! Property tests for the price-quality index.
//!
//! Random insert / remove / reprice sequences are replayed against a plain
//! `Vec` model; every best-under-ceiling query must agree with a brute-force
//! scan of the model.

use homematch_matchcore::{MarketRecord, PriceQualityIndex, SaleOffer};
use homematch_types::{AgentId, AssetId, IdSequence, OfferId, Period};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert { price: u32, quality: usize },
    Remove { pick: usize },
    Query { ceiling: u32 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1u32..200, 0usize..8).prop_map(|(price, quality)| Op::Insert { price, quality }),
        1 => any::<usize>().prop_map(|pick| Op::Remove { pick }),
        2 => (0u32..220).prop_map(|ceiling| Op::Query { ceiling }),
    ]
}

/// Highest quality priced at or under `ceiling`, lowest id among equals.
fn brute_force_best(model: &[(OfferId, f64, usize)], ceiling: f64) -> Option<OfferId> {
    model
        .iter()
        .filter(|(_, price, _)| *price <= ceiling)
        .max_by(|a, b| a.2.cmp(&b.2).then(b.0.cmp(&a.0)))
        .map(|(id, _, _)| *id)
}

proptest! {
    #[test]
    fn prop_peek_matches_brute_force(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let mut index = PriceQualityIndex::new();
        let mut ids = IdSequence::new();
        let mut model: Vec<(OfferId, f64, usize)> = Vec::new();

        for op in ops {
            match op {
                Op::Insert { price, quality } => {
                    let id = ids.next_offer();
                    let price = f64::from(price);
                    let offer = SaleOffer::new(id, AssetId(id.0), AgentId(1), quality, price, Period(0));
                    index.insert(offer).unwrap();
                    model.push((id, price, quality));
                }
                Op::Remove { pick } => {
                    if model.is_empty() {
                        continue;
                    }
                    let (id, _, _) = model.remove(pick % model.len());
                    let removed = index.remove(id).unwrap();
                    prop_assert_eq!(removed.id(), id);
                    prop_assert!(index.remove(id).is_err());
                }
                Op::Query { ceiling } => {
                    let ceiling = f64::from(ceiling);
                    let got = index.peek_best_for(ceiling).map(SaleOffer::id);
                    prop_assert_eq!(got, brute_force_best(&model, ceiling));
                }
            }
            prop_assert_eq!(index.len(), model.len());
        }
    }

    #[test]
    fn prop_iteration_is_total_order(
        entries in prop::collection::vec((1u32..50, 0usize..4), 0..100),
    ) {
        let mut index = PriceQualityIndex::new();
        let mut ids = IdSequence::new();
        for (price, quality) in entries {
            let id = ids.next_offer();
            let offer = SaleOffer::new(id, AssetId(0), AgentId(0), quality, f64::from(price), Period(0));
            index.insert(offer).unwrap();
        }
        let listed: Vec<&SaleOffer> = index.iter().collect();
        for pair in listed.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let ordered = a.price() < b.price()
                || (a.price() == b.price() && a.quality() < b.quality())
                || (a.price() == b.price() && a.quality() == b.quality() && a.id() < b.id());
            prop_assert!(ordered, "{:?} before {:?}", a.id(), b.id());
        }
    }

    #[test]
    fn prop_ids_never_reused(rounds in 1usize..50) {
        let mut index = PriceQualityIndex::new();
        let mut ids = IdSequence::new();
        let mut last: Option<OfferId> = None;
        for _ in 0..rounds {
            let id = ids.next_offer();
            if let Some(prev) = last {
                prop_assert!(id > prev);
            }
            index
                .insert(SaleOffer::new(id, AssetId(0), AgentId(0), 0, 10.0, Period(0)))
                .unwrap();
            index.remove(id).unwrap();
            last = Some(id);
        }
        prop_assert!(index.is_empty());
    }
}

#[test]
fn cursor_visits_every_survivor_once() {
    let mut index = PriceQualityIndex::new();
    let mut ids = IdSequence::new();
    for price in [30.0, 10.0, 20.0, 10.0, 40.0] {
        let id = ids.next_offer();
        index
            .insert(SaleOffer::new(id, AssetId(id.0), AgentId(0), 0, price, Period(0)))
            .unwrap();
    }
    let mut cursor = index.cursor();
    let mut seen = Vec::new();
    while let Some(id) = cursor.advance(&index) {
        seen.push(id);
        // remove every listing priced 20 or more as it is visited
        if index.get(id).map(MarketRecord::price).unwrap_or_default() >= 20.0 {
            index.remove(id).unwrap();
        }
    }
    assert_eq!(seen.len(), 5);
    assert_eq!(index.len(), 2);
}
