//! Seeded synthetic inventory for demos and load tests.
//!
//! One item in ten is a high-demand item: larger quantity, thinner margin.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::error::{Error, Result};
use crate::records::{RecordTable, Scalar};

pub const DEFAULT_ROWS: usize = 1000;
pub const DEFAULT_SEED: u64 = 17;

const CATEGORIES: [&str; 3] = ["A", "B", "C"];
const REGIONS: [&str; 3] = ["R1", "R2", "R3"];

struct Item {
    category: &'static str,
    region: &'static str,
    store: u32,
    quantity: f64,
    unit_price: f64,
    gross_margin: f64,
}

/// Columns: id, category, region, store, quantity, unit_price,
/// gross_margin, gross_profit
pub fn generate(num_rows: usize, seed: u64) -> Result<RecordTable> {
    let mut rng = StdRng::seed_from_u64(seed);
    let high_demand = num_rows / 10;
    let high_quantity = normal(200.0, 150.0)?;
    let low_quantity = normal(20.0, 15.0)?;
    let price = normal(4.0, 3.0)?;

    let mut items: Vec<Item> = (0..num_rows)
        .map(|i| {
            let high = i < high_demand;
            let quantity = if high { &high_quantity } else { &low_quantity };
            let margin = if high {
                rng.random_range(0.02..0.03)
            } else {
                rng.random_range(0.05..0.2)
            };
            Item {
                category: CATEGORIES[rng.random_range(0..CATEGORIES.len())],
                region: REGIONS[rng.random_range(0..REGIONS.len())],
                store: rng.random_range(1..=20),
                quantity: quantity.sample(&mut rng).ceil().max(0.0),
                unit_price: price.sample(&mut rng).max(0.5),
                gross_margin: margin,
            }
        })
        .collect();
    items.shuffle(&mut rng);

    RecordTable::from_columns(vec![
        ("id", column(&items, |i, _| Scalar::Number((i + 1) as f64))),
        ("category", column(&items, |_, item| Scalar::from(item.category))),
        ("region", column(&items, |_, item| Scalar::from(item.region))),
        ("store", column(&items, |_, item| Scalar::Number(f64::from(item.store)))),
        ("quantity", column(&items, |_, item| Scalar::Number(item.quantity))),
        ("unit_price", column(&items, |_, item| Scalar::Number(item.unit_price))),
        ("gross_margin", column(&items, |_, item| Scalar::Number(item.gross_margin))),
        (
            "gross_profit",
            column(&items, |_, item| Scalar::Number(item.gross_margin * item.unit_price)),
        ),
    ])
}

fn column<F: Fn(usize, &Item) -> Scalar>(items: &[Item], f: F) -> Vec<Option<Scalar>> {
    items.iter().enumerate().map(|(i, item)| Some(f(i, item))).collect()
}

fn normal(mean: f64, std_dev: f64) -> Result<Normal<f64>> {
    Normal::new(mean, std_dev)
        .map_err(|e| Error::InvalidConfig(format!("normal({}, {}): {}", mean, std_dev, e)))
}
