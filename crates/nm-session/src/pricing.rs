use alloy_primitives::U256;
use alloy_primitives::utils::parse_ether;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceError {
    #[error("price table has no tiers")]
    Empty,
    #[error("tier for length {min_length} has invalid price {price:?}: {reason}")]
    InvalidPrice {
        min_length: usize,
        price: String,
        reason: String,
    },
    #[error("length {0} is priced twice")]
    DuplicateTier(usize),
}

/// One row of the price table as written in configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceTier {
    pub min_length: usize,
    /// Decimal amount in the native currency, e.g. `"0.005"`.
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Price {
    pub ether: String,
    pub wei: U256,
}

/// Registration price by name length.
///
/// A name of length `L` pays the tier with the largest `min_length <= L`.
/// Prices are parsed once, when the table is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PriceTier>", into = "Vec<PriceTier>")]
pub struct PriceTable {
    // ascending by min_length
    tiers: Vec<(usize, Price)>,
}

impl PriceTable {
    pub fn price_for(&self, name_length: usize) -> Option<&Price> {
        self.tiers
            .iter()
            .rev()
            .find(|(min_length, _)| *min_length <= name_length)
            .map(|(_, price)| price)
    }

    pub fn tiers(&self) -> Vec<PriceTier> {
        self.tiers
            .iter()
            .map(|(min_length, price)| PriceTier {
                min_length: *min_length,
                price: price.ether.clone(),
            })
            .collect()
    }
}

impl Default for PriceTable {
    /// 0.005 for three characters, 0.0003 for four, 0.0001 beyond.
    fn default() -> Self {
        let tier = |min_length: usize, ether: &str, wei: u64| {
            (
                min_length,
                Price {
                    ether: ether.to_owned(),
                    wei: U256::from(wei),
                },
            )
        };
        Self {
            tiers: vec![
                tier(3, "0.005", 5_000_000_000_000_000),
                tier(4, "0.0003", 300_000_000_000_000),
                tier(5, "0.0001", 100_000_000_000_000),
            ],
        }
    }
}

impl TryFrom<Vec<PriceTier>> for PriceTable {
    type Error = PriceError;

    fn try_from(mut raw: Vec<PriceTier>) -> Result<Self, Self::Error> {
        if raw.is_empty() {
            return Err(PriceError::Empty);
        }
        raw.sort_by_key(|tier| tier.min_length);

        let mut tiers: Vec<(usize, Price)> = Vec::with_capacity(raw.len());
        for tier in raw {
            if tiers.last().is_some_and(|(last, _)| *last == tier.min_length) {
                return Err(PriceError::DuplicateTier(tier.min_length));
            }
            let wei = parse_ether(tier.price.trim()).map_err(|err| PriceError::InvalidPrice {
                min_length: tier.min_length,
                price: tier.price.clone(),
                reason: err.to_string(),
            })?;
            tiers.push((
                tier.min_length,
                Price {
                    ether: tier.price.trim().to_owned(),
                    wei,
                },
            ));
        }
        Ok(Self { tiers })
    }
}

impl From<PriceTable> for Vec<PriceTier> {
    fn from(table: PriceTable) -> Self {
        table.tiers()
    }
}
