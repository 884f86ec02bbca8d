//! Fixed-point recipe price.
//!
//! Prices hold at most five digits with exactly two decimal places and travel
//! over JSON as strings (`"5.00"`). Input may be a JSON string or number.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(BigDecimal);

impl Price {
    pub const MAX_DIGITS: usize = 5;
    pub const DECIMAL_PLACES: i64 = 2;

    /// Validate and rescale a decimal into a price.
    pub fn new(value: BigDecimal) -> Result<Self> {
        let (_, scale) = value.normalized().as_bigint_and_exponent();
        if scale > Self::DECIMAL_PLACES {
            return Err(CoreError::invalid_field(
                "price",
                format!(
                    "Ensure that there are no more than {} decimal places.",
                    Self::DECIMAL_PLACES
                ),
            ));
        }

        let value = value.with_scale(Self::DECIMAL_PLACES);
        let (digits, _) = value.as_bigint_and_exponent();
        let digit_count = digits.to_string().trim_start_matches('-').len();
        if digit_count > Self::MAX_DIGITS {
            return Err(CoreError::invalid_field(
                "price",
                format!(
                    "Ensure that there are no more than {} digits in total.",
                    Self::MAX_DIGITS
                ),
            ));
        }

        Ok(Self(value))
    }

    pub fn parse(input: &str) -> Result<Self> {
        let value = BigDecimal::from_str(input.trim())
            .map_err(|_| CoreError::invalid_field("price", "A valid number is required."))?;
        Self::new(value)
    }
}

impl FromStr for Price {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

struct PriceVisitor;

impl Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal number or a numeric string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Price, E> {
        Price::parse(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Price, E> {
        Price::new(BigDecimal::from(v)).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Price, E> {
        Price::new(BigDecimal::from(v)).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Price, E> {
        // Shortest round-trip text keeps 4.3 as "4.3" instead of its binary expansion.
        Price::parse(&v.to_string()).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PriceVisitor)
    }
}
