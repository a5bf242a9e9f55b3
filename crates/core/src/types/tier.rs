//! Product tier enums.
//!
//! Both tiers are stored as `SMALLINT` codes and exchanged as lower-case
//! strings on the wire.

use serde::{Deserialize, Serialize};

/// Error returned when a tier string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct TierError {
    kind: &'static str,
    value: String,
}

/// Relative price band of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum PriceTier {
    /// `$`
    Low = 1,
    /// `$$`
    #[default]
    Medium = 2,
    /// `$$$`
    High = 3,
}

impl PriceTier {
    /// Short symbolic label (`$`, `$$`, `$$$`).
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Low => "$",
            Self::Medium => "$$",
            Self::High => "$$$",
        }
    }
}

impl std::fmt::Display for PriceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for PriceTier {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(TierError {
                kind: "price tier",
                value: s.to_owned(),
            }),
        }
    }
}

/// Unit the product capacity is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum UnitTier {
    /// Millilitres.
    #[default]
    Ml = 1,
    /// Grams.
    G = 2,
    /// Fluid ounces.
    Oz = 3,
    /// Pieces.
    Pcs = 4,
}

impl std::fmt::Display for UnitTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ml => write!(f, "ml"),
            Self::G => write!(f, "g"),
            Self::Oz => write!(f, "oz"),
            Self::Pcs => write!(f, "pcs"),
        }
    }
}

impl std::str::FromStr for UnitTier {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ml" => Ok(Self::Ml),
            "g" => Ok(Self::G),
            "oz" => Ok(Self::Oz),
            "pcs" => Ok(Self::Pcs),
            _ => Err(TierError {
                kind: "unit",
                value: s.to_owned(),
            }),
        }
    }
}
