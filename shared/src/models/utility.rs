//! Utility Types and Rates

use serde::{Deserialize, Serialize};

/// Metered utility kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum UtilityKind {
    Electric,
    Water,
}

impl UtilityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UtilityKind::Electric => "electric",
            UtilityKind::Water => "water",
        }
    }
}

impl std::fmt::Display for UtilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UtilityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "electric" => Ok(UtilityKind::Electric),
            "water" => Ok(UtilityKind::Water),
            other => Err(format!("Unknown utility kind: {other}")),
        }
    }
}

/// Utility type reference row (seeded by migration, absence is fatal)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UtilityType {
    pub id: i64,
    pub code: UtilityKind,
    pub display_name: String,
}

/// Rate history row. Append-only: past rates are never updated in place,
/// a new row with a later `effective_date` supersedes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UtilityRate {
    pub id: i64,
    pub utility_type_id: i64,
    pub rate_per_unit: f64,
    /// ISO date from which this rate applies
    pub effective_date: String,
    pub created_at: i64,
}

/// Append a new rate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilityRateCreate {
    pub utility: UtilityKind,
    pub rate_per_unit: f64,
    pub effective_date: String,
}
