//! Species rarity score.

/// Rarity of a species with no validated observations.
pub const BASE_RARITY: f64 = 1.0;

/// Validated observations per full point of rarity.
pub const VALIDATIONS_PER_POINT: f64 = 5.0;

/// `1 + validated / 5`. Non-decreasing in `validated`.
pub fn score(validated: u64) -> f64 { BASE_RARITY + validated as f64 / VALIDATIONS_PER_POINT }
