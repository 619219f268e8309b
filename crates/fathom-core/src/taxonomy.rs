//! Taxonomy report: a read-only aggregation over the species catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::species::Species;

/// Coarse family a species is filed under, guessed from its name.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Family {
  Cephalopods,
  Chondrichthyes,
  Cetaceans,
  UnidentifiedAbyssalInvertebrates,
}

const KEYWORDS: &[(Family, &[&str])] = &[
  (Family::Cephalopods, &["squid", "octopus", "kraken", "calamari", "nautilus"]),
  (Family::Chondrichthyes, &["shark", "megalodon", "stingray", "manta", "chimaera"]),
  (Family::Cetaceans, &["whale", "dolphin", "orca", "porpoise"]),
];

/// Classify a species by case-insensitive keyword match on its name.
pub fn classify(name: &str) -> Family {
  let lower = name.to_lowercase();
  KEYWORDS
    .iter()
    .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
    .map(|(family, _)| *family)
    .unwrap_or(Family::UnidentifiedAbyssalInvertebrates)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesSummary {
  pub name:              String,
  pub observation_count: u64,
  pub rarity_score:      f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyReport {
  pub total_species:                    u64,
  pub total_observations:               u64,
  /// Rounded to two decimals; `0.0` for an empty catalog.
  pub average_observations_per_species: f64,
  pub species_details:                  Vec<SpeciesSummary>,
  pub classification:                   BTreeMap<Family, Vec<String>>,
}

/// Build the report from per-species observation counts.
pub fn report(counts: Vec<(Species, u64)>) -> TaxonomyReport {
  let total_species = counts.len() as u64;
  let mut total_observations = 0;
  let mut species_details = Vec::with_capacity(counts.len());
  let mut classification: BTreeMap<Family, Vec<String>> = BTreeMap::new();

  for (species, count) in counts {
    total_observations += count;
    classification
      .entry(classify(&species.name))
      .or_default()
      .push(species.name.clone());
    species_details.push(SpeciesSummary {
      name:              species.name,
      observation_count: count,
      rarity_score:      species.rarity_score,
    });
  }

  let average_observations_per_species = if total_species == 0 {
    0.0
  } else {
    let raw = total_observations as f64 / total_species as f64;
    (raw * 100.0).round() / 100.0
  };

  TaxonomyReport {
    total_species,
    total_observations,
    average_observations_per_species,
    species_details,
    classification,
  }
}
