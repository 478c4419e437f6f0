//! Types d'erreurs pour le crate coverage
//!
//! L'analyse elle-même ne retourne jamais d'erreur : les entrées invalides
//! dégradent vers des résultats vides ou neutres. Ces erreurs ne concernent
//! que la construction des valeurs de configuration.

use thiserror::Error;

/// Erreurs de construction de la configuration ou de la taxonomie
#[derive(Debug, Error, PartialEq)]
pub enum CoverageError {
    /// Priorité hors de l'intervalle 1..=3
    #[error("Invalid priority: {0} (expected 1, 2 or 3)")]
    InvalidPriority(u8),

    /// Pondérations du score négatives, non finies, ou toutes nulles
    #[error("Invalid score weights: coverage={coverage}, density={density}")]
    InvalidWeights { coverage: f64, density: f64 },

    /// Entrée de taxonomie incomplète
    #[error("Empty {field} in taxonomy entry {entry}")]
    EmptyTaxonomyEntry { field: &'static str, entry: String },
}

impl CoverageError {
    /// Crée une erreur d'entrée de taxonomie incomplète
    pub fn empty_entry(field: &'static str, entry: impl Into<String>) -> Self {
        Self::EmptyTaxonomyEntry {
            field,
            entry: entry.into(),
        }
    }
}
