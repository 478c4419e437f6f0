//! Frontière d'ingestion : instantanés JSON et exports GeoJSON
//!
//! Les formes hétérogènes (enregistrements préparés, sacs d'attributs d'un
//! service d'entités) sont résolues ici en `Record` canoniques. Le moteur
//! ne voit jamais les formes brutes.

pub mod feature_service;

use std::path::Path;

use anyhow::{Context, Result};
use coverage::{Point, Record};
use serde::Deserialize;
use thiserror::Error;

/// Erreurs de conversion d'une entité brute
#[derive(Debug, Error)]
pub enum IngestError {
    /// Entité sans géométrie
    #[error("Feature {feature_id} has no geometry")]
    MissingGeometry { feature_id: String },

    /// Géométrie non prise en charge (multi-géométries, collections)
    #[error("Unsupported geometry {kind} for feature {feature_id}")]
    UnsupportedGeometry { feature_id: String, kind: String },

    /// Géométrie GeoJSON invalide
    #[error("Invalid geometry for feature {feature_id}: {reason}")]
    InvalidGeometry { feature_id: String, reason: String },
}

/// Enregistrement brut, avant normalisation
#[derive(Debug, Clone)]
pub enum RawRecord {
    /// Enregistrement déjà au format canonique (workflow de téléversement)
    Staged(Record),
    /// Entité d'un service d'entités distant
    Feature {
        index: usize,
        feature: Box<geojson::Feature>,
    },
}

impl RawRecord {
    /// Résout la forme brute en `Record` canonique
    pub fn into_record(self) -> Result<Record, IngestError> {
        match self {
            RawRecord::Staged(record) => Ok(record),
            RawRecord::Feature { index, feature } => {
                feature_service::feature_to_record(index, &feature)
            }
        }
    }
}

/// Instantané : polygone de zone + enregistrements candidats
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub polygon: Vec<Point>,
    pub records: Vec<Record>,
}

impl Snapshot {
    /// Charge un instantané JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read snapshot: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid snapshot JSON")
    }

    /// Ajoute des enregistrements bruts, déjà résolus
    pub fn extend_raw(&mut self, raw: Vec<RawRecord>) -> usize {
        let before = self.records.len();
        for item in raw {
            match item.into_record() {
                Ok(record) => self.records.push(record),
                Err(e) => tracing::warn!(error = %e, "Skipping record"),
            }
        }
        self.records.len() - before
    }
}

/// Zone nommée, pour l'analyse par lot
#[derive(Debug, Clone, Deserialize)]
pub struct NamedArea {
    pub name: String,
    pub polygon: Vec<Point>,
}

/// Charge une liste de zones nommées
pub fn load_areas(path: &Path) -> Result<Vec<NamedArea>> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read areas file: {}", path.display()))?;
    serde_json::from_str(&content).context("Failed to parse areas JSON")
}
