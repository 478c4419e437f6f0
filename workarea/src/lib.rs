//! # workarea
//!
//! Analyse de complétude des enregistrements de réseaux dans une zone de
//! travail, autour du moteur `coverage`.
//!
//! ## Features
//!
//! - Configuration JSON (taxonomie, pondérations) avec presets embarqués
//! - Ingestion d'instantanés JSON et d'exports GeoJSON de services d'entités
//! - Rapport console et JSON avec empreinte de l'entrée
//! - Analyse par lot de plusieurs zones en parallèle
//!
//! ## Usage CLI
//!
//! ```bash
//! # Une zone
//! workarea analyze --snapshot ./snapshot.json --output ./report.json
//!
//! # Plusieurs zones sur le même lot d'enregistrements
//! workarea batch --areas ./areas.json --snapshot ./snapshot.json --output ./reports/
//!
//! # Taxonomie aplatie
//! workarea taxonomy --config minimal
//! ```

pub mod cli;
pub mod config;
pub mod ingest;
pub mod report;

pub use config::Config;
pub use ingest::{RawRecord, Snapshot};
pub use report::{AnalysisReport, AnalysisStatus};
