//! Rapport d'analyse d'une zone de travail
//!
//! Ce module met à plat le résultat du moteur pour l'affichage console
//! et l'export JSON.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use coverage::{Analysis, GroupStatus, Point, Record};
use serde::Serialize;

/// Statut global de la zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnalysisStatus {
    /// Polygone sous-spécifié : analyse non applicable
    Inactive,
    /// Toutes les catégories et tous les types attendus sont présents
    Complete,
    /// Des catégories ou des types attendus manquent
    Partial,
}

/// Résumé d'un groupe owner/domain
#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub owner: String,
    pub domain: String,
    pub status: GroupStatus,
    pub present: usize,
    /// "Label (P1)"
    pub missing: Vec<String>,
}

/// Rapport complet d'analyse
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Nom de la zone
    pub area: String,
    /// Statut global
    pub status: AnalysisStatus,
    /// Empreinte blake3 (hex) du polygone et des enregistrements
    pub fingerprint: String,

    /// Nombre de sommets du polygone
    pub vertices: usize,
    /// Aire planaire approchée
    pub area_sq_meters: f64,
    /// Nombre d'enregistrements candidats
    pub records_scanned: usize,
    /// Nombre d'enregistrements dans la zone
    pub records_inside: usize,

    /// Absent si la zone est inactive
    pub completeness_pct: Option<u8>,
    pub coverage_score: f64,
    pub density_score: f64,
    pub categories_present: Vec<String>,
    pub categories_missing: Vec<String>,
    pub records_by_type: BTreeMap<String, usize>,
    pub gaps: Vec<String>,

    /// Groupes de la taxonomie, manques P1 en tête
    pub groups: Vec<GroupSummary>,
    /// Checklist copiable
    pub checklist: String,
}

impl AnalysisReport {
    /// Construit le rapport depuis l'analyse du moteur
    pub fn new(area: &str, polygon: &[Point], records: &[Record], analysis: &Analysis) -> Result<Self> {
        let mut report = Self {
            area: area.to_string(),
            status: AnalysisStatus::Inactive,
            fingerprint: fingerprint(polygon, records)?,
            vertices: polygon.len(),
            area_sq_meters: 0.0,
            records_scanned: records.len(),
            records_inside: 0,
            completeness_pct: None,
            coverage_score: 0.0,
            density_score: 0.0,
            categories_present: Vec::new(),
            categories_missing: Vec::new(),
            records_by_type: BTreeMap::new(),
            gaps: Vec::new(),
            groups: Vec::new(),
            checklist: String::new(),
        };

        let Some(active) = analysis.active() else {
            return Ok(report);
        };
        let result = &active.completeness;

        report.area_sq_meters = active.area_sq_meters;
        report.records_inside = result.record_count;
        report.completeness_pct = Some(result.completeness_pct);
        report.coverage_score = result.coverage_score;
        report.density_score = result.density_score;
        report.categories_present = result.categories_present.iter().map(|c| c.to_string()).collect();
        report.categories_missing = result.categories_missing.iter().map(|c| c.to_string()).collect();
        report.records_by_type = result.records_by_type.clone();
        report.gaps = result.gap_lines();
        report.groups = active
            .guidance
            .groups
            .iter()
            .map(|g| GroupSummary {
                owner: g.owner.clone(),
                domain: g.domain.clone(),
                status: g.status,
                present: g.present.len(),
                missing: g
                    .missing
                    .iter()
                    .map(|row| format!("{} ({})", row.label, row.priority))
                    .collect(),
            })
            .collect();
        report.checklist = active.guidance.checklist();

        report.status = if result.categories_missing.is_empty() && active.guidance.missing_count() == 0 {
            AnalysisStatus::Complete
        } else {
            AnalysisStatus::Partial
        };

        Ok(report)
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("WORK AREA REPORT - {}", self.area);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Fingerprint: {}", self.fingerprint);

        if self.status == AnalysisStatus::Inactive {
            println!(
                "\nWork area has {} vertices (3 required): analysis not applicable",
                self.vertices
            );
            println!("\n{}", "=".repeat(60));
            return;
        }

        println!("\n--- SUMMARY ---");
        println!("Area: {:.0} m² (planar approximation)", self.area_sq_meters);
        println!(
            "Records: {} inside, {} scanned",
            self.records_inside, self.records_scanned
        );
        println!(
            "Completeness: {}% (coverage {:.1}, density {:.1})",
            self.completeness_pct.unwrap_or(0),
            self.coverage_score,
            self.density_score
        );
        println!("Categories present: {}", join_or_none(&self.categories_present));
        println!("Categories missing: {}", join_or_none(&self.categories_missing));

        if !self.records_by_type.is_empty() {
            println!("\n--- BY TYPE ---");
            for (record_type, count) in &self.records_by_type {
                println!("  {}: {}", record_type, count);
            }
        }

        if !self.gaps.is_empty() {
            println!("\n--- GAPS ({}) ---", self.gaps.len());
            for gap in &self.gaps {
                println!("  {}", gap);
            }
        }

        if !self.groups.is_empty() {
            println!("\n--- GUIDANCE ---");
            for group in self.groups.iter().take(20) {
                match group.status {
                    GroupStatus::Complete => {
                        println!("  {} / {}: Complete", group.owner, group.domain)
                    }
                    GroupStatus::Incomplete => println!(
                        "  {} / {}: {} missing ({})",
                        group.owner,
                        group.domain,
                        group.missing.len(),
                        group.missing.join(", ")
                    ),
                }
            }
            if self.groups.len() > 20 {
                println!("  ... and {} more", self.groups.len() - 20);
            }
        }

        if !self.checklist.is_empty() {
            println!("\n--- CHECKLIST ---");
            print!("{}", self.checklist);
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        match self.completeness_pct {
            Some(pct) => format!(
                "{}: {}% complete, {} records inside, {} gaps",
                self.area,
                pct,
                self.records_inside,
                self.gaps.len()
            ),
            None => format!("{}: inactive ({} vertices)", self.area, self.vertices),
        }
    }
}

/// Empreinte stable de l'entrée : blake3 du JSON du polygone et des enregistrements
pub fn fingerprint(polygon: &[Point], records: &[Record]) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"POLYGON");
    hasher.update(&serde_json::to_vec(polygon)?);
    hasher.update(b"RECORDS");
    hasher.update(&serde_json::to_vec(records)?);
    Ok(hex::encode(hasher.finalize().as_bytes()))
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverage::{analyze, File, FileStatus, ScoringConfig, Taxonomy};

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
        ]
    }

    fn records() -> Vec<Record> {
        vec![Record::new("r1", "Municipality / Water / As-Built").with_file(File {
            status: FileStatus::Georeferenced,
            lat: Some(5.0),
            lng: Some(5.0),
            ..Default::default()
        })]
    }

    fn report_for(polygon: &[Point]) -> AnalysisReport {
        let records = records();
        let analysis = analyze(
            polygon,
            &records,
            &Taxonomy::default_catalog(),
            &ScoringConfig::default(),
        );
        AnalysisReport::new("test", polygon, &records, &analysis).unwrap()
    }

    #[test]
    fn test_report_partial() {
        let report = report_for(&square());

        assert_eq!(report.status, AnalysisStatus::Partial);
        assert_eq!(report.completeness_pct, Some(20));
        assert_eq!(report.records_inside, 1);
        assert_eq!(report.categories_present, vec!["Water".to_string()]);
        assert!(report.checklist.contains("- [ ]"));
        assert!(report.summary().contains("20% complete"));
    }

    #[test]
    fn test_report_inactive() {
        let report = report_for(&square()[..2]);

        assert_eq!(report.status, AnalysisStatus::Inactive);
        assert_eq!(report.completeness_pct, None);
        assert!(report.groups.is_empty());
        assert!(report.summary().contains("inactive"));
    }

    #[test]
    fn test_fingerprint_stable() {
        let a = fingerprint(&square(), &records()).unwrap();
        let b = fingerprint(&square(), &records()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let c = fingerprint(&square()[..3], &records()).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_save_to_file() {
        let report = report_for(&square());
        let path = std::env::temp_dir().join(format!(
            "workarea-report-save-{}.json",
            std::process::id()
        ));

        report.save_to_file(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains(r#""status": "Partial""#));
        assert!(content.contains(r#""completeness_pct": 20"#));

        std::fs::remove_file(path).ok();
    }
}
