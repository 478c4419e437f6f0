//! Filtrage des enregistrements situés dans la zone de travail
//!
//! Un enregistrement est retenu si AU MOINS UN de ses fichiers géoréférencés
//! a un centroïde dans le polygone.

use geo::Rect;
use tracing::{debug, trace};

use crate::geometry::{
    bounding_rect, planar_area_sq_meters, point_in_polygon, rect_contains,
    MIN_POLYGON_POINTS,
};
use crate::types::{File, Point, Record};

/// Polygone de zone de travail actif (au moins 3 sommets)
#[derive(Debug, Clone, Copy)]
pub struct WorkArea<'a> {
    polygon: &'a [Point],
    bbox: Rect,
}

impl<'a> WorkArea<'a> {
    /// `None` si le polygone a moins de 3 sommets : analyse inactive
    pub fn new(polygon: &'a [Point]) -> Option<Self> {
        if polygon.len() < MIN_POLYGON_POINTS {
            return None;
        }
        let bbox = bounding_rect(polygon)?;
        Some(Self { polygon, bbox })
    }

    pub fn polygon(&self) -> &'a [Point] {
        self.polygon
    }

    pub fn area_sq_meters(&self) -> f64 {
        planar_area_sq_meters(self.polygon)
    }

    pub fn contains(&self, point: Point) -> bool {
        rect_contains(&self.bbox, point) && point_in_polygon(point, self.polygon)
    }

    pub fn contains_record(&self, record: &Record) -> bool {
        record
            .files
            .iter()
            .filter_map(file_centroid)
            .any(|p| self.contains(p))
    }

    /// Sous-ensemble des enregistrements présents, dans l'ordre d'entrée
    pub fn filter<'r>(&self, records: &'r [Record]) -> Vec<&'r Record> {
        let inside: Vec<&Record> = records
            .iter()
            .filter(|record| {
                let hit = self.contains_record(record);
                trace!(record_id = %record.id, inside = hit, "Containment test");
                hit
            })
            .collect();

        debug!(
            scanned = records.len(),
            inside = inside.len(),
            "Filtered records by work area"
        );
        inside
    }
}

/// Centroïde candidat d'un fichier pour le test d'inclusion
///
/// Seuls les fichiers géoréférencés comptent. Les coordonnées explicites
/// priment, quel que soit le type déclaré; à défaut, centroïde de la
/// géométrie résolue par `File::geometry`.
pub fn file_centroid(file: &File) -> Option<Point> {
    if !file.is_georeferenced() {
        return None;
    }

    file.explicit_point()
        .or_else(|| file.geometry().map(|geometry| geometry.centroid()))
}

/// Enregistrements ayant au moins un fichier dans le polygone
///
/// Vide si le polygone a moins de 3 sommets; l'appelant doit alors traiter
/// l'analyse comme inactive et non comme une couverture nulle.
pub fn records_inside<'r>(polygon: &[Point], records: &'r [Record]) -> Vec<&'r Record> {
    match WorkArea::new(polygon) {
        Some(area) => area.filter(records),
        None => Vec::new(),
    }
}
