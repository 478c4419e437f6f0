//! Types de données pour le crate coverage
//!
//! Objets valeur possédés par l'appelant. Le moteur les emprunte le temps
//! d'une analyse et retourne des résultats indépendants.

use geo::Coord;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::taxonomy::Priority;

/// Coordonnée WGS84 (degrés)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    #[serde(alias = "lon")]
    pub lng: f64,
}

impl Point {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Coordonnées finies et dans les bornes lat/lng
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

// x = lng, y = lat, comme dans l'écosystème geo
impl From<Point> for Coord {
    fn from(p: Point) -> Self {
        Coord { x: p.lng, y: p.lat }
    }
}

impl From<Coord> for Point {
    fn from(c: Coord) -> Self {
        Point { lat: c.y, lng: c.x }
    }
}

/// Type de géométrie déclaré pour un fichier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeomType {
    Point,
    LineString,
    Polygon,
}

/// Statut de géoréférencement d'un fichier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    #[serde(rename = "Georeferenced", alias = "georeferenced")]
    Georeferenced,
    #[default]
    #[serde(rename = "Not Georeferenced", alias = "NotGeoreferenced")]
    NotGeoreferenced,
}

/// Géométrie d'un fichier ou d'un enregistrement
#[derive(Debug, Clone, PartialEq)]
pub enum GeoFeature {
    Point(Point),
    /// Au moins 2 points
    LineString(Vec<Point>),
    /// Au moins 3 points, fermeture implicite
    Polygon(Vec<Point>),
}

impl GeoFeature {
    /// Point représentatif utilisé pour le test d'inclusion
    pub fn centroid(&self) -> Point {
        match self {
            GeoFeature::Point(p) => *p,
            GeoFeature::LineString(points) | GeoFeature::Polygon(points) => {
                crate::geometry::centroid(points)
            }
        }
    }
}

/// Fichier rattaché à un enregistrement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub status: FileStatus,

    #[serde(default, alias = "geom_type")]
    pub geom_type: Option<GeomType>,

    #[serde(default)]
    pub lat: Option<f64>,

    #[serde(default, alias = "lon")]
    pub lng: Option<f64>,

    /// Sommets de la géométrie (ligne ou polygone)
    #[serde(default)]
    pub path: Vec<Point>,
}

impl File {
    pub fn is_georeferenced(&self) -> bool {
        self.status == FileStatus::Georeferenced
    }

    /// Coordonnée explicite, si lat et lng sont présentes et valides
    pub fn explicit_point(&self) -> Option<Point> {
        let p = Point::new(self.lat?, self.lng?);
        p.is_valid().then_some(p)
    }

    /// Résout les champs du fichier en géométrie typée
    ///
    /// Un chemin d'un seul sommet donne un point; un chemin non typé de 2
    /// sommets ou plus donne une ligne.
    pub fn geometry(&self) -> Option<GeoFeature> {
        match (self.geom_type, self.path.len()) {
            (_, 0) => self.explicit_point().map(GeoFeature::Point),
            (Some(GeomType::Point), _) => self
                .explicit_point()
                .or_else(|| Some(crate::geometry::centroid(&self.path)))
                .map(GeoFeature::Point),
            (_, 1) => Some(GeoFeature::Point(self.path[0])),
            (Some(GeomType::Polygon), n) if n >= 3 => Some(GeoFeature::Polygon(self.path.clone())),
            _ => Some(GeoFeature::LineString(self.path.clone())),
        }
    }
}

/// Enregistrement téléversé ou indexé (as-built, locate, permis...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default)]
    pub id: String,

    /// Chemin libre, typiquement "owner / domain / type"
    #[serde(default, alias = "record_type_path", alias = "path")]
    pub record_type_path: String,

    #[serde(default, alias = "org_name", alias = "organization", alias = "source")]
    pub org_name: Option<String>,

    /// Type de réseau normalisé, s'il est connu à l'ingestion
    #[serde(default, alias = "utility_type")]
    pub utility_type: Option<String>,

    /// Type d'enregistrement normalisé, s'il est connu à l'ingestion
    #[serde(default, alias = "record_type")]
    pub record_type: Option<String>,

    /// Hors 1..=3 ou non entier : `None`
    #[serde(default, deserialize_with = "priority_or_none")]
    pub priority: Option<Priority>,

    /// Absent, `null` ou non-tableau : liste vide. Les éléments invalides
    /// sont ignorés un par un.
    #[serde(default, deserialize_with = "files_or_empty")]
    pub files: Vec<File>,
}

impl Record {
    pub fn new(id: impl Into<String>, record_type_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            record_type_path: record_type_path.into(),
            ..Default::default()
        }
    }

    pub fn with_file(mut self, file: File) -> Self {
        self.files.push(file);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FileEntry {
    Valid(File),
    Invalid(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FilesField {
    List(Vec<FileEntry>),
    Other(IgnoredAny),
}

fn files_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<File>, D::Error> {
    let entries = match FilesField::deserialize(deserializer)? {
        FilesField::List(entries) => entries,
        FilesField::Other(_) => return Ok(Vec::new()),
    };

    Ok(entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match entry {
            FileEntry::Valid(file) => Some(file),
            FileEntry::Invalid(_) => {
                warn!(index, "Skipping malformed file entry");
                None
            }
        })
        .collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriorityField {
    Valid(Priority),
    Other(IgnoredAny),
}

fn priority_or_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Priority>, D::Error> {
    Ok(match Option::<PriorityField>::deserialize(deserializer)? {
        Some(PriorityField::Valid(priority)) => Some(priority),
        Some(PriorityField::Other(_)) => {
            warn!("Ignoring invalid record priority");
            None
        }
        None => None,
    })
}
