//! Conversion des entités GeoJSON (export d'un service d'entités)
//!
//! Chaque entité devient un enregistrement portant un fichier
//! géoréférencé unique construit depuis sa géométrie. Les coordonnées
//! GeoJSON sont en [lng, lat].

use std::path::Path;

use anyhow::{Context, Result};
use coverage::{File, FileStatus, GeomType, Point, Priority, Record};
use geo::{CoordsIter, Geometry};
use geojson::{feature::Id, Feature, FeatureCollection, GeoJson};
use serde_json::Value;
use tracing::{debug, warn};

use super::{IngestError, RawRecord};

const ID_KEYS: &[&str] = &["id", "OBJECTID", "objectid", "globalid"];
const PATH_KEYS: &[&str] = &["recordTypePath", "record_type_path", "path"];
const ORG_KEYS: &[&str] = &["orgName", "org_name", "organization", "source"];
const UTILITY_KEYS: &[&str] = &["utilityType", "utility_type"];
const RECORD_TYPE_KEYS: &[&str] = &["recordType", "record_type"];
const NAME_KEYS: &[&str] = &["name", "fileName", "file_name"];

/// Charge un FeatureCollection et le convertit en enregistrements bruts
pub fn load_raw(path: &Path) -> Result<Vec<RawRecord>> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read GeoJSON: {}", path.display()))?;
    parse_raw(&content).with_context(|| format!("Failed to parse GeoJSON: {}", path.display()))
}

/// Parse un document GeoJSON (FeatureCollection ou Feature isolée)
pub fn parse_raw(content: &str) -> Result<Vec<RawRecord>> {
    let geojson: GeoJson = content.parse().context("Invalid GeoJSON")?;

    let features = match geojson {
        GeoJson::FeatureCollection(FeatureCollection { features, .. }) => features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => anyhow::bail!("Expected a Feature or FeatureCollection"),
    };

    debug!(features = features.len(), "Parsed GeoJSON features");

    Ok(features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| RawRecord::Feature {
            index,
            feature: Box::new(feature),
        })
        .collect())
}

/// Convertit une entité en enregistrement canonique
pub fn feature_to_record(index: usize, feature: &Feature) -> Result<Record, IngestError> {
    let id = feature_id(index, feature);

    let geometry = feature
        .geometry
        .clone()
        .ok_or_else(|| IngestError::MissingGeometry {
            feature_id: id.clone(),
        })?;

    let geometry: Geometry<f64> =
        Geometry::try_from(geometry.value).map_err(|e| IngestError::InvalidGeometry {
            feature_id: id.clone(),
            reason: e.to_string(),
        })?;

    let mut file = geometry_to_file(&id, &geometry)?;
    file.id = format!("{}-geometry", id);
    file.name = string_property(feature, NAME_KEYS).unwrap_or_else(|| file.id.clone());

    let org_name = string_property(feature, ORG_KEYS);
    let utility_type = string_property(feature, UTILITY_KEYS);
    let record_type = string_property(feature, RECORD_TYPE_KEYS);

    let record_type_path = string_property(feature, PATH_KEYS).unwrap_or_else(|| {
        [&org_name, &utility_type, &record_type]
            .iter()
            .filter_map(|v| v.as_deref())
            .collect::<Vec<_>>()
            .join(" / ")
    });

    let priority = feature
        .property("priority")
        .and_then(Value::as_u64)
        .and_then(|p| u8::try_from(p).ok())
        .and_then(|p| Priority::try_from(p).ok());

    Ok(Record {
        id,
        record_type_path,
        org_name,
        utility_type,
        record_type,
        priority,
        files: vec![file],
    })
}

/// Fichier géoréférencé depuis une géométrie geo
fn geometry_to_file(feature_id: &str, geometry: &Geometry<f64>) -> Result<File, IngestError> {
    let (geom_type, path) = match geometry {
        Geometry::Point(p) => {
            return Ok(File {
                status: FileStatus::Georeferenced,
                geom_type: Some(GeomType::Point),
                lat: Some(p.y()),
                lng: Some(p.x()),
                ..Default::default()
            })
        }
        Geometry::LineString(ls) => (
            GeomType::LineString,
            ls.coords_iter().map(Point::from).collect::<Vec<_>>(),
        ),
        Geometry::Polygon(poly) => {
            let mut ring: Vec<Point> = poly.exterior().coords_iter().map(Point::from).collect();
            // Fermeture implicite côté moteur
            if ring.len() > 1 && ring.first() == ring.last() {
                ring.pop();
            }
            (GeomType::Polygon, ring)
        }
        other => {
            return Err(IngestError::UnsupportedGeometry {
                feature_id: feature_id.to_string(),
                kind: geometry_kind(other).to_string(),
            })
        }
    };

    Ok(File {
        status: FileStatus::Georeferenced,
        geom_type: Some(geom_type),
        path,
        ..Default::default()
    })
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        _ => "Geometry",
    }
}

fn feature_id(index: usize, feature: &Feature) -> String {
    match &feature.id {
        Some(Id::String(s)) if !s.is_empty() => s.clone(),
        Some(Id::Number(n)) => n.to_string(),
        _ => string_property(feature, ID_KEYS).unwrap_or_else(|| format!("feature-{}", index)),
    }
}

/// Première propriété non vide parmi les alias (texte ou nombre)
fn string_property(feature: &Feature, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match feature.property(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Charge un GeoJSON et résout directement les enregistrements
///
/// Les entités non convertibles sont journalisées et ignorées.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let raw = load_raw(path)?;
    let total = raw.len();
    let records: Vec<Record> = raw
        .into_iter()
        .filter_map(|item| match item.into_record() {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "Skipping feature");
                None
            }
        })
        .collect();

    debug!(total, kept = records.len(), "Converted GeoJSON features");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 42,
                "geometry": {"type": "Point", "coordinates": [5.0, 4.0]},
                "properties": {"organization": "City", "utility_type": "Water", "recordType": "As-Built", "priority": 1}
            },
            {
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[1.0, 1.0], [3.0, 3.0]]},
                "properties": {"recordTypePath": "GasCo / Gas / As-Built", "name": "main.dwg"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 0.0]]]},
                "properties": {"OBJECTID": "poly-1", "path": "City / Storm / As-Built"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "MultiPoint", "coordinates": [[1.0, 1.0], [2.0, 2.0]]},
                "properties": {}
            }
        ]
    }"#;

    fn records() -> Vec<Result<Record, IngestError>> {
        parse_raw(COLLECTION)
            .unwrap()
            .into_iter()
            .map(RawRecord::into_record)
            .collect()
    }

    #[test]
    fn test_point_feature() {
        let records = records();
        let record = records[0].as_ref().unwrap();

        assert_eq!(record.id, "42");
        assert_eq!(record.record_type_path, "City / Water / As-Built");
        assert_eq!(record.priority, Some(Priority::Critical));

        let file = &record.files[0];
        assert!(file.is_georeferenced());
        assert_eq!(file.lat, Some(4.0));
        assert_eq!(file.lng, Some(5.0));
    }

    #[test]
    fn test_linestring_feature() {
        let records = records();
        let record = records[1].as_ref().unwrap();

        assert_eq!(record.id, "feature-1");
        assert_eq!(record.files[0].name, "main.dwg");
        assert_eq!(record.files[0].geom_type, Some(GeomType::LineString));
        assert_eq!(record.files[0].path[1], Point::new(3.0, 3.0));
    }

    #[test]
    fn test_polygon_feature_drops_closing_point() {
        let records = records();
        let record = records[2].as_ref().unwrap();

        assert_eq!(record.id, "poly-1");
        assert_eq!(record.record_type_path, "City / Storm / As-Built");
        assert_eq!(record.files[0].path.len(), 3);
    }

    #[test]
    fn test_unsupported_geometry() {
        let records = records();
        assert!(matches!(
            records[3],
            Err(IngestError::UnsupportedGeometry { ref kind, .. }) if kind == "MultiPoint"
        ));
    }

    #[test]
    fn test_bare_geometry_rejected() {
        assert!(parse_raw(r#"{"type":"Point","coordinates":[1.0,2.0]}"#).is_err());
    }
}
