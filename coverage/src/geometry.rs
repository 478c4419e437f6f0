//! Utilitaires géométriques planaires
//!
//! Les coordonnées sont traitées en (lng, lat) = (x, y). Aucun calcul
//! géodésique : l'approximation planaire suffit pour des zones de travail
//! de quelques kilomètres.

use geo::{BoundingRect, Coord, LineString, Rect};

use crate::types::Point;

/// Mètres par degré, appliqué sur les deux axes
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Nombre minimal de sommets pour un polygone actif
pub const MIN_POLYGON_POINTS: usize = 3;

/// Moyenne arithmétique des sommets
///
/// Retourne `{0, 0}` pour une entrée vide : ce point n'est pas une vraie
/// position et ne doit pas être testé.
pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::default();
    }

    let n = points.len() as f64;
    let (lat, lng) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));

    Point::new(lat / n, lng / n)
}

/// Test d'inclusion par lancer de rayon (règle pair-impair)
///
/// Le comportement sur la frontière exacte est celui du lancer de rayon,
/// sans cas particulier. Le sens de parcours du polygone est indifférent.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < MIN_POLYGON_POINTS {
        return false;
    }

    let (x, y) = (point.lng, point.lat);
    let mut inside = false;
    let mut j = polygon.len() - 1;

    for i in 0..polygon.len() {
        // Arête orientée du bas vers le haut, pour un calcul identique
        // quel que soit le sens du polygone
        let (a, b) = if polygon[i].lat <= polygon[j].lat {
            (polygon[i], polygon[j])
        } else {
            (polygon[j], polygon[i])
        };

        if (a.lat > y) != (b.lat > y) {
            let x_cross = (b.lng - a.lng) * (y - a.lat) / (b.lat - a.lat) + a.lng;
            if x < x_cross {
                inside = !inside;
            }
        }

        j = i;
    }

    inside
}

/// Aire planaire approchée en m² (formule du lacet)
///
/// Valeur absolue de l'aire signée, mise à l'échelle par
/// [`METERS_PER_DEGREE`] sur les deux axes. Non géodésique.
pub fn planar_area_sq_meters(polygon: &[Point]) -> f64 {
    signed_planar_area_sq_meters(polygon).abs()
}

/// Aire signée : positive pour un polygone anti-horaire en (lng, lat)
pub fn signed_planar_area_sq_meters(polygon: &[Point]) -> f64 {
    if polygon.len() < MIN_POLYGON_POINTS {
        return 0.0;
    }

    let mut twice_area = 0.0;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        twice_area += polygon[j].lng * polygon[i].lat - polygon[i].lng * polygon[j].lat;
        j = i;
    }

    twice_area / 2.0 * METERS_PER_DEGREE * METERS_PER_DEGREE
}

/// Rectangle englobant du polygone, pour écarter rapidement les points
pub fn bounding_rect(polygon: &[Point]) -> Option<Rect> {
    let ring: LineString = polygon.iter().map(|&p| Coord::from(p)).collect();
    ring.bounding_rect()
}

/// Le point est-il dans le rectangle (bords inclus)
pub fn rect_contains(rect: &Rect, point: Point) -> bool {
    let (min, max) = (rect.min(), rect.max());
    point.lng >= min.x && point.lng <= max.x && point.lat >= min.y && point.lat <= max.y
}
