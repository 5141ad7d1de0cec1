//! GeoJSON boundaries and zones

use crate::error::{Error, Result};
use crate::vector::{Boundary, Zone};
use geo::{Geometry, MultiPolygon};
use geojson::{FeatureCollection, GeoJson};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn read_collection(geojson: GeoJson) -> Result<FeatureCollection> {
    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        GeoJson::Feature(f) => Ok(FeatureCollection {
            bbox: None,
            features: vec![f],
            foreign_members: None,
        }),
        GeoJson::Geometry(g) => Ok(FeatureCollection {
            bbox: None,
            features: vec![geojson::Feature {
                geometry: Some(g),
                ..Default::default()
            }],
            foreign_members: None,
        }),
    }
}

fn open_geojson(path: &Path) -> Result<GeoJson> {
    let reader = BufReader::new(File::open(path)?);
    GeoJson::from_reader(reader).map_err(|e| Error::GeoJson(e.to_string()))
}

/// Polygonal part of a GeoJSON geometry; other geometry kinds yield `None`.
fn to_multipolygon(geometry: geojson::Geometry) -> Result<Option<MultiPolygon<f64>>> {
    let geometry: Geometry<f64> = geometry
        .value
        .try_into()
        .map_err(|e: geojson::Error| Error::GeoJson(e.to_string()))?;
    Ok(match geometry {
        Geometry::MultiPolygon(mp) => Some(mp),
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p])),
        Geometry::GeometryCollection(gc) => {
            let polygons: Vec<_> = gc
                .into_iter()
                .filter_map(|g| match g {
                    Geometry::Polygon(p) => Some(vec![p]),
                    Geometry::MultiPolygon(mp) => Some(mp.0),
                    _ => None,
                })
                .flatten()
                .collect();
            (!polygons.is_empty()).then(|| MultiPolygon::new(polygons))
        }
        _ => None,
    })
}

/// Read a country boundary; every polygonal feature is merged into one
/// multipolygon.
pub fn read_boundary<P: AsRef<Path>>(path: P) -> Result<Boundary> {
    let collection = read_collection(open_geojson(path.as_ref())?)?;
    let mut polygons = Vec::new();
    for feature in collection.features {
        if let Some(geometry) = feature.geometry {
            if let Some(mp) = to_multipolygon(geometry)? {
                polygons.extend(mp.0);
            }
        }
    }
    Boundary::new(MultiPolygon::new(polygons)).ok_or_else(|| {
        Error::EmptyInput(format!(
            "no polygon in boundary file {}",
            path.as_ref().display()
        ))
    })
}

/// Read zones from a GeoJSON file, taking ids from `id_property`.
pub fn read_zones<P: AsRef<Path>>(path: P, id_property: &str) -> Result<Vec<Zone>> {
    zones_from_geojson(open_geojson(path.as_ref())?, id_property)
}

/// Read zones from GeoJSON text.
pub fn read_zones_from_str(text: &str, id_property: &str) -> Result<Vec<Zone>> {
    let geojson: GeoJson = text.parse()?;
    zones_from_geojson(geojson, id_property)
}

fn zones_from_geojson(geojson: GeoJson, id_property: &str) -> Result<Vec<Zone>> {
    let collection = read_collection(geojson)?;
    let mut zones = Vec::with_capacity(collection.features.len());
    let mut skipped = 0usize;

    for feature in collection.features {
        let id = match feature.property(id_property) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                skipped += 1;
                continue;
            }
        };
        let geometry = match feature.geometry {
            Some(g) => to_multipolygon(g)?,
            None => None,
        };
        match geometry.and_then(|mp| Zone::new(id.clone(), mp)) {
            Some(zone) => zones.push(zone),
            None => {
                tracing::warn!("zone {} has no polygon geometry, skipped", id);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        tracing::debug!("skipped {} features without id '{}' or polygon", skipped, id_property);
    }
    Ok(zones)
}
