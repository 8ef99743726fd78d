//! Minimal GeoJSON validation for AOI overlays.
//!
//! The map host renders the raw GeoJSON; this module only checks that it is a
//! geometry document and computes the bounds the view should be fitted to.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DashResult, DashboardError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    fn point(lon: f64, lat: f64) -> Self {
        Self { min_lon: lon, min_lat: lat, max_lon: lon, max_lat: lat }
    }

    fn extend(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lon = self.max_lon.max(lon);
        self.max_lat = self.max_lat.max(lat);
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.min_lat + self.max_lat) / 2.0, (self.min_lon + self.max_lon) / 2.0)
    }
}

/// A validated AOI document plus its bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct AoiGeometry {
    pub geojson: Value,
    pub bounds: Bounds,
}

impl AoiGeometry {
    pub fn from_value(value: &Value) -> DashResult<Self> {
        let mut bounds: Option<Bounds> = None;
        walk_object(value, &mut bounds)?;
        let bounds = bounds.ok_or_else(|| DashboardError::Parse("AOI has no coordinates".to_string()))?;
        Ok(Self { geojson: value.clone(), bounds })
    }

    pub fn parse(text: &str) -> DashResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }
}

fn geo_err(msg: impl Into<String>) -> DashboardError {
    DashboardError::Parse(msg.into())
}

fn walk_object(value: &Value, bounds: &mut Option<Bounds>) -> DashResult<()> {
    let ty = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| geo_err("GeoJSON object without type"))?;

    match ty {
        "FeatureCollection" => {
            let features = value
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| geo_err("FeatureCollection without features array"))?;
            for f in features {
                walk_object(f, bounds)?;
            }
            Ok(())
        }
        "Feature" => match value.get("geometry") {
            // null geometry is legal GeoJSON; it just contributes nothing
            Some(Value::Null) | None => Ok(()),
            Some(geom) => walk_object(geom, bounds),
        },
        "GeometryCollection" => {
            let geoms = value
                .get("geometries")
                .and_then(Value::as_array)
                .ok_or_else(|| geo_err("GeometryCollection without geometries array"))?;
            for g in geoms {
                walk_object(g, bounds)?;
            }
            Ok(())
        }
        "Point" | "MultiPoint" | "LineString" | "MultiLineString" | "Polygon" | "MultiPolygon" => {
            let coords = value
                .get("coordinates")
                .ok_or_else(|| geo_err(format!("{} without coordinates", ty)))?;
            let depth = match ty {
                "Point" => 0,
                "MultiPoint" | "LineString" => 1,
                "MultiLineString" | "Polygon" => 2,
                _ => 3,
            };
            walk_coords(coords, depth, bounds)
        }
        other => Err(geo_err(format!("unsupported GeoJSON type {}", other))),
    }
}

/// `depth` is the nesting above a single position.
fn walk_coords(coords: &Value, depth: u8, bounds: &mut Option<Bounds>) -> DashResult<()> {
    let arr = coords
        .as_array()
        .ok_or_else(|| geo_err("coordinates must be arrays"))?;
    if depth > 0 {
        for c in arr {
            walk_coords(c, depth - 1, bounds)?;
        }
        return Ok(());
    }

    let lon = arr.first().and_then(Value::as_f64);
    let lat = arr.get(1).and_then(Value::as_f64);
    match (lon, lat) {
        (Some(lon), Some(lat)) if lon.is_finite() && lat.is_finite() => {
            match bounds {
                Some(b) => b.extend(lon, lat),
                None => *bounds = Some(Bounds::point(lon, lat)),
            }
            Ok(())
        }
        _ => Err(geo_err("position must hold two numbers")),
    }
}
