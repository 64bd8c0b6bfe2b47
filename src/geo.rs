//! Line segments for the road map.
//!
//! Only rows with all four endpoint coordinates are drawn; the rest are silently left
//! off. The map is centred on the mean start coordinate.

use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use crate::dataset::Dataset;
use crate::util::average;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSegment {
    pub village: Option<String>,
    pub segment_name: Option<String>,
    pub surface_type: Option<String>,
    pub total_length: Option<f64>,
    pub start: (f64, f64),
    pub end: (f64, f64),
}

impl MapSegment {
    /// Route link between the two endpoints.
    pub fn directions_url(&self) -> String {
        format!(
            "https://www.google.com/maps/dir/{},{}/{},{}",
            self.start.0, self.start.1, self.end.0, self.end.1
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    /// `(lat, lon)`
    pub center: (f64, f64),
    pub segments: Vec<MapSegment>,
}

/// `None` when no row has complete coordinates.
pub fn map_view(dataset: &Dataset) -> Option<MapView> {
    let segments: Vec<MapSegment> = dataset
        .rows()
        .iter()
        .filter_map(|r| {
            let (start, end) = r.endpoints()?;
            Some(MapSegment {
                village: r.village.clone(),
                segment_name: r.segment_name.clone(),
                surface_type: r.surface_type.clone(),
                total_length: r.total_length,
                start,
                end,
            })
        })
        .collect();
    if segments.is_empty() {
        return None;
    }
    let lats: Vec<f64> = segments.iter().map(|s| s.start.0).collect();
    let lons: Vec<f64> = segments.iter().map(|s| s.start.1).collect();
    Some(MapView {
        center: (average(&lats), average(&lons)),
        segments,
    })
}

impl MapView {
    /// GeoJSON `FeatureCollection`; coordinates are written lon-first.
    pub fn to_geojson(&self) -> JsonValue {
        let features: Vec<JsonValue> = self
            .segments
            .iter()
            .map(|s| {
                json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[s.start.1, s.start.0], [s.end.1, s.end.0]],
                    },
                    "properties": {
                        "village": s.village,
                        "segment_name": s.segment_name,
                        "surface_type": s.surface_type,
                        "total_length": s.total_length,
                        "directions": s.directions_url(),
                    },
                })
            })
            .collect();
        json!({
            "type": "FeatureCollection",
            "features": features,
        })
    }
}
