//! TopoJSON decoding into GeoJSON features.
//!
//! Only what the boundary layer needs: arc decoding, ring stitching and
//! conversion of polygonal objects. Lines and points convert too but are
//! dropped later when regions are extracted, as are null geometries.

use std::collections::BTreeMap;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Deserialize;

use crate::error::LoadError;

#[derive(Debug, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub transform: Option<Transform>,
    pub objects: BTreeMap<String, TopoObject>,
    pub arcs: Vec<Vec<Vec<f64>>>,
}

/// Quantization transform
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

/// A geometry slot. `"type": null` is a feature with no geometry.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TopoObject {
    Geometry(TopoGeometry),
    Null {
        #[serde(rename = "type")]
        _kind: (),
        #[serde(default)]
        properties: Option<JsonObject>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum TopoGeometry {
    GeometryCollection {
        geometries: Vec<TopoObject>,
        #[serde(default)]
        properties: Option<JsonObject>,
    },
    Polygon {
        arcs: Vec<Vec<i64>>,
        #[serde(default)]
        properties: Option<JsonObject>,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
        #[serde(default)]
        properties: Option<JsonObject>,
    },
    LineString {
        arcs: Vec<i64>,
        #[serde(default)]
        properties: Option<JsonObject>,
    },
    MultiLineString {
        arcs: Vec<Vec<i64>>,
        #[serde(default)]
        properties: Option<JsonObject>,
    },
    Point {
        coordinates: Vec<f64>,
        #[serde(default)]
        properties: Option<JsonObject>,
    },
    MultiPoint {
        coordinates: Vec<Vec<f64>>,
        #[serde(default)]
        properties: Option<JsonObject>,
    },
}

type Position = Vec<f64>;

impl Topology {
    /// Parse a TopoJSON document
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        // simd-json parses in place, so work on a scratch copy
        let mut scratch = bytes.to_vec();
        Ok(simd_json::serde::from_slice(&mut scratch)?)
    }

    /// Convert the named object into a feature collection, one feature per
    /// member geometry (a lone geometry becomes a single feature).
    pub fn feature_collection(&self, object: &str) -> Result<FeatureCollection, LoadError> {
        let root = self
            .objects
            .get(object)
            .ok_or_else(|| LoadError::MissingObject(object.to_string()))?;

        let arcs = self.decode_arcs();
        let features = match root {
            TopoObject::Geometry(TopoGeometry::GeometryCollection { geometries, .. }) => geometries
                .iter()
                .map(|g| to_feature(g, &arcs, self.transform))
                .collect::<Result<Vec<_>, _>>()?,
            single => vec![to_feature(single, &arcs, self.transform)?],
        };

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }

    /// Absolute lon/lat positions for every arc
    fn decode_arcs(&self) -> Vec<Vec<Position>> {
        self.arcs
            .iter()
            .map(|arc| match self.transform {
                Some(t) => {
                    let (mut x, mut y) = (0.0, 0.0);
                    arc.iter()
                        .filter(|p| p.len() >= 2)
                        .map(|p| {
                            x += p[0];
                            y += p[1];
                            vec![x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]]
                        })
                        .collect()
                }
                None => arc
                    .iter()
                    .filter(|p| p.len() >= 2)
                    .map(|p| vec![p[0], p[1]])
                    .collect(),
            })
            .collect()
    }
}

fn to_feature(
    object: &TopoObject,
    arcs: &[Vec<Position>],
    transform: Option<Transform>,
) -> Result<Feature, LoadError> {
    let geometry = match object {
        TopoObject::Geometry(geometry) => geometry,
        TopoObject::Null { properties, .. } => {
            return Ok(Feature {
                bbox: None,
                geometry: None,
                id: None,
                properties: properties.clone(),
                foreign_members: None,
            });
        }
    };
    let properties = match geometry {
        TopoGeometry::GeometryCollection { properties, .. }
        | TopoGeometry::Polygon { properties, .. }
        | TopoGeometry::MultiPolygon { properties, .. }
        | TopoGeometry::LineString { properties, .. }
        | TopoGeometry::MultiLineString { properties, .. }
        | TopoGeometry::Point { properties, .. }
        | TopoGeometry::MultiPoint { properties, .. } => properties.clone(),
    };

    Ok(Feature {
        bbox: None,
        geometry: Some(Geometry::new(to_value(geometry, arcs, transform)?)),
        id: None,
        properties,
        foreign_members: None,
    })
}

fn to_value(
    geometry: &TopoGeometry,
    arcs: &[Vec<Position>],
    transform: Option<Transform>,
) -> Result<Value, LoadError> {
    Ok(match geometry {
        TopoGeometry::GeometryCollection { geometries, .. } => Value::GeometryCollection(
            geometries
                .iter()
                .filter_map(|g| match g {
                    TopoObject::Geometry(g) => Some(to_value(g, arcs, transform).map(Geometry::new)),
                    TopoObject::Null { .. } => None,
                })
                .collect::<Result<_, _>>()?,
        ),
        TopoGeometry::Polygon { arcs: rings, .. } => Value::Polygon(polygon(rings, arcs)?),
        TopoGeometry::MultiPolygon { arcs: polygons, .. } => Value::MultiPolygon(
            polygons
                .iter()
                .map(|rings| polygon(rings, arcs))
                .collect::<Result<_, _>>()?,
        ),
        TopoGeometry::LineString { arcs: line, .. } => Value::LineString(stitch(line, arcs)?),
        TopoGeometry::MultiLineString { arcs: lines, .. } => Value::MultiLineString(
            lines
                .iter()
                .map(|line| stitch(line, arcs))
                .collect::<Result<_, _>>()?,
        ),
        TopoGeometry::Point { coordinates, .. } => Value::Point(point(coordinates, transform)),
        TopoGeometry::MultiPoint { coordinates, .. } => Value::MultiPoint(
            coordinates.iter().map(|c| point(c, transform)).collect(),
        ),
    })
}

fn polygon(rings: &[Vec<i64>], arcs: &[Vec<Position>]) -> Result<Vec<Vec<Position>>, LoadError> {
    rings.iter().map(|ring| stitch(ring, arcs)).collect()
}

/// Join arcs end to end. Consecutive arcs share an endpoint, so each new
/// arc replaces the last point already collected. `!i` for negative `i`
/// means arc `!i` traversed backwards.
fn stitch(indices: &[i64], arcs: &[Vec<Position>]) -> Result<Vec<Position>, LoadError> {
    let mut points: Vec<Position> = Vec::new();

    for &index in indices {
        let (arc_idx, reversed) = if index < 0 { (!index, true) } else { (index, false) };
        let arc = usize::try_from(arc_idx)
            .ok()
            .and_then(|i| arcs.get(i))
            .ok_or(LoadError::ArcIndex {
                index,
                count: arcs.len(),
            })?;

        points.pop();
        if reversed {
            points.extend(arc.iter().rev().cloned());
        } else {
            points.extend(arc.iter().cloned());
        }
    }

    Ok(points)
}

fn point(coordinates: &[f64], transform: Option<Transform>) -> Position {
    match (transform, coordinates) {
        (Some(t), [x, y, ..]) => vec![x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]],
        _ => coordinates.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two squares sharing the edge x=1: arc 0 is the shared edge,
    // arc 1 the left square's outer edge, arc 2 the right square's.
    const UNQUANTIZED: &str = r#"{
        "type": "Topology",
        "objects": {
            "states": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "arcs": [[0, 1]], "properties": {"name": "West"}},
                    {"type": "Polygon", "arcs": [[-1, 2]], "properties": {"name": "East"}}
                ]
            }
        },
        "arcs": [
            [[1, 0], [1, 1]],
            [[1, 1], [0, 1], [0, 0], [1, 0]],
            [[1, 0], [2, 0], [2, 1], [1, 1]]
        ]
    }"#;

    fn rings(feature: &Feature) -> Vec<Vec<Position>> {
        match &feature.geometry.as_ref().unwrap().value {
            Value::Polygon(rings) => rings.clone(),
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn test_stitch_shares_endpoints() {
        let topo = Topology::from_slice(UNQUANTIZED.as_bytes()).unwrap();
        let fc = topo.feature_collection("states").unwrap();
        assert_eq!(fc.features.len(), 2);

        let west = rings(&fc.features[0]);
        assert_eq!(
            west[0],
            vec![vec![1.0, 0.0], vec![1.0, 1.0], vec![0.0, 1.0], vec![0.0, 0.0], vec![1.0, 0.0]]
        );
        assert_eq!(
            fc.features[0].property("name").and_then(|v| v.as_str()),
            Some("West")
        );
    }

    #[test]
    fn test_negative_index_reverses_arc() {
        let topo = Topology::from_slice(UNQUANTIZED.as_bytes()).unwrap();
        let fc = topo.feature_collection("states").unwrap();
        let east = rings(&fc.features[1]);
        assert_eq!(east[0][0], vec![1.0, 1.0]);
        assert_eq!(east[0][1], vec![1.0, 0.0]);
        assert_eq!(east[0].len(), 5);
        assert_eq!(east[0].first(), east[0].last());
    }

    #[test]
    fn test_quantized_arcs_are_delta_decoded() {
        let json = r#"{
            "type": "Topology",
            "transform": {"scale": [0.5, 0.25], "translate": [-100, 30]},
            "objects": {"line": {"type": "LineString", "arcs": [0]}},
            "arcs": [[[0, 0], [2, 4], [2, -4]]]
        }"#;
        let topo = Topology::from_slice(json.as_bytes()).unwrap();
        let fc = topo.feature_collection("line").unwrap();
        match &fc.features[0].geometry.as_ref().unwrap().value {
            Value::LineString(points) => assert_eq!(
                points,
                &vec![vec![-100.0, 30.0], vec![-99.0, 31.0], vec![-98.0, 30.0]]
            ),
            other => panic!("expected line, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_object() {
        let topo = Topology::from_slice(UNQUANTIZED.as_bytes()).unwrap();
        assert!(matches!(
            topo.feature_collection("counties"),
            Err(LoadError::MissingObject(name)) if name == "counties"
        ));
    }

    #[test]
    fn test_bad_arc_index() {
        let json = r#"{
            "type": "Topology",
            "objects": {"states": {"type": "Polygon", "arcs": [[5]]}},
            "arcs": [[[0, 0], [1, 1]]]
        }"#;
        let topo = Topology::from_slice(json.as_bytes()).unwrap();
        assert!(matches!(
            topo.feature_collection("states"),
            Err(LoadError::ArcIndex { index: 5, count: 1 })
        ));
    }

    #[test]
    fn test_null_geometry_becomes_empty_feature() {
        let json = r#"{
            "type": "Topology",
            "objects": {"states": {"type": "GeometryCollection", "geometries": [
                {"type": "Polygon", "arcs": [[0]], "properties": {"name": "Square"}},
                {"type": null, "properties": {"name": "Nowhere"}},
                {"type": "GeometryCollection", "geometries": [{"type": null}]}
            ]}},
            "arcs": [[[0, 0], [1, 0], [1, 1], [0, 0]]]
        }"#;
        let topo = Topology::from_slice(json.as_bytes()).unwrap();
        let fc = topo.feature_collection("states").unwrap();
        assert_eq!(fc.features.len(), 3);
        assert!(fc.features[0].geometry.is_some());
        assert!(fc.features[1].geometry.is_none());
        assert_eq!(
            fc.features[1].property("name").and_then(|v| v.as_str()),
            Some("Nowhere")
        );
        match &fc.features[2].geometry.as_ref().unwrap().value {
            Value::GeometryCollection(members) => assert!(members.is_empty()),
            other => panic!("expected collection, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_geometry_type_fails() {
        let json = r#"{
            "type": "Topology",
            "objects": {"states": {"type": "Sphere"}},
            "arcs": []
        }"#;
        assert!(Topology::from_slice(json.as_bytes()).is_err());
    }
}
