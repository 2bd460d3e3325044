// Boundary documents and the join that annotates them with case counts.
//
// A boundary document is either a TopoJSON topology with named object
// collections (`all-states`, `texas-counties`, ...) or a plain GeoJSON
// FeatureCollection, which is treated as a single collection. Geometry is
// carried through untouched; only properties matter here.

use crate::aggregate::ALL_STATES;
use crate::error::{MapError, Result};
use crate::types::{AggregationBucket, CaseStats};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

pub const DEFAULT_JOIN_PROPERTY: &str = "NAME";

/// Collection name used when a GeoJSON document has no names of its own.
const GEOJSON_COLLECTION: &str = "features";

/// One shape record to be colored.
///
/// `stats` is `None` until the joiner finds a region with the same name;
/// that is the "no data" state and is distinct from all-zero counts.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub name: String,
    pub properties: JsonObject,
    pub geometry: Option<Value>,
    pub stats: Option<CaseStats>,
}

impl BoundaryFeature {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: JsonObject::new(),
            geometry: None,
            stats: None,
        }
    }

    pub fn has_data(&self) -> bool {
        self.stats.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BoundaryDocument {
    collections: BTreeMap<String, Vec<BoundaryFeature>>,
}

#[derive(Deserialize)]
struct Topology {
    objects: BTreeMap<String, TopoCollection>,
}

#[derive(Deserialize)]
struct TopoCollection {
    #[serde(default)]
    geometries: Vec<Value>,
}

/// Name of the collection holding the shapes for `region_key`.
pub fn collection_name(region_key: &str) -> String {
    if region_key == ALL_STATES {
        ALL_STATES.to_string()
    } else {
        format!("{}-counties", region_key)
    }
}

impl BoundaryDocument {
    pub fn parse(resource: &str, text: &str, join_property: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| MapError::parse(resource, e))?;
        match value.get("type").and_then(Value::as_str) {
            Some("Topology") => Self::from_topology(resource, value, join_property),
            Some("FeatureCollection") => Self::from_geojson(resource, value, join_property),
            Some(other) => Err(MapError::parse(
                resource,
                format!("unsupported document type '{}'", other),
            )),
            None => Err(MapError::parse(resource, "document has no 'type'")),
        }
    }

    fn from_topology(resource: &str, value: Value, join_property: &str) -> Result<Self> {
        let topology: Topology =
            serde_json::from_value(value).map_err(|e| MapError::parse(resource, e))?;
        let collections = topology
            .objects
            .into_iter()
            .map(|(name, object)| {
                let features = object
                    .geometries
                    .into_iter()
                    .map(|g| topo_feature(g, join_property))
                    .collect();
                (name, features)
            })
            .collect();
        Ok(Self { collections })
    }

    fn from_geojson(resource: &str, value: Value, join_property: &str) -> Result<Self> {
        let collection = match GeoJson::from_json_value(value) {
            Ok(GeoJson::FeatureCollection(fc)) => fc,
            Ok(_) => return Err(MapError::parse(resource, "GeoJSON must be a FeatureCollection")),
            Err(e) => return Err(MapError::parse(resource, e)),
        };
        let features = collection
            .features
            .into_iter()
            .map(|f| geojson_feature(f, join_property))
            .collect();
        let mut collections = BTreeMap::new();
        collections.insert(GEOJSON_COLLECTION.to_string(), features);
        Ok(Self { collections })
    }

    /// Features for `region_key`'s map.
    ///
    /// Falls back to the only collection when the document has exactly one.
    pub fn features_for(&self, region_key: &str) -> Result<&[BoundaryFeature]> {
        let name = collection_name(region_key);
        if let Some(features) = self.collections.get(&name) {
            return Ok(features);
        }
        if self.collections.len() == 1 {
            if let Some(features) = self.collections.values().next() {
                return Ok(features);
            }
        }
        Err(MapError::MissingCollection(name))
    }
}

fn property_name(properties: &JsonObject, join_property: &str) -> String {
    match properties.get(join_property) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn topo_feature(geometry: Value, join_property: &str) -> BoundaryFeature {
    let mut geometry = match geometry {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    };
    let properties = match geometry.remove("properties") {
        Some(Value::Object(props)) => props,
        _ => JsonObject::new(),
    };
    BoundaryFeature {
        name: property_name(&properties, join_property),
        properties,
        geometry: Some(Value::Object(geometry)),
        stats: None,
    }
}

fn geojson_feature(feature: Feature, join_property: &str) -> BoundaryFeature {
    let properties = feature.properties.unwrap_or_default();
    let geometry = feature
        .geometry
        .and_then(|g| serde_json::to_value(g).ok());
    BoundaryFeature {
        name: property_name(&properties, join_property),
        properties,
        geometry,
        stats: None,
    }
}

/// Outcome of a join. Mismatches are expected and render as "no data".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinReport {
    pub matched_features: usize,
    pub unmatched_features: Vec<String>,
    pub unmatched_regions: Vec<String>,
}

/// Copy the counts of `bucket`'s regions onto the features with the same name.
///
/// Names are compared exactly, case included. The returned features are
/// fresh copies; neither `bucket` nor `features` is modified.
pub fn join(bucket: &AggregationBucket, features: &[BoundaryFeature]) -> Vec<BoundaryFeature> {
    join_with_report(bucket, features).0
}

pub fn join_with_report(
    bucket: &AggregationBucket,
    features: &[BoundaryFeature],
) -> (Vec<BoundaryFeature>, JoinReport) {
    let mut annotated: Vec<BoundaryFeature> = features
        .iter()
        .cloned()
        .map(|mut f| {
            f.stats = None;
            f
        })
        .collect();
    let mut unmatched_regions = Vec::new();

    for region in &bucket.regions {
        let mut found = false;
        for feature in annotated.iter_mut().filter(|f| f.name == region.name) {
            feature.stats = Some(region.stats());
            found = true;
        }
        if !found {
            unmatched_regions.push(region.name.clone());
        }
    }

    let unmatched_features: Vec<String> = annotated
        .iter()
        .filter(|f| !f.has_data())
        .map(|f| f.name.clone())
        .collect();
    let report = JoinReport {
        matched_features: annotated.len() - unmatched_features.len(),
        unmatched_features,
        unmatched_regions,
    };
    debug!(
        matched = report.matched_features,
        unmatched_features = report.unmatched_features.len(),
        unmatched_regions = report.unmatched_regions.len(),
        "joined bucket onto boundaries"
    );
    (annotated, report)
}

/// Export annotated features for an external renderer.
///
/// Counts become `confirmed`/`deaths`/`recovered` properties; features
/// without data carry none of them. Topology geometries are arc references
/// and cannot be expressed as GeoJSON, so those features have no geometry.
pub fn to_feature_collection(features: &[BoundaryFeature]) -> FeatureCollection {
    let features = features
        .iter()
        .map(|f| {
            let mut properties = f.properties.clone();
            if let Some(stats) = f.stats {
                properties.insert("confirmed".into(), stats.confirmed.into());
                properties.insert("deaths".into(), stats.deaths.into());
                properties.insert("recovered".into(), stats.recovered.into());
            }
            Feature {
                bbox: None,
                geometry: f
                    .geometry
                    .clone()
                    .and_then(|g| geojson::Geometry::from_json_value(g).ok()),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
