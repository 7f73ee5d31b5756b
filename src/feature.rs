use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::style::StylePatch;

/// GeoJSON geometry type of a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    Other,
}

/// Coarse grouping used where points and polygons are styled alike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryFamily {
    Point,
    Line,
    Area,
    Other,
}

impl GeometryKind {
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "Point" => GeometryKind::Point,
            "MultiPoint" => GeometryKind::MultiPoint,
            "LineString" => GeometryKind::LineString,
            "MultiLineString" => GeometryKind::MultiLineString,
            "Polygon" => GeometryKind::Polygon,
            "MultiPolygon" => GeometryKind::MultiPolygon,
            _ => GeometryKind::Other,
        }
    }

    pub fn family(self) -> GeometryFamily {
        match self {
            GeometryKind::Point | GeometryKind::MultiPoint => GeometryFamily::Point,
            GeometryKind::LineString | GeometryKind::MultiLineString => GeometryFamily::Line,
            GeometryKind::Polygon | GeometryKind::MultiPolygon => GeometryFamily::Area,
            GeometryKind::Other => GeometryFamily::Other,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

fn feature_type() -> String {
    "Feature".to_string()
}

/// One GeoJSON feature. Geometry coordinates are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub geometry: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Option<Value>, properties: Map<String, Value>) -> Self {
        Self {
            kind: feature_type(),
            id: None,
            geometry,
            properties,
        }
    }

    pub fn with_id(mut self, id: Value) -> Self {
        self.id = Some(id);
        self
    }

    pub fn geometry_kind(&self) -> GeometryKind {
        self.geometry
            .as_ref()
            .and_then(|g| g.get("type"))
            .and_then(|t| t.as_str())
            .map(GeometryKind::from_type_name)
            .unwrap_or(GeometryKind::Other)
    }

    /// Property value, treating an explicit JSON null the same as a missing key.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name).filter(|v| !v.is_null())
    }

    /// Feature id when one is present and meaningful (not null, not empty)
    pub fn feature_id(&self) -> Option<&Value> {
        self.id.as_ref().filter(|id| match id {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
    }
}

fn collection_type() -> String {
    "FeatureCollection".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "collection_type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: collection_type(),
            features,
        }
    }
}

/// Built-in layer definition. Everything needed to register a new map layer.
pub struct LayerDef {
    pub id: &'static str,
    pub name: &'static str,
    pub source_file: &'static str,
    pub style_file: Option<&'static str>,
    pub visible: bool,
    pub base_style: fn() -> StylePatch,
}

fn default_visible() -> bool {
    true
}

/// Runtime layer configuration, either from a built-in `LayerDef` or `layers.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerConfig {
    pub id: String,
    pub name: String,
    #[serde(alias = "filename")]
    pub source_file: String,
    #[serde(default)]
    pub style_file: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub style: StylePatch,
}

impl From<&LayerDef> for LayerConfig {
    fn from(def: &LayerDef) -> Self {
        LayerConfig {
            id: def.id.to_string(),
            name: def.name.to_string(),
            source_file: def.source_file.to_string(),
            style_file: def.style_file.map(String::from),
            visible: def.visible,
            style: (def.base_style)(),
        }
    }
}

impl LayerConfig {
    /// Config for a GeoJSON file found on disk with no registry entry
    pub fn discovered(id: &str, source_file: &str) -> Self {
        LayerConfig {
            id: id.to_string(),
            name: id.to_string(),
            source_file: source_file.to_string(),
            style_file: Some(format!("{}_style.json", id)),
            visible: true,
            style: StylePatch::default(),
        }
    }
}
