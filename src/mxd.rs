//! Per-layer style sidecars (`<layer>_style.json`) exported from the
//! original map document.
//!
//! A sidecar may carry:
//! - `default_style`: merged over the layer's built-in style
//! - `thematic` / `type: "thematic"` with `thematic_property` (or `property`)
//!   and `property_styles`: value-driven overrides, either `range` (min
//!   inclusive, max exclusive) or `categorical` (keyed by value text)
//! - `render_properties`: extra render settings that never touch colors
//! - `labels`: label fields and font styling

use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::feature::Feature;
use crate::style::StylePatch;
use crate::util::{parse_number, value_to_display};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RangeStyle {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub style: Option<StylePatch>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PropertyStyle {
    Range {
        #[serde(default)]
        ranges: Vec<RangeStyle>,
    },
    Categorical {
        #[serde(default)]
        field: Option<String>,
        #[serde(default)]
        values: BTreeMap<String, StylePatch>,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelStyle {
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub halo_color: Option<String>,
    #[serde(default)]
    pub halo_width: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MxdStyle {
    #[serde(default, rename = "type")]
    pub style_type: Option<String>,
    #[serde(default)]
    pub default_style: Option<StylePatch>,
    #[serde(default)]
    pub thematic: bool,
    #[serde(default)]
    pub thematic_property: Option<String>,
    #[serde(default)]
    pub property: Option<String>,
    #[serde(default)]
    pub property_styles: BTreeMap<String, PropertyStyle>,
    #[serde(default)]
    pub render_properties: Map<String, Value>,
    #[serde(default)]
    pub labels: Option<LabelStyle>,
    #[serde(default)]
    pub layer_name: Option<String>,
}

impl MxdStyle {
    pub fn is_thematic(&self) -> bool {
        self.thematic || self.style_type.as_deref() == Some("thematic")
    }

    /// Property driving the sidecar's own thematic styling
    pub fn thematic_key(&self) -> Option<&str> {
        self.thematic_property.as_deref().or(self.property.as_deref())
    }

    /// Value-driven override for one feature, if the sidecar defines one.
    ///
    /// Only the entry for the thematic property is consulted when it has one;
    /// otherwise every property style is tried in key order and the last
    /// match wins.
    pub fn property_patch(&self, feature: &Feature) -> Option<StylePatch> {
        if !self.is_thematic() {
            return None;
        }

        let keyed: Vec<(&String, &PropertyStyle)> = match self.thematic_key() {
            Some(key) if self.property_styles.contains_key(key) => {
                self.property_styles.get_key_value(key).into_iter().collect()
            }
            _ => self.property_styles.iter().collect(),
        };

        let mut patch: Option<StylePatch> = None;
        for (key, style) in keyed {
            let found = match style {
                PropertyStyle::Range { ranges } => {
                    let Some(v) = feature.property(key).and_then(parse_number) else {
                        continue;
                    };
                    ranges
                        .iter()
                        .find(|r| v >= r.min && v < r.max && r.style.is_some())
                        .and_then(|r| r.style.clone())
                }
                PropertyStyle::Categorical { field, values } => {
                    let field = field.as_deref().unwrap_or(key.as_str());
                    feature
                        .property(field)
                        .map(value_to_display)
                        .and_then(|text| values.get(&text).cloned())
                }
                PropertyStyle::Unsupported => None,
            };
            if let Some(found) = found {
                debug!("Sidecar property style matched on {}", key);
                patch = Some(found);
            }
        }
        patch
    }

    /// `render_properties` as a patch; colors are never taken from here.
    pub fn render_patch(&self) -> Option<StylePatch> {
        if self.render_properties.is_empty() {
            return None;
        }
        let patch = StylePatch::from_render_properties(&self.render_properties);
        (!patch.is_empty()).then_some(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(props: Value) -> Feature {
        Feature::new(None, props.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn test_range_sidecar() {
        let sidecar: MxdStyle = serde_json::from_value(json!({
            "thematic": true,
            "thematic_property": "power",
            "default_style": {"fillColor": "#CCCCCC"},
            "property_styles": {
                "power": {
                    "type": "range",
                    "ranges": [
                        {"min": 0, "max": 50, "style": {"fillColor": "#00ff00"}},
                        {"min": 50, "max": 100, "style": {"fillColor": "#ff0000", "weight": 2}}
                    ]
                }
            }
        }))
        .unwrap();

        let low = sidecar.property_patch(&feature(json!({"power": 10}))).unwrap();
        assert_eq!(low.fill_color.as_deref(), Some("#00ff00"));

        let edge = sidecar.property_patch(&feature(json!({"power": "50"}))).unwrap();
        assert_eq!(edge.fill_color.as_deref(), Some("#ff0000"));
        assert_eq!(edge.weight, Some(2.0));

        // Max is exclusive on every range
        assert!(sidecar.property_patch(&feature(json!({"power": 100}))).is_none());
        assert!(sidecar.property_patch(&feature(json!({"power": "x"}))).is_none());
    }

    #[test]
    fn test_non_thematic_sidecar_has_no_property_patch() {
        let sidecar: MxdStyle = serde_json::from_value(json!({
            "property_styles": {
                "power": {"type": "range", "ranges": [{"min": 0, "max": 100, "style": {"color": "#fff"}}]}
            }
        }))
        .unwrap();
        assert!(sidecar.property_patch(&feature(json!({"power": 10}))).is_none());
    }

    #[test]
    fn test_categorical_sidecar_by_type() {
        let sidecar: MxdStyle = serde_json::from_value(json!({
            "type": "thematic",
            "property": "power",
            "property_styles": {
                "color": {
                    "type": "categorical",
                    "field": "color",
                    "values": {"#1a9641": {"fillColor": "#1a9641", "weight": 1}}
                },
                "shape": {"type": "graduated"}
            },
            "labels": {"fields": ["arabic_label"], "haloColor": "#ffffff", "haloWidth": 2}
        }))
        .unwrap();

        let patch = sidecar
            .property_patch(&feature(json!({"color": "#1a9641"})))
            .unwrap();
        assert_eq!(patch.fill_color.as_deref(), Some("#1a9641"));
        assert!(sidecar.property_patch(&feature(json!({"color": "#000"}))).is_none());
        assert_eq!(sidecar.labels.unwrap().halo_width, Some(2.0));
    }

    #[test]
    fn test_render_patch() {
        let sidecar: MxdStyle = serde_json::from_value(json!({
            "render_properties": {"color": "#f00", "weight": 3, "smoothFactor": 1}
        }))
        .unwrap();
        let patch = sidecar.render_patch().unwrap();
        assert_eq!(patch.weight, Some(3.0));
        assert_eq!(patch.color, None);

        let only_colors: MxdStyle =
            serde_json::from_value(json!({"render_properties": {"fillColor": "#f00"}})).unwrap();
        assert!(only_colors.render_patch().is_none());
    }
}
