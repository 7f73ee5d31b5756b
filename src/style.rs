use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

use crate::colors::HIGHLIGHT;
use crate::feature::{GeometryFamily, GeometryKind};

/// Partial style. Fields left as `None` keep whatever an earlier patch set.
///
/// Keys use the map library's camelCase names so sidecar `default_style`
/// blocks and `layers.json` entries deserialize directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
}

impl StylePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill_color(mut self, color: impl Into<String>) -> Self {
        self.fill_color = Some(color.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn fill_opacity(mut self, fill_opacity: f64) -> Self {
        self.fill_opacity = Some(fill_opacity);
        self
    }

    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn dash_array(mut self, dash_array: impl Into<String>) -> Self {
        self.dash_array = Some(dash_array.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite the fields `other` sets, leave the rest untouched.
    pub fn merge(&mut self, other: &StylePatch) {
        if other.fill_color.is_some() {
            self.fill_color.clone_from(&other.fill_color);
        }
        if other.color.is_some() {
            self.color.clone_from(&other.color);
        }
        if other.weight.is_some() {
            self.weight = other.weight;
        }
        if other.opacity.is_some() {
            self.opacity = other.opacity;
        }
        if other.fill_opacity.is_some() {
            self.fill_opacity = other.fill_opacity;
        }
        if other.radius.is_some() {
            self.radius = other.radius;
        }
        if other.dash_array.is_some() {
            self.dash_array.clone_from(&other.dash_array);
        }
    }

    pub fn merged(mut self, other: &StylePatch) -> Self {
        self.merge(other);
        self
    }

    /// Build a patch from free-form render properties, skipping the color keys.
    ///
    /// Keys this patch does not model are ignored, and so are values of the
    /// wrong JSON type.
    pub fn from_render_properties(props: &Map<String, Value>) -> Self {
        let mut patch = StylePatch::new();
        for (key, value) in props {
            match key.as_str() {
                "weight" => patch.weight = value.as_f64(),
                "opacity" => patch.opacity = value.as_f64(),
                "fillOpacity" => patch.fill_opacity = value.as_f64(),
                "radius" => patch.radius = value.as_f64(),
                "dashArray" => patch.dash_array = value.as_str().map(String::from),
                _ => {}
            }
        }
        patch
    }
}

/// Fully resolved render style handed to the map library.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
}

impl From<StylePatch> for StyleSpec {
    fn from(patch: StylePatch) -> Self {
        StyleSpec {
            fill_color: patch.fill_color,
            color: patch.color.unwrap_or_else(|| "#000".to_string()),
            weight: patch.weight.unwrap_or(1.0),
            opacity: patch.opacity.unwrap_or(1.0),
            fill_opacity: patch.fill_opacity,
            radius: patch.radius,
            dash_array: patch.dash_array,
        }
    }
}

/// Starting style for a geometry type, before any layer styling.
pub fn geometry_default(kind: GeometryKind) -> StylePatch {
    match kind {
        GeometryKind::Point | GeometryKind::MultiPoint => StylePatch::new()
            .radius(6.0)
            .fill_color("#ff7800")
            .color("#000")
            .weight(1.0)
            .opacity(1.0)
            .fill_opacity(0.8),
        GeometryKind::LineString | GeometryKind::MultiLineString => StylePatch::new()
            .color("#3388ff")
            .weight(3.0)
            .opacity(0.7),
        GeometryKind::Polygon | GeometryKind::MultiPolygon => StylePatch::new()
            .fill_color("#3388ff")
            .color("#000")
            .weight(1.0)
            .opacity(1.0)
            .fill_opacity(0.5),
        GeometryKind::Other => StylePatch::new()
            .fill_color("#808080")
            .color("#000")
            .weight(1.0)
            .opacity(1.0)
            .fill_opacity(0.7),
    }
}

/// Selection highlight. Lines only get a heavier stroke, everything else is filled too.
pub fn highlight(kind: GeometryKind) -> StylePatch {
    match kind.family() {
        GeometryFamily::Line => StylePatch::new().color(HIGHLIGHT).weight(5.0).opacity(1.0),
        _ => StylePatch::new()
            .color(HIGHLIGHT)
            .fill_color(HIGHLIGHT)
            .weight(3.0)
            .opacity(1.0)
            .fill_opacity(0.5),
    }
}

/// One row of a map legend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

impl LegendEntry {
    pub fn new(label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: color.into(),
        }
    }
}

/// Serialize per-layer legends as `{ "<layer>": { "title": ..., "entries": [...] } }`.
pub fn generate_legend_json(legends: &BTreeMap<String, (String, Vec<LegendEntry>)>) -> String {
    let mut root = Map::new();
    for (layer_id, (title, entries)) in legends {
        root.insert(
            layer_id.clone(),
            json!({
                "title": title,
                "entries": entries,
            }),
        );
    }
    serde_json::to_string_pretty(&Value::Object(root)).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_only_overwrites_set_fields() {
        let base = StylePatch::new()
            .fill_color("#3388ff")
            .color("#000")
            .weight(1.0);
        let layer = StylePatch::new().fill_color("#E5F5E0").weight(2.0);

        let merged = base.merged(&layer);
        assert_eq!(merged.fill_color.as_deref(), Some("#E5F5E0"));
        assert_eq!(merged.color.as_deref(), Some("#000"));
        assert_eq!(merged.weight, Some(2.0));
        assert_eq!(merged.opacity, None);
    }

    #[test]
    fn test_patch_deserializes_camel_case() {
        let patch: StylePatch = serde_json::from_str(
            r##"{"fillColor":"#CCCCCC","color":"#000000","weight":1,"fillOpacity":0.7,"dashArray":"5, 5","label":"x"}"##,
        )
        .unwrap();
        assert_eq!(patch.fill_color.as_deref(), Some("#CCCCCC"));
        assert_eq!(patch.weight, Some(1.0));
        assert_eq!(patch.fill_opacity, Some(0.7));
        assert_eq!(patch.dash_array.as_deref(), Some("5, 5"));
        assert_eq!(patch.opacity, None);
    }

    #[test]
    fn test_render_properties_skip_colors() {
        let props = json!({
            "color": "#ff0000",
            "fillColor": "#00ff00",
            "weight": 4,
            "dashArray": "2, 4",
            "lineCap": "round",
        });
        let patch = StylePatch::from_render_properties(props.as_object().unwrap());
        assert_eq!(patch.color, None);
        assert_eq!(patch.fill_color, None);
        assert_eq!(patch.weight, Some(4.0));
        assert_eq!(patch.dash_array.as_deref(), Some("2, 4"));
    }

    #[test]
    fn test_geometry_defaults() {
        let point = StyleSpec::from(geometry_default(GeometryKind::Point));
        assert_eq!(point.radius, Some(6.0));
        assert_eq!(point.fill_color.as_deref(), Some("#ff7800"));

        let line = StyleSpec::from(geometry_default(GeometryKind::MultiLineString));
        assert_eq!(line.fill_color, None);
        assert_eq!(line.weight, 3.0);
        assert_eq!(line.opacity, 0.7);

        let other = StyleSpec::from(geometry_default(GeometryKind::Other));
        assert_eq!(other.fill_color.as_deref(), Some("#808080"));
    }

    #[test]
    fn test_highlight_by_family() {
        let line = highlight(GeometryKind::LineString);
        assert_eq!(line.weight, Some(5.0));
        assert_eq!(line.fill_color, None);

        let area = highlight(GeometryKind::MultiPolygon);
        assert_eq!(area.weight, Some(3.0));
        assert_eq!(area.fill_color.as_deref(), Some(HIGHLIGHT));
    }

    #[test]
    fn test_spec_serializes_without_empty_fields() {
        let spec = StyleSpec::from(geometry_default(GeometryKind::LineString));
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value, json!({"color": "#3388ff", "weight": 3.0, "opacity": 0.7}));
    }

    #[test]
    fn test_generate_legend_json() {
        let mut legends = BTreeMap::new();
        legends.insert(
            "neighborhood".to_string(),
            ("power".to_string(), vec![LegendEntry::new("0.00 - 20.00", "#edf8e9")]),
        );
        let parsed: Value = serde_json::from_str(&generate_legend_json(&legends)).unwrap();
        assert_eq!(parsed["neighborhood"]["title"], "power");
        assert_eq!(parsed["neighborhood"]["entries"][0]["color"], "#edf8e9");
    }
}
