//! Per-feature style resolution.
//!
//! A feature's render style is an ordered list of partial patches applied
//! left to right; each patch overwrites only the fields it sets.
//!
//! | Order | Source            | Sets                                             |
//! |-------|-------------------|--------------------------------------------------|
//! | 1     | geometry default  | everything for the geometry type                 |
//! | 2     | layer style       | fields present in the layer config + sidecar     |
//! | 3     | sidecar overrides | thematic property style, non-color render props  |
//! | 4     | style mode        | filter opacity, or thematic/classification fill  |
//! | 5     | selection         | highlight stroke (and fill for points/polygons)  |

use crate::classification::classify;
use crate::colors::{MISSING_GRAY, NEUTRAL_BORDER};
use crate::feature::Feature;
use crate::filter::FeaturePredicate;
use crate::mxd::MxdStyle;
use crate::style::{StylePatch, StyleSpec, geometry_default, highlight};
use crate::thematic::Theme;

/// Opacity for features failing the active filter
pub const DIMMED_OPACITY: f64 = 0.2;
pub const DIMMED_FILL_OPACITY: f64 = 0.1;

/// Fill opacity of thematic and classification fills
pub const DEFAULT_FILL_OPACITY: f64 = 0.7;

/// The one style-producing mode active on a layer
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StyleMode {
    #[default]
    Raw,
    Filter(FeaturePredicate),
    Thematic(Theme),
    Classification { field: String },
}

impl StyleMode {
    pub fn name(&self) -> &'static str {
        match self {
            StyleMode::Raw => "raw",
            StyleMode::Filter(_) => "filter",
            StyleMode::Thematic(_) => "thematic",
            StyleMode::Classification { .. } => "classification",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    GeometryDefault,
    Layer,
    Sidecar,
    Mode,
    Selection,
}

/// Everything about the feature's layer the cascade needs
#[derive(Debug, Clone, Copy)]
pub struct StyleContext<'a> {
    pub layer_id: &'a str,
    /// Layer config style with the sidecar `default_style` already merged in
    pub layer_style: &'a StylePatch,
    pub sidecar: Option<&'a MxdStyle>,
    pub selected: bool,
}

/// Fill replacement shared by thematic and classification modes
fn choropleth_patch(fill: &str) -> StylePatch {
    StylePatch::new()
        .fill_color(fill)
        .color(NEUTRAL_BORDER)
        .weight(1.0)
        .opacity(1.0)
        .fill_opacity(DEFAULT_FILL_OPACITY)
}

fn mode_patch(feature: &Feature, mode: &StyleMode, ctx: &StyleContext<'_>) -> Option<StylePatch> {
    match mode {
        StyleMode::Raw => None,
        // Passing features keep the layer's own opacities
        StyleMode::Filter(predicate) if predicate.matches(ctx.layer_id, feature) => None,
        StyleMode::Filter(_) => Some(
            StylePatch::new()
                .opacity(DIMMED_OPACITY)
                .fill_opacity(DIMMED_FILL_OPACITY),
        ),
        StyleMode::Thematic(theme) => Some(choropleth_patch(theme.color_for(feature))),
        StyleMode::Classification { field } => {
            let fill = match feature.property(field) {
                Some(value) => classify(field, Some(value)).color,
                None => MISSING_GRAY,
            };
            Some(choropleth_patch(fill))
        }
    }
}

/// Ordered patches for one feature, lowest precedence first
pub fn cascade(feature: &Feature, mode: &StyleMode, ctx: &StyleContext<'_>) -> Vec<(Precedence, StylePatch)> {
    let kind = feature.geometry_kind();
    let mut patches = vec![
        (Precedence::GeometryDefault, geometry_default(kind)),
        (Precedence::Layer, ctx.layer_style.clone()),
    ];

    if let Some(sidecar) = ctx.sidecar {
        if let Some(patch) = sidecar.property_patch(feature) {
            patches.push((Precedence::Sidecar, patch));
        }
        if let Some(patch) = sidecar.render_patch() {
            patches.push((Precedence::Sidecar, patch));
        }
    }

    if let Some(patch) = mode_patch(feature, mode, ctx) {
        patches.push((Precedence::Mode, patch));
    }

    if ctx.selected {
        patches.push((Precedence::Selection, highlight(kind)));
    }

    patches
}

/// Resolve the render style of one feature.
///
/// Never fails: unreadable values fall back to gray fills inside the modes.
pub fn resolve_style(feature: &Feature, mode: &StyleMode, ctx: &StyleContext<'_>) -> StyleSpec {
    let merged = cascade(feature, mode, ctx)
        .into_iter()
        .fold(StylePatch::new(), |acc, (_, patch)| acc.merged(&patch));
    StyleSpec::from(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{ColorScheme, HIGHLIGHT, UNKNOWN_GRAY};
    use crate::filter::{AttributeFilter, FilterKind};
    use crate::thematic::DEFAULT_BIN_COUNT;
    use serde_json::{Value, json};

    fn polygon(props: Value) -> Feature {
        Feature::new(
            Some(json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]})),
            props.as_object().cloned().unwrap_or_default(),
        )
    }

    fn line(props: Value) -> Feature {
        Feature::new(
            Some(json!({"type": "LineString", "coordinates": [[0, 0], [1, 1]]})),
            props.as_object().cloned().unwrap_or_default(),
        )
    }

    fn ctx<'a>(layer_style: &'a StylePatch, selected: bool) -> StyleContext<'a> {
        StyleContext {
            layer_id: "neighborhood",
            layer_style,
            sidecar: None,
            selected,
        }
    }

    fn neighborhood_style() -> StylePatch {
        StylePatch::new()
            .fill_color("#E5F5E0")
            .color("#31A354")
            .weight(2.0)
            .opacity(1.0)
            .fill_opacity(0.7)
    }

    #[test]
    fn test_layer_fill_overrides_geometry_default() {
        let layer = neighborhood_style();
        let style = resolve_style(&polygon(json!({})), &StyleMode::Raw, &ctx(&layer, false));
        assert_eq!(style.fill_color.as_deref(), Some("#E5F5E0"));
        assert_eq!(style.color, "#31A354");
        assert_eq!(style.weight, 2.0);
    }

    #[test]
    fn test_partial_layer_style_keeps_defaults() {
        let layer = StylePatch::new().color("#636363").dash_array("5, 5");
        let style = resolve_style(&line(json!({})), &StyleMode::Raw, &ctx(&layer, false));
        assert_eq!(style.color, "#636363");
        assert_eq!(style.weight, 3.0);
        assert_eq!(style.opacity, 0.7);
        assert_eq!(style.dash_array.as_deref(), Some("5, 5"));
        assert_eq!(style.fill_color, None);
    }

    #[test]
    fn test_classification_fill_beats_layer_fill() {
        let layer = neighborhood_style();
        let mode = StyleMode::Classification {
            field: "power".into(),
        };
        let style = resolve_style(&polygon(json!({"power": 45})), &mode, &ctx(&layer, false));
        assert_eq!(style.fill_color.as_deref(), Some("#ffffbf"));
        assert_eq!(style.color, NEUTRAL_BORDER);
        assert_eq!(style.weight, 1.0);

        let style = resolve_style(&polygon(json!({"power": "abc"})), &mode, &ctx(&layer, false));
        assert_eq!(style.fill_color.as_deref(), Some(UNKNOWN_GRAY));

        let style = resolve_style(&polygon(json!({"power": null})), &mode, &ctx(&layer, false));
        assert_eq!(style.fill_color.as_deref(), Some(MISSING_GRAY));
    }

    #[test]
    fn test_thematic_fill_beats_layer_fill() {
        let layer = neighborhood_style();
        let features = vec![polygon(json!({"housing": 0})), polygon(json!({"housing": 100}))];
        let theme = Theme::build(&features, "housing", ColorScheme::Red, DEFAULT_BIN_COUNT);
        let mode = StyleMode::Thematic(theme);

        let style = resolve_style(&features[1], &mode, &ctx(&layer, false));
        assert_eq!(style.fill_color.as_deref(), Some("#de2d26"));
        assert_eq!(style.color, NEUTRAL_BORDER);
        assert_eq!(style.weight, 1.0);
    }

    #[test]
    fn test_filter_dims_failing_features() {
        let layer = neighborhood_style();
        let mode = StyleMode::Filter(FeaturePredicate::Attribute(AttributeFilter {
            property: "power".into(),
            kind: FilterKind::Number {
                min: Some(50.0),
                max: None,
            },
        }));

        let failing = resolve_style(&polygon(json!({"power": 10})), &mode, &ctx(&layer, false));
        assert_eq!(failing.opacity, DIMMED_OPACITY);
        assert_eq!(failing.fill_opacity, Some(DIMMED_FILL_OPACITY));
        assert_eq!(failing.fill_color.as_deref(), Some("#E5F5E0"));

        let passing = resolve_style(&polygon(json!({"power": 90})), &mode, &ctx(&layer, false));
        assert_eq!(passing.opacity, 1.0);
        assert_eq!(passing.fill_opacity, Some(0.7));
    }

    #[test]
    fn test_passing_feature_keeps_raw_style() {
        let routes = (crate::layers::ROUTES.base_style)();
        let road = line(json!({"lanes": 2}));
        let mode = StyleMode::Filter(FeaturePredicate::Attribute(AttributeFilter {
            property: "lanes".into(),
            kind: FilterKind::Number {
                min: Some(1.0),
                max: None,
            },
        }));
        let context = StyleContext {
            layer_id: "routes",
            ..ctx(&routes, false)
        };

        let raw = resolve_style(&road, &StyleMode::Raw, &context);
        let passing = resolve_style(&road, &mode, &context);
        assert_eq!(passing, raw);
        assert_eq!(passing.opacity, 0.7);
        assert_eq!(passing.fill_opacity, None);

        let failing = resolve_style(&line(json!({"lanes": 0})), &mode, &context);
        assert_eq!(failing.opacity, DIMMED_OPACITY);
    }

    #[test]
    fn test_selection_overrides_every_mode() {
        let layer = neighborhood_style();
        let mode = StyleMode::Classification {
            field: "power".into(),
        };
        let f = polygon(json!({"power": 90}));
        let selected = resolve_style(&f, &mode, &ctx(&layer, true));
        assert_eq!(selected.fill_color.as_deref(), Some(HIGHLIGHT));
        assert_eq!(selected.color, HIGHLIGHT);
        assert_eq!(selected.weight, 3.0);
        assert_eq!(selected.fill_opacity, Some(0.5));

        let road = resolve_style(&line(json!({})), &StyleMode::Raw, &ctx(&layer, true));
        assert_eq!(road.color, HIGHLIGHT);
        assert_eq!(road.weight, 5.0);
        // Lines keep their fill untouched
        assert_eq!(road.fill_color.as_deref(), Some("#E5F5E0"));
    }

    #[test]
    fn test_sidecar_sits_between_layer_and_mode() {
        let layer = neighborhood_style();
        let sidecar: MxdStyle = serde_json::from_value(json!({
            "thematic": true,
            "thematic_property": "power",
            "property_styles": {"power": {"type": "range", "ranges": [
                {"min": 0, "max": 50, "style": {"fillColor": "#00ff00"}}
            ]}},
            "render_properties": {"weight": 4, "color": "#ff0000"}
        }))
        .unwrap();
        let context = StyleContext {
            sidecar: Some(&sidecar),
            ..ctx(&layer, false)
        };
        let f = polygon(json!({"power": 10}));

        let raw = resolve_style(&f, &StyleMode::Raw, &context);
        assert_eq!(raw.fill_color.as_deref(), Some("#00ff00"));
        assert_eq!(raw.weight, 4.0);
        assert_eq!(raw.color, "#31A354");

        let classified = resolve_style(
            &f,
            &StyleMode::Classification {
                field: "power".into(),
            },
            &context,
        );
        assert_eq!(classified.fill_color.as_deref(), Some("#1a9641"));
        assert_eq!(classified.weight, 1.0);
    }

    #[test]
    fn test_cascade_order() {
        let layer = neighborhood_style();
        let order: Vec<Precedence> = cascade(
            &polygon(json!({"power": 1})),
            &StyleMode::Classification {
                field: "power".into(),
            },
            &ctx(&layer, true),
        )
        .into_iter()
        .map(|(p, _)| p)
        .collect();
        assert_eq!(
            order,
            vec![
                Precedence::GeometryDefault,
                Precedence::Layer,
                Precedence::Mode,
                Precedence::Selection
            ]
        );
        assert!(order.windows(2).all(|w| w[0] <= w[1]));
    }
}
