use log::{debug, info};
use serde_json::Value;

use crate::colors::ColorScheme;
use crate::feature::Feature;
use crate::inspect::{PropertyType, infer_type, min_max, unique_values};
use crate::style::LegendEntry;
use crate::util::{parse_number, value_to_display};

pub const DEFAULT_BIN_COUNT: usize = 5;

/// How feature values map onto ramp colors
#[derive(Debug, Clone, PartialEq)]
pub enum ThemeBins {
    /// Equal-interval boundaries, `bin_count + 1` values from min to max.
    /// Empty when the property has no numeric values.
    Numeric { bounds: Vec<f64> },
    /// Category text to color, in sorted category order
    Categorical { colors: Vec<(String, &'static str)> },
}

/// Choropleth built from the live features of one layer
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub property: String,
    pub scheme: ColorScheme,
    pub bins: ThemeBins,
}

/// Equal-interval boundaries over `[min, max]`, last boundary pinned to `max`
pub fn equal_interval(min: f64, max: f64, bin_count: usize) -> Vec<f64> {
    let bin_count = bin_count.max(1);
    let width = (max - min) / bin_count as f64;
    let mut bounds: Vec<f64> = (0..bin_count).map(|i| min + width * i as f64).collect();
    bounds.push(max);
    bounds
}

impl Theme {
    pub fn build(features: &[Feature], property: &str, scheme: ColorScheme, bin_count: usize) -> Self {
        let info = infer_type(features, property);

        let bins = match info.property_type {
            PropertyType::Number => {
                let bounds = min_max(features, property)
                    .map(|(min, max)| equal_interval(min, max, bin_count))
                    .unwrap_or_default();
                debug!("Numeric theme on {} with bounds {:?}", property, bounds);
                ThemeBins::Numeric { bounds }
            }
            PropertyType::Categorical | PropertyType::Text => {
                let mut colors: Vec<(String, &'static str)> = Vec::new();
                for value in unique_values(features, property) {
                    let key = value_to_display(&value);
                    // Values sharing a text form ("5" and 5) share one entry
                    if colors.iter().any(|(k, _)| *k == key) {
                        continue;
                    }
                    let color = scheme.color_at(colors.len());
                    colors.push((key, color));
                }
                debug!("Categorical theme on {} with {} categories", property, colors.len());
                ThemeBins::Categorical { colors }
            }
        };

        info!(
            "Built {} theme for {} using {} ramp",
            match bins {
                ThemeBins::Numeric { .. } => "numeric",
                ThemeBins::Categorical { .. } => "categorical",
            },
            property,
            scheme.name()
        );

        Theme {
            property: property.to_string(),
            scheme,
            bins,
        }
    }

    fn fallback(&self) -> &'static str {
        self.scheme.color_at(0)
    }

    /// Fill color for one value of the themed property
    pub fn color_for_value(&self, value: Option<&Value>) -> &'static str {
        match &self.bins {
            ThemeBins::Numeric { bounds } => {
                let Some(v) = value.and_then(parse_number) else {
                    return self.fallback();
                };
                // Inclusive on both ends: a value on a shared edge takes the lower bin
                bounds
                    .windows(2)
                    .position(|w| v >= w[0] && v <= w[1])
                    .map(|i| self.scheme.color_at(i))
                    .unwrap_or_else(|| self.fallback())
            }
            ThemeBins::Categorical { colors } => {
                let Some(key) = value.map(value_to_display) else {
                    return self.fallback();
                };
                colors
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, c)| *c)
                    .unwrap_or_else(|| self.fallback())
            }
        }
    }

    pub fn color_for(&self, feature: &Feature) -> &'static str {
        self.color_for_value(feature.property(&self.property))
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        match &self.bins {
            ThemeBins::Numeric { bounds } => bounds
                .windows(2)
                .enumerate()
                .map(|(i, w)| {
                    LegendEntry::new(
                        format!("{:.2} - {:.2}", w[0], w[1]),
                        self.scheme.color_at(i),
                    )
                })
                .collect(),
            ThemeBins::Categorical { colors } => colors
                .iter()
                .map(|(label, color)| LegendEntry::new(label.clone(), *color))
                .collect(),
        }
    }
}
