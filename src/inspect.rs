use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::feature::Feature;
use crate::util::{parse_number, value_to_display};

/// Above this many distinct values a non-numeric property is free text
pub const MAX_CATEGORIES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Number,
    Categorical,
    Text,
}

/// What a full scan of one property found
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyInfo {
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unique_values: Vec<Value>,
}

/// Non-null values of `property`, in feature order
fn present_values<'a>(features: &'a [Feature], property: &'a str) -> impl Iterator<Item = &'a Value> {
    features.iter().filter_map(move |f| f.property(property))
}

/// Distinct non-null values, sorted by their text form
pub fn unique_values(features: &[Feature], property: &str) -> Vec<Value> {
    let mut unique: Vec<&Value> = Vec::new();
    for value in present_values(features, property) {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    let mut unique: Vec<Value> = unique.into_iter().cloned().collect();
    unique.sort_by_key(value_to_display);
    unique
}

/// Observed numeric range over finite values; `None` when there are none
pub fn min_max(features: &[Feature], property: &str) -> Option<(f64, f64)> {
    present_values(features, property)
        .filter_map(parse_number)
        .filter(|n| n.is_finite())
        .fold(None, |acc, n| match acc {
            None => Some((n, n)),
            Some((lo, hi)) => Some((lo.min(n), hi.max(n))),
        })
}

/// Classify a property by scanning every loaded feature.
///
/// Numeric only if every present value reads as a number; otherwise
/// categorical up to `MAX_CATEGORIES` distinct values, text beyond that.
pub fn infer_type(features: &[Feature], property: &str) -> PropertyInfo {
    let all_numeric = present_values(features, property).all(|v| parse_number(v).is_some());

    if all_numeric {
        let range = min_max(features, property);
        return PropertyInfo {
            property_type: PropertyType::Number,
            min: range.map(|(lo, _)| lo),
            max: range.map(|(_, hi)| hi),
            unique_values: Vec::new(),
        };
    }

    let unique = unique_values(features, property);
    if unique.len() <= MAX_CATEGORIES {
        PropertyInfo {
            property_type: PropertyType::Categorical,
            min: None,
            max: None,
            unique_values: unique,
        }
    } else {
        PropertyInfo {
            property_type: PropertyType::Text,
            min: None,
            max: None,
            unique_values: Vec::new(),
        }
    }
}

/// Sorted union of property names across all features
pub fn property_names(features: &[Feature]) -> Vec<String> {
    features
        .iter()
        .flat_map(|f| f.properties.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
