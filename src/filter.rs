use serde_json::Value;
use std::str::FromStr;

use crate::error::MapError;
use crate::feature::Feature;
use crate::inspect::PropertyType;
use crate::util::{parse_number, value_to_display};

/// Single-property filter as picked from the filter panel
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind {
    /// Inclusive range; an open end is unbounded
    Number { min: Option<f64>, max: Option<f64> },
    /// Exact match on the text form; `None` or empty matches everything
    Categorical(Option<String>),
    /// Case-insensitive substring; `None` or empty matches everything
    Text(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeFilter {
    pub property: String,
    pub kind: FilterKind,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl AttributeFilter {
    /// Build the filter appropriate for an inferred property type from raw input.
    pub fn for_type(
        property: &str,
        property_type: PropertyType,
        min: Option<f64>,
        max: Option<f64>,
        value: Option<String>,
    ) -> Self {
        let kind = match property_type {
            PropertyType::Number => FilterKind::Number { min, max },
            PropertyType::Categorical => FilterKind::Categorical(value),
            PropertyType::Text => FilterKind::Text(value),
        };
        AttributeFilter {
            property: property.to_string(),
            kind,
        }
    }

    /// Features lacking the property never match.
    pub fn matches(&self, feature: &Feature) -> bool {
        let Some(value) = feature.property(&self.property) else {
            return false;
        };

        match &self.kind {
            FilterKind::Number { min, max } => match parse_number(value) {
                Some(v) => min.is_none_or(|m| v >= m) && max.is_none_or(|m| v <= m),
                None => false,
            },
            FilterKind::Categorical(expected) => match non_empty(expected) {
                Some(expected) => value_to_display(value) == expected,
                None => true,
            },
            FilterKind::Text(term) => match non_empty(term) {
                Some(term) => value_to_display(value)
                    .to_lowercase()
                    .contains(&term.to_lowercase()),
                None => true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Between,
    Contains,
    StartsWith,
    EndsWith,
    In,
}

impl FromStr for Operator {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eq" => Ok(Operator::Eq),
            "ne" => Ok(Operator::Ne),
            "gt" => Ok(Operator::Gt),
            "lt" => Ok(Operator::Lt),
            "gte" => Ok(Operator::Gte),
            "lte" => Ok(Operator::Lte),
            "between" => Ok(Operator::Between),
            "contains" => Ok(Operator::Contains),
            "startswith" => Ok(Operator::StartsWith),
            "endswith" => Ok(Operator::EndsWith),
            "in" => Ok(Operator::In),
            other => Err(MapError::InvalidFilter(format!("unknown operator '{}'", other))),
        }
    }
}

/// Typed comparison operand
#[derive(Debug, Clone, PartialEq)]
pub enum CriterionValue {
    Number(f64),
    Range { min: Option<f64>, max: Option<f64> },
    Text(String),
    List(Vec<String>),
}

/// Unparsed criterion from the command line: `layer:property:operator:value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriterionSpec {
    pub layer_id: String,
    pub property: String,
    pub operator: String,
    pub value: String,
}

impl FromStr for CriterionSpec {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(4, ':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(layer), Some(property), Some(operator), Some(value))
                if !layer.is_empty() && !property.is_empty() =>
            {
                Ok(CriterionSpec {
                    layer_id: layer.to_string(),
                    property: property.to_string(),
                    operator: operator.to_string(),
                    value: value.to_string(),
                })
            }
            _ => Err(MapError::InvalidFilter(format!(
                "expected layer:property:operator:value, got '{}'",
                s
            ))),
        }
    }
}

fn parse_operand(raw: &str) -> Result<f64, MapError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| MapError::InvalidFilter(format!("'{}' is not a number", raw)))
}

fn parse_bound(raw: &str) -> Result<Option<f64>, MapError> {
    if raw.trim().is_empty() {
        Ok(None)
    } else {
        parse_operand(raw).map(Some)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub layer_id: String,
    pub property: String,
    pub operator: Operator,
    pub value: CriterionValue,
    pub property_type: PropertyType,
}

impl Criterion {
    /// Type the raw operand for the operator and the property's inferred type.
    ///
    /// `between` takes `min..max` (either end may be empty), `in` takes a
    /// comma-separated list.
    pub fn from_spec(spec: &CriterionSpec, property_type: PropertyType) -> Result<Self, MapError> {
        let operator: Operator = spec.operator.parse()?;
        let raw = spec.value.as_str();

        let value = match operator {
            Operator::Between => {
                let (min, max) = raw.split_once("..").ok_or_else(|| {
                    MapError::InvalidFilter(format!("between expects min..max, got '{}'", raw))
                })?;
                CriterionValue::Range {
                    min: parse_bound(min)?,
                    max: parse_bound(max)?,
                }
            }
            Operator::Gt | Operator::Lt | Operator::Gte | Operator::Lte => {
                CriterionValue::Number(parse_operand(raw)?)
            }
            Operator::Eq | Operator::Ne if property_type == PropertyType::Number => {
                CriterionValue::Number(parse_operand(raw)?)
            }
            Operator::In => CriterionValue::List(raw.split(',').map(|s| s.trim().to_string()).collect()),
            _ => CriterionValue::Text(raw.to_string()),
        };

        Ok(Criterion {
            layer_id: spec.layer_id.clone(),
            property: spec.property.clone(),
            operator,
            value,
            property_type,
        })
    }

    /// Criteria aimed at another layer do not constrain this one.
    pub fn evaluate(&self, layer_id: &str, feature: &Feature) -> bool {
        if self.layer_id != layer_id {
            return true;
        }
        let Some(value) = feature.property(&self.property) else {
            return false;
        };

        let text = value_to_display(value);
        let number = parse_number(value);

        match (&self.operator, &self.value) {
            (Operator::Eq, CriterionValue::Number(n)) => number == Some(*n),
            (Operator::Ne, CriterionValue::Number(n)) => number != Some(*n),
            (Operator::Eq, CriterionValue::Text(t)) => text == *t,
            (Operator::Ne, CriterionValue::Text(t)) => text != *t,
            (Operator::Gt, CriterionValue::Number(n)) => number.is_some_and(|v| v > *n),
            (Operator::Lt, CriterionValue::Number(n)) => number.is_some_and(|v| v < *n),
            (Operator::Gte, CriterionValue::Number(n)) => number.is_some_and(|v| v >= *n),
            (Operator::Lte, CriterionValue::Number(n)) => number.is_some_and(|v| v <= *n),
            (Operator::Between, CriterionValue::Range { min, max }) => number.is_some_and(|v| {
                min.is_none_or(|m| v >= m) && max.is_none_or(|m| v <= m)
            }),
            (Operator::Contains, CriterionValue::Text(t)) => text.contains(t.as_str()),
            (Operator::StartsWith, CriterionValue::Text(t)) => text.starts_with(t.as_str()),
            (Operator::EndsWith, CriterionValue::Text(t)) => text.ends_with(t.as_str()),
            (Operator::In, CriterionValue::List(items)) => items.iter().any(|i| *i == text),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterLogic {
    #[default]
    And,
    Or,
}

impl FromStr for FilterLogic {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Ok(FilterLogic::And),
            "OR" => Ok(FilterLogic::Or),
            other => Err(MapError::InvalidFilter(format!("unknown logic '{}'", other))),
        }
    }
}

/// Several criteria across layers combined with one logic
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdvancedFilter {
    pub criteria: Vec<Criterion>,
    pub logic: FilterLogic,
}

impl AdvancedFilter {
    pub fn matches(&self, layer_id: &str, feature: &Feature) -> bool {
        let mut results = self.criteria.iter().map(|c| c.evaluate(layer_id, feature));
        match self.logic {
            FilterLogic::And => results.all(|r| r),
            FilterLogic::Or => results.any(|r| r),
        }
    }
}

/// Predicate behind the filter style mode
#[derive(Debug, Clone, PartialEq)]
pub enum FeaturePredicate {
    Attribute(AttributeFilter),
    Advanced(AdvancedFilter),
}

impl FeaturePredicate {
    pub fn matches(&self, layer_id: &str, feature: &Feature) -> bool {
        match self {
            FeaturePredicate::Attribute(filter) => filter.matches(feature),
            FeaturePredicate::Advanced(filter) => filter.matches(layer_id, feature),
        }
    }
}

/// Case-insensitive substring search over every non-null property value.
pub fn matches_search(feature: &Feature, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return false;
    }
    feature
        .properties
        .values()
        .filter(|v| !v.is_null())
        .any(|v: &Value| value_to_display(v).to_lowercase().contains(&term))
}
