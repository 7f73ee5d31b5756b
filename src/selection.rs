use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::feature::Feature;
use crate::util::value_to_display;

/// Property names tried, in order, when labelling a feature for people
const NAME_PROPERTIES: [&str; 3] = ["arabic_label", "ADM4_NAME_", "name"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedFeature {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_id: Option<Value>,
    pub layer_id: String,
    pub properties: Map<String, Value>,
    pub geometry: Option<Value>,
}

impl SelectedFeature {
    pub fn from_feature(feature: &Feature, layer_id: &str) -> Self {
        SelectedFeature {
            feature_id: feature.feature_id().cloned(),
            layer_id: layer_id.to_string(),
            properties: feature.properties.clone(),
            geometry: feature.geometry.clone(),
        }
    }

    /// Same layer, then same id when both carry one, else identical properties.
    fn is_same(&self, feature: &Feature, layer_id: &str) -> bool {
        if self.layer_id != layer_id {
            return false;
        }
        match (&self.feature_id, feature.feature_id()) {
            (Some(a), Some(b)) => a == b,
            _ => self.properties == feature.properties,
        }
    }
}

/// Ordered set of selected features, in the order they were picked
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    items: Vec<SelectedFeature>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, feature: &Feature, layer_id: &str) -> Option<usize> {
        self.items.iter().position(|s| s.is_same(feature, layer_id))
    }

    pub fn contains(&self, feature: &Feature, layer_id: &str) -> bool {
        self.position(feature, layer_id).is_some()
    }

    /// Add the feature if absent, remove it if present.
    ///
    /// Returns whether the feature is selected afterwards.
    pub fn toggle(&mut self, feature: &Feature, layer_id: &str) -> bool {
        match self.position(feature, layer_id) {
            Some(index) => {
                self.items.remove(index);
                debug!("Deselected feature on {} ({} remain)", layer_id, self.items.len());
                false
            }
            None => {
                self.items.push(SelectedFeature::from_feature(feature, layer_id));
                debug!("Selected feature on {} ({} total)", layer_id, self.items.len());
                true
            }
        }
    }

    /// Add without toggling; already selected features stay put.
    pub fn insert(&mut self, feature: &Feature, layer_id: &str) -> bool {
        if self.contains(feature, layer_id) {
            return false;
        }
        self.items.push(SelectedFeature::from_feature(feature, layer_id));
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectedFeature> {
        self.items.iter()
    }
}

/// Human label for a feature: first non-empty name property, then the id,
/// then `Feature <index + 1>`.
pub fn display_name(properties: &Map<String, Value>, feature_id: Option<&Value>, index: usize) -> String {
    NAME_PROPERTIES
        .iter()
        .filter_map(|key| properties.get(*key))
        .chain(feature_id)
        .map(value_to_display)
        .find(|s| !s.trim().is_empty())
        .unwrap_or_else(|| format!("Feature {}", index + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(props: Value) -> Feature {
        Feature::new(
            Some(json!({"type": "Point", "coordinates": [36.7, 34.73]})),
            props.as_object().cloned().unwrap_or_default(),
        )
    }

    #[test]
    fn test_toggle_twice_restores_set() {
        let mut selection = SelectionSet::new();
        let f = feature(json!({"ADM4_NAME_": "Al Waer"}));

        assert!(selection.toggle(&f, "neighborhood"));
        assert_eq!(selection.len(), 1);
        assert!(!selection.toggle(&f, "neighborhood"));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_identity_by_id_then_properties() {
        let mut selection = SelectionSet::new();
        let a = feature(json!({"power": 10})).with_id(json!(1));
        let a_changed = feature(json!({"power": 99})).with_id(json!(1));
        let b = feature(json!({"power": 10})).with_id(json!(2));

        selection.toggle(&a, "electricity");
        assert!(selection.contains(&a_changed, "electricity"));
        assert!(!selection.contains(&b, "electricity"));

        // No ids: compared by properties
        let c = feature(json!({"housing": 40}));
        let c_copy = feature(json!({"housing": 40}));
        selection.toggle(&c, "housing");
        assert!(selection.contains(&c_copy, "housing"));
        assert!(!selection.contains(&c_copy, "neighborhood"));
    }

    #[test]
    fn test_selection_keeps_pick_order() {
        let mut selection = SelectionSet::new();
        for n in [3, 1, 2] {
            selection.toggle(&feature(json!({"n": n})), "routes");
        }
        let order: Vec<&Value> = selection.iter().map(|s| &s.properties["n"]).collect();
        assert_eq!(order, vec![&json!(3), &json!(1), &json!(2)]);

        assert!(!selection.insert(&feature(json!({"n": 1})), "routes"));
        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_display_name_chain() {
        let props = json!({"arabic_label": "الوعر", "ADM4_NAME_": "Al Waer"});
        assert_eq!(display_name(props.as_object().unwrap(), None, 0), "الوعر");

        let props = json!({"arabic_label": "", "name": "Main St"});
        assert_eq!(display_name(props.as_object().unwrap(), None, 0), "Main St");

        let props = json!({"power": 10});
        assert_eq!(display_name(props.as_object().unwrap(), Some(&json!(42)), 0), "42");
        assert_eq!(display_name(props.as_object().unwrap(), None, 4), "Feature 5");
    }
}
