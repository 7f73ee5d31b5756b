use chrono::NaiveDate;
use log::{debug, info, warn};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};

use crate::classification;
use crate::colors::ColorScheme;
use crate::error::{MapError, Result};
use crate::feature::{Feature, LayerConfig};
use crate::filter::{AdvancedFilter, AttributeFilter, Criterion, CriterionSpec, FeaturePredicate, FilterLogic, matches_search};
use crate::inspect::{self, PropertyInfo};
use crate::mxd::MxdStyle;
use crate::report::{self, ReportOptions};
use crate::resolve::{StyleContext, StyleMode, resolve_style};
use crate::selection::SelectionSet;
use crate::style::{LegendEntry, StylePatch, StyleSpec};
use crate::thematic::Theme;
use crate::util::value_to_display;

static RAW: StyleMode = StyleMode::Raw;

/// A layer whose features are in memory
#[derive(Debug, Clone)]
pub struct LoadedLayer {
    pub config: LayerConfig,
    pub sidecar: Option<MxdStyle>,
    /// Config style with the sidecar `default_style` merged over it
    pub base_style: StylePatch,
    pub features: Vec<Feature>,
}

impl LoadedLayer {
    pub fn new(config: LayerConfig, sidecar: Option<MxdStyle>, features: Vec<Feature>) -> Self {
        let mut base_style = config.style.clone();
        if let Some(default_style) = sidecar.as_ref().and_then(|s| s.default_style.as_ref()) {
            base_style.merge(default_style);
        }
        LoadedLayer {
            config,
            sidecar,
            base_style,
            features,
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }
}

/// Everything the viewer tracks between operations: registry, loaded
/// layers, the one active style mode per layer and the selection.
#[derive(Debug, Default)]
pub struct AppState {
    registry: Vec<LayerConfig>,
    layers: HashMap<String, LoadedLayer>,
    modes: HashMap<String, StyleMode>,
    selection: SelectionSet,
}

impl AppState {
    pub fn new(registry: Vec<LayerConfig>) -> Self {
        AppState {
            registry,
            ..Default::default()
        }
    }

    pub fn registry(&self) -> &[LayerConfig] {
        &self.registry
    }

    pub fn layer_config(&self, layer_id: &str) -> Result<&LayerConfig> {
        self.registry
            .iter()
            .find(|c| c.id == layer_id)
            .ok_or_else(|| MapError::UnknownLayer(layer_id.to_string()))
    }

    pub fn is_loaded(&self, layer_id: &str) -> bool {
        self.layers.contains_key(layer_id)
    }

    /// Register loaded data. Returns false, keeping the existing data, when
    /// the layer is already loaded.
    pub fn insert_layer(&mut self, layer: LoadedLayer) -> bool {
        if self.is_loaded(layer.id()) {
            debug!("Layer {} already loaded, skipping", layer.id());
            return false;
        }
        if !self.registry.iter().any(|c| c.id == layer.config.id) {
            self.registry.push(layer.config.clone());
        }
        info!("Loaded layer {} with {} features", layer.id(), layer.features.len());
        self.layers.insert(layer.config.id.clone(), layer);
        true
    }

    pub fn layer(&self, layer_id: &str) -> Result<&LoadedLayer> {
        match self.layers.get(layer_id) {
            Some(layer) => Ok(layer),
            None => {
                self.layer_config(layer_id)?;
                Err(MapError::LayerNotLoaded(layer_id.to_string()))
            }
        }
    }

    /// Loaded layers in registry order
    pub fn loaded_layers(&self) -> impl Iterator<Item = &LoadedLayer> {
        self.registry.iter().filter_map(|c| self.layers.get(&c.id))
    }

    pub fn set_visible(&mut self, layer_id: &str, visible: bool) -> Result<()> {
        let config = self
            .registry
            .iter_mut()
            .find(|c| c.id == layer_id)
            .ok_or_else(|| MapError::UnknownLayer(layer_id.to_string()))?;
        config.visible = visible;
        if let Some(layer) = self.layers.get_mut(layer_id) {
            layer.config.visible = visible;
        }
        Ok(())
    }

    pub fn infer_type(&self, layer_id: &str, property: &str) -> Result<PropertyInfo> {
        Ok(inspect::infer_type(&self.layer(layer_id)?.features, property))
    }

    pub fn property_names(&self, layer_id: &str) -> Result<Vec<String>> {
        Ok(inspect::property_names(&self.layer(layer_id)?.features))
    }

    pub fn mode(&self, layer_id: &str) -> &StyleMode {
        self.modes.get(layer_id).unwrap_or(&RAW)
    }

    fn set_mode(&mut self, layer_id: &str, mode: StyleMode) {
        match self.modes.insert(layer_id.to_string(), mode) {
            Some(previous) if previous != StyleMode::Raw => {
                debug!("Replaced {} mode on {}", previous.name(), layer_id)
            }
            _ => {}
        }
    }

    /// Single-property filter, typed by scanning the layer's current values.
    pub fn apply_filter(
        &mut self,
        layer_id: &str,
        property: &str,
        min: Option<f64>,
        max: Option<f64>,
        value: Option<String>,
    ) -> Result<usize> {
        let info = self.infer_type(layer_id, property)?;
        let filter = AttributeFilter::for_type(property, info.property_type, min, max, value);
        let matching = self
            .layer(layer_id)?
            .features
            .iter()
            .filter(|f| filter.matches(f))
            .count();

        info!(
            "Filter on {}.{} ({:?}) matches {} features",
            layer_id, property, info.property_type, matching
        );
        self.set_mode(layer_id, StyleMode::Filter(FeaturePredicate::Attribute(filter)));
        Ok(matching)
    }

    pub fn build_criterion(&self, spec: &CriterionSpec) -> Result<Criterion> {
        let info = self.infer_type(&spec.layer_id, &spec.property)?;
        Criterion::from_spec(spec, info.property_type)
    }

    /// Apply the combined criteria as the filter mode of every loaded layer
    /// they name. Criteria on layers that are not loaded are skipped.
    pub fn apply_advanced_filter(&mut self, specs: &[CriterionSpec], logic: FilterLogic) -> Result<Vec<String>> {
        let Some(first) = specs.first() else {
            return Err(MapError::InvalidFilter("no criteria given".to_string()));
        };

        let mut criteria = Vec::with_capacity(specs.len());
        for spec in specs {
            if !self.is_loaded(&spec.layer_id) {
                warn!(
                    "Skipping criterion on {}.{}: layer not loaded",
                    spec.layer_id, spec.property
                );
                continue;
            }
            criteria.push(self.build_criterion(spec)?);
        }
        if criteria.is_empty() {
            return Err(MapError::LayerNotLoaded(first.layer_id.clone()));
        }

        let mut layer_ids: Vec<String> = Vec::new();
        for criterion in &criteria {
            if !layer_ids.contains(&criterion.layer_id) {
                layer_ids.push(criterion.layer_id.clone());
            }
        }
        let filter = AdvancedFilter { criteria, logic };

        for layer_id in &layer_ids {
            let matching = self
                .layer(layer_id)?
                .features
                .iter()
                .filter(|f| filter.matches(layer_id, f))
                .count();
            info!("Advanced filter ({:?}) matches {} features on {}", logic, matching, layer_id);
            self.set_mode(layer_id, StyleMode::Filter(FeaturePredicate::Advanced(filter.clone())));
        }
        Ok(layer_ids)
    }

    pub fn apply_thematic(
        &mut self,
        layer_id: &str,
        property: &str,
        scheme: ColorScheme,
        bin_count: usize,
    ) -> Result<&Theme> {
        let theme = Theme::build(&self.layer(layer_id)?.features, property, scheme, bin_count);
        self.set_mode(layer_id, StyleMode::Thematic(theme));
        match self.modes.get(layer_id) {
            Some(StyleMode::Thematic(theme)) => Ok(theme),
            _ => Err(MapError::LayerNotLoaded(layer_id.to_string())),
        }
    }

    pub fn apply_classification(&mut self, layer_id: &str, field: &str) -> Result<()> {
        self.layer(layer_id)?;
        if classification::find_field(field).is_none() {
            warn!("{} is not a classification field; every feature will show as unknown", field);
        }
        info!("Classifying {} by {}", layer_id, field);
        self.set_mode(
            layer_id,
            StyleMode::Classification {
                field: field.to_string(),
            },
        );
        Ok(())
    }

    /// Back to raw styling; thematic bins are discarded.
    pub fn reset(&mut self, layer_id: &str) {
        if self.modes.remove(layer_id).is_some() {
            debug!("Reset {} to raw styling", layer_id);
        }
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn toggle_selection(&mut self, layer_id: &str, index: usize) -> Result<bool> {
        let layer = self.layers.get(layer_id).ok_or_else(|| MapError::LayerNotLoaded(layer_id.to_string()))?;
        let feature = layer.features.get(index).ok_or_else(|| MapError::FeatureNotFound {
            layer_id: layer_id.to_string(),
            index,
        })?;
        Ok(self.selection.toggle(feature, layer_id))
    }

    /// Select every feature of the layer whose id reads as `id`
    pub fn select_by_id(&mut self, layer_id: &str, id: &str) -> Result<usize> {
        let layer = self.layers.get(layer_id).ok_or_else(|| MapError::LayerNotLoaded(layer_id.to_string()))?;
        let mut added = 0;
        for feature in &layer.features {
            if feature.feature_id().map(value_to_display).as_deref() == Some(id) && self.selection.insert(feature, layer_id) {
                added += 1;
            }
        }
        if added == 0 {
            warn!("No feature with id {} on {}", id, layer_id);
        }
        Ok(added)
    }

    /// Replace the selection with every feature of a visible layer having
    /// a property containing `term`.
    pub fn quick_search(&mut self, term: &str) -> usize {
        self.selection.clear();
        let mut found = 0;
        for config in self.registry.iter().filter(|c| c.visible) {
            let Some(layer) = self.layers.get(&config.id) else {
                continue;
            };
            for feature in layer.features.iter().filter(|f| matches_search(f, term)) {
                if self.selection.insert(feature, &config.id) {
                    found += 1;
                }
            }
        }
        info!("Quick search '{}' found {} features", term.trim(), found);
        found
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    fn resolve_in(&self, layer: &LoadedLayer, feature: &Feature) -> StyleSpec {
        let ctx = StyleContext {
            layer_id: layer.id(),
            layer_style: &layer.base_style,
            sidecar: layer.sidecar.as_ref(),
            selected: self.selection.contains(feature, layer.id()),
        };
        resolve_style(feature, self.mode(layer.id()), &ctx)
    }

    pub fn resolve(&self, layer_id: &str, index: usize) -> Result<StyleSpec> {
        let layer = self.layer(layer_id)?;
        let feature = layer.features.get(index).ok_or_else(|| MapError::FeatureNotFound {
            layer_id: layer_id.to_string(),
            index,
        })?;
        Ok(self.resolve_in(layer, feature))
    }

    /// The layer as a FeatureCollection where each feature carries its
    /// resolved style as a `style` member.
    pub fn styled_collection(&self, layer_id: &str) -> Result<Value> {
        let layer = self.layer(layer_id)?;
        let mut features = Vec::with_capacity(layer.features.len());
        for feature in &layer.features {
            let mut value = serde_json::to_value(feature)?;
            if let Value::Object(map) = &mut value {
                map.insert("style".to_string(), serde_json::to_value(self.resolve_in(layer, feature))?);
            }
            features.push(value);
        }
        Ok(json!({
            "type": "FeatureCollection",
            "name": layer.config.name,
            "mode": self.mode(layer_id).name(),
            "features": features,
        }))
    }

    /// Legend for the layer's active mode, if that mode has one
    pub fn legend(&self, layer_id: &str) -> Option<(String, Vec<LegendEntry>)> {
        match self.mode(layer_id) {
            StyleMode::Thematic(theme) => Some((theme.property.clone(), theme.legend())),
            StyleMode::Classification { field } => {
                let title = classification::find_field(field)
                    .map(|f| f.name.ar.to_string())
                    .unwrap_or_else(|| field.clone());
                classification::legend(field).map(|entries| (title, entries))
            }
            StyleMode::Raw | StyleMode::Filter(_) => None,
        }
    }

    pub fn legends(&self) -> BTreeMap<String, (String, Vec<LegendEntry>)> {
        self.loaded_layers()
            .filter_map(|layer| self.legend(layer.id()).map(|l| (layer.id().to_string(), l)))
            .collect()
    }

    pub fn layer_names(&self) -> HashMap<String, String> {
        self.registry.iter().map(|c| (c.id.clone(), c.name.clone())).collect()
    }

    pub fn build_report(&self, options: &ReportOptions, date: NaiveDate) -> Result<String> {
        report::build_report(options, &self.selection, &self.layer_names(), date)
    }
}
