use log::{debug, error, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::feature::{FeatureCollection, LayerConfig};
use crate::layers::builtin_configs;
use crate::mxd::MxdStyle;
use crate::state::LoadedLayer;
use crate::util::layer_id_from_path;

/// Registry override looked up in the data directory
pub const LAYER_INDEX: &str = "layers.json";

pub async fn load_collection(path: &Path) -> Result<FeatureCollection> {
    let bytes = tokio::fs::read(path).await?;
    let collection: FeatureCollection = serde_json::from_slice(&bytes)?;
    debug!("Read {} features from {:?}", collection.features.len(), path);
    Ok(collection)
}

/// Style sidecar for a layer. Missing or unreadable sidecars yield `None`
/// and the layer keeps its built-in style.
pub async fn load_sidecar(path: &Path) -> Option<MxdStyle> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("No style sidecar at {:?}: {}", path, e);
            return None;
        }
    };

    match serde_json::from_slice::<MxdStyle>(&bytes) {
        Ok(style) => Some(style),
        Err(e) => {
            warn!("Ignoring invalid style sidecar {:?}: {}", path, e);
            None
        }
    }
}

/// GeoJSON files directly under `dir`, sorted by path
pub fn find_geojson_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Failed to read directory {:?}: {}", dir, e);
            return files;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() {
            if let Some(ext) = path.extension().and_then(|v| v.to_str()) {
                if ext.eq_ignore_ascii_case("geojson") {
                    files.push(path);
                }
            }
        }
    }

    files.sort();
    files
}

/// Layer registry for a data directory.
///
/// `layers.json` wins when present and valid. Otherwise the built-in layers
/// are used, plus any GeoJSON file no built-in layer claims.
pub async fn discover_layers(data_dir: &Path) -> Vec<LayerConfig> {
    let index_path = data_dir.join(LAYER_INDEX);
    if let Ok(bytes) = tokio::fs::read(&index_path).await {
        match serde_json::from_slice::<Vec<LayerConfig>>(&bytes) {
            Ok(configs) => {
                debug!("Using {} layers from {:?}", configs.len(), index_path);
                return configs;
            }
            Err(e) => warn!("Ignoring invalid layer index {:?}: {}", index_path, e),
        }
    }

    let mut configs = builtin_configs();
    for path in find_geojson_files(data_dir) {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if configs.iter().any(|c| c.source_file == file_name) {
            continue;
        }
        let id = layer_id_from_path(&path);
        if configs.iter().any(|c| c.id == id) {
            warn!("Skipping {:?}: layer id {} already registered", path, id);
            continue;
        }
        debug!("Discovered layer {} from {:?}", id, path);
        configs.push(LayerConfig::discovered(&id, file_name));
    }
    configs
}

/// Sidecar file name for a layer: explicit, else `<id>_style.json`
pub fn style_file_name(config: &LayerConfig) -> String {
    config
        .style_file
        .clone()
        .unwrap_or_else(|| format!("{}_style.json", config.id))
}

/// Read a layer's features and its sidecar.
pub async fn load_layer(config: LayerConfig, data_dir: &Path, style_dir: &Path) -> Result<LoadedLayer> {
    let collection = load_collection(&data_dir.join(&config.source_file)).await?;
    let sidecar = load_sidecar(&style_dir.join(style_file_name(&config))).await;
    if sidecar.is_none() {
        debug!("Layer {} uses its built-in style", config.id);
    }
    Ok(LoadedLayer::new(config, sidecar, collection.features))
}
