use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown layer: {0}")]
    UnknownLayer(String),

    #[error("Layer not loaded: {0}")]
    LayerNotLoaded(String),

    #[error("Feature {index} not found in layer {layer_id}")]
    FeatureNotFound { layer_id: String, index: usize },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("No features selected")]
    EmptySelection,
}

/// Convenience type alias for Results with MapError
pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "routes.geojson");
        let err: MapError = io_err.into();
        assert!(matches!(err, MapError::Io(_)));
        assert!(err.to_string().contains("routes.geojson"));
    }

    #[test]
    fn test_error_display() {
        let err = MapError::UnknownLayer("rivers".to_string());
        assert_eq!(err.to_string(), "Unknown layer: rivers");

        let err = MapError::FeatureNotFound {
            layer_id: "routes".to_string(),
            index: 4,
        };
        assert_eq!(err.to_string(), "Feature 4 not found in layer routes");

        assert_eq!(MapError::EmptySelection.to_string(), "No features selected");
    }
}
