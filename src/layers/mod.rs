mod neighborhood;
mod routes;
mod utilities;

pub use neighborhood::NEIGHBORHOOD;
pub use routes::ROUTES;
pub use utilities::{CLEAN_WATER, ELECTRICITY, HOUSING, SWM, TELECOM, WASTE_WATER};

use crate::feature::{LayerConfig, LayerDef};

pub fn all_layers() -> &'static [&'static LayerDef] {
    &[
        &NEIGHBORHOOD,
        &ROUTES,
        &ELECTRICITY,
        &WASTE_WATER,
        &TELECOM,
        &HOUSING,
        &CLEAN_WATER,
        &SWM,
    ]
}

pub fn find_layer(id: &str) -> Option<&'static LayerDef> {
    all_layers().iter().copied().find(|def| def.id == id)
}

/// Owned configs for every built-in layer, in registry order
pub fn builtin_configs() -> Vec<LayerConfig> {
    all_layers().iter().map(|def| LayerConfig::from(*def)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_layer_ids_are_unique() {
        let ids: HashSet<&str> = all_layers().iter().map(|def| def.id).collect();
        assert_eq!(ids.len(), all_layers().len());
    }

    #[test]
    fn test_default_visibility() {
        let visible: Vec<&str> = all_layers()
            .iter()
            .filter(|def| def.visible)
            .map(|def| def.id)
            .collect();
        assert_eq!(visible, vec!["neighborhood", "routes"]);
    }

    #[test]
    fn test_builtin_config_carries_base_style() {
        let routes = LayerConfig::from(find_layer("routes").unwrap());
        assert_eq!(routes.style.dash_array.as_deref(), Some("5, 5"));
        assert_eq!(routes.style.fill_color, None);

        let configs = builtin_configs();
        assert_eq!(configs[0].id, "neighborhood");
        assert_eq!(configs[0].style.fill_color.as_deref(), Some("#E5F5E0"));
        assert!(find_layer("rivers").is_none());
    }
}
