use crate::feature::LayerDef;
use crate::style::StylePatch;

fn neighborhood_style() -> StylePatch {
    StylePatch::new()
        .fill_color("#E5F5E0")
        .color("#31A354")
        .weight(2.0)
        .opacity(1.0)
        .fill_opacity(0.7)
}

/// Neighborhood polygons carrying the damage indicators
pub const NEIGHBORHOOD: LayerDef = LayerDef {
    id: "neighborhood",
    name: "الأحياء",
    source_file: "neighborhood.geojson",
    style_file: Some("neighborhood_style.json"),
    visible: true,
    base_style: neighborhood_style,
};
