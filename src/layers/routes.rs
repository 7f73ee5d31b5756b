use crate::feature::LayerDef;
use crate::style::StylePatch;

fn routes_style() -> StylePatch {
    StylePatch::new()
        .color("#636363")
        .weight(1.5)
        .dash_array("5, 5")
        .opacity(0.7)
}

pub const ROUTES: LayerDef = LayerDef {
    id: "routes",
    name: "الطرق",
    source_file: "routes.geojson",
    style_file: Some("routes_style.json"),
    visible: true,
    base_style: routes_style,
};
