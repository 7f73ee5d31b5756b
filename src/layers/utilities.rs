use crate::feature::LayerDef;
use crate::style::StylePatch;

// Utility networks share one shape: a pale fill, a darker outline of the same hue.
fn utility_style(fill: &str, stroke: &str) -> StylePatch {
    StylePatch::new()
        .fill_color(fill)
        .color(stroke)
        .weight(1.0)
        .opacity(1.0)
        .fill_opacity(0.7)
}

fn electricity_style() -> StylePatch {
    utility_style("#FFEDA0", "#FEB24C")
}

fn waste_water_style() -> StylePatch {
    utility_style("#BFD3E6", "#6BAED6")
}

fn telecom_style() -> StylePatch {
    utility_style("#EFEDF5", "#9E9AC8")
}

fn housing_style() -> StylePatch {
    utility_style("#FEE0D2", "#FC9272")
}

fn clean_water_style() -> StylePatch {
    utility_style("#D1E5F0", "#4292C6")
}

fn swm_style() -> StylePatch {
    utility_style("#E5F5E0", "#41AB5D")
}

pub const ELECTRICITY: LayerDef = LayerDef {
    id: "electricity",
    name: "الكهرباء",
    source_file: "electricity.geojson",
    style_file: Some("electricity_style.json"),
    visible: false,
    base_style: electricity_style,
};

pub const WASTE_WATER: LayerDef = LayerDef {
    id: "waste_water",
    name: "الصرف الصحي",
    source_file: "waste_water.geojson",
    style_file: Some("waste_water_style.json"),
    visible: false,
    base_style: waste_water_style,
};

pub const TELECOM: LayerDef = LayerDef {
    id: "telecom",
    name: "الاتصالات",
    source_file: "telecom.geojson",
    style_file: Some("telecom_style.json"),
    visible: false,
    base_style: telecom_style,
};

pub const HOUSING: LayerDef = LayerDef {
    id: "housing",
    name: "المساكن",
    source_file: "housing.geojson",
    style_file: Some("housing_style.json"),
    visible: false,
    base_style: housing_style,
};

pub const CLEAN_WATER: LayerDef = LayerDef {
    id: "clean_water",
    name: "مياه الشرب",
    source_file: "clean_water.geojson",
    style_file: Some("clean_water_style.json"),
    visible: false,
    base_style: clean_water_style,
};

pub const SWM: LayerDef = LayerDef {
    id: "swm",
    name: "إدارة النفايات الصلبة",
    source_file: "swm.geojson",
    style_file: Some("swm_style.json"),
    visible: false,
    base_style: swm_style,
};
