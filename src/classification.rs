//! Fixed damage-severity classification shared by every monitored
//! infrastructure field.
//!
//! Each field maps a 0-100 damage indicator onto five bins. A bin's minimum
//! is inclusive and its maximum exclusive, except for the last bin which also
//! includes 100.

use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use crate::colors::UNKNOWN_GRAY;
use crate::style::LegendEntry;
use crate::util::parse_number;

/// English/Arabic label pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Label {
    pub en: &'static str,
    pub ar: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassBin {
    pub min: f64,
    pub max: f64,
    pub label: Label,
    pub color: &'static str,
}

/// Monitored field and its display name
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassField {
    pub id: &'static str,
    pub name: Label,
    pub bins: &'static [ClassBin],
}

/// Result of classifying one value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub label: Label,
    pub color: &'static str,
}

pub const UNKNOWN: Classification = Classification {
    label: Label {
        en: "Unknown",
        ar: "غير معروف",
    },
    color: UNKNOWN_GRAY,
};

pub const DAMAGE_BINS: [ClassBin; 5] = [
    ClassBin {
        min: 0.0,
        max: 20.0,
        label: Label {
            en: "No Damage",
            ar: "لا يوجد ضرر",
        },
        color: "#1a9641",
    },
    ClassBin {
        min: 20.0,
        max: 40.0,
        label: Label {
            en: "Simple Damage",
            ar: "ضرر بسيط",
        },
        color: "#a6d96a",
    },
    ClassBin {
        min: 40.0,
        max: 60.0,
        label: Label {
            en: "Damaged",
            ar: "متضرر",
        },
        color: "#ffffbf",
    },
    ClassBin {
        min: 60.0,
        max: 80.0,
        label: Label {
            en: "Severe Damage",
            ar: "ضرر شديد",
        },
        color: "#fdae61",
    },
    ClassBin {
        min: 80.0,
        max: 100.0,
        label: Label {
            en: "Destroyed",
            ar: "مدمر",
        },
        color: "#d7191c",
    },
];

pub const FIELDS: [ClassField; 7] = [
    ClassField {
        id: "OverAllIndicator",
        name: Label {
            en: "Overall Infrastructure Indicator",
            ar: "مؤشر البنية التحتية الكلي",
        },
        bins: &DAMAGE_BINS,
    },
    ClassField {
        id: "swage",
        name: Label {
            en: "Sewage System",
            ar: "شبكة الصرف الصحي",
        },
        bins: &DAMAGE_BINS,
    },
    ClassField {
        id: "telecom",
        name: Label {
            en: "Telecommunications",
            ar: "شبكة الاتصالات",
        },
        bins: &DAMAGE_BINS,
    },
    ClassField {
        id: "housing",
        name: Label {
            en: "Housing",
            ar: "المساكن",
        },
        bins: &DAMAGE_BINS,
    },
    ClassField {
        id: "waterSupply",
        name: Label {
            en: "Water Supply",
            ar: "إمدادات المياه",
        },
        bins: &DAMAGE_BINS,
    },
    ClassField {
        id: "SMW",
        name: Label {
            en: "Solid Waste Management",
            ar: "إدارة النفايات الصلبة",
        },
        bins: &DAMAGE_BINS,
    },
    ClassField {
        id: "power",
        name: Label {
            en: "Power",
            ar: "الكهرباء",
        },
        bins: &DAMAGE_BINS,
    },
];

pub fn fields() -> &'static [ClassField] {
    &FIELDS
}

pub fn find_field(id: &str) -> Option<&'static ClassField> {
    FIELDS.iter().find(|f| f.id == id)
}

/// Index of the bin holding `value`, if any
fn bin_index(bins: &[ClassBin], value: f64) -> Option<usize> {
    let last = bins.len().checked_sub(1)?;
    bins.iter().enumerate().position(|(i, bin)| {
        value >= bin.min && (value < bin.max || (i == last && value <= bin.max))
    })
}

/// Classify a numeric value of a numeric field
pub fn classify_number(field: &str, value: f64) -> Classification {
    let Some(def) = find_field(field) else {
        warn!("Field not found in classifications: {}", field);
        return UNKNOWN;
    };

    match bin_index(def.bins, value) {
        Some(idx) => {
            let bin = &def.bins[idx];
            debug!(
                "Classified {}={} as {} ({}) [Range: {}-{}]",
                field, value, bin.label.en, bin.color, bin.min, bin.max
            );
            Classification {
                label: bin.label,
                color: bin.color,
            }
        }
        None => {
            warn!("No range category found for value {} in field {}", value, field);
            UNKNOWN
        }
    }
}

/// Classify a raw property value. Missing, null and unparsable values are Unknown.
pub fn classify(field: &str, value: Option<&Value>) -> Classification {
    match value.filter(|v| !v.is_null()) {
        None => {
            debug!("Null or missing value for field: {}", field);
            if find_field(field).is_none() {
                warn!("Field not found in classifications: {}", field);
            }
            UNKNOWN
        }
        Some(v) => match parse_number(v) {
            Some(n) if !n.is_nan() => classify_number(field, n),
            _ => {
                warn!("Invalid numeric value for field {}: {}", field, v);
                UNKNOWN
            }
        },
    }
}

/// Legend rows for a field, labelled in Arabic with the percentage range.
pub fn legend(field: &str) -> Option<Vec<LegendEntry>> {
    let def = find_field(field)?;
    Some(
        def.bins
            .iter()
            .map(|bin| LegendEntry::new(format!("{} ({}-{}%)", bin.label.ar, bin.min, bin.max), bin.color))
            .collect(),
    )
}
