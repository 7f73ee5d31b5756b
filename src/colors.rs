//! Color constants and thematic color ramps
//!
//! Thematic ramps (five classes each, light to dark):
//! Name   | Ramp
//! -------|-------------------------------------------------
//! green  | #edf8e9 #c7e9c0 #a1d99b #74c476 #31a354
//! blue   | #eff3ff #c6dbef #9ecae1 #6baed6 #3182bd
//! red    | #fee5d9 #fcbba1 #fc9272 #fb6a4a #de2d26
//! purple | #f2f0f7 #dadaeb #bcbddc #9e9ac8 #756bb1
//! orange | #feedde #fdbe85 #fd8d3c #e6550d #a63603

/// Border color used by thematic and classification modes
pub const NEUTRAL_BORDER: &str = "#333";

/// Selection highlight for both stroke and fill
pub const HIGHLIGHT: &str = "#ffff00";

/// Fill for features whose classification value cannot be read
pub const UNKNOWN_GRAY: &str = "#999999";

/// Fill for features lacking the classification field altogether
pub const MISSING_GRAY: &str = "#cccccc";

const GREEN: [&str; 5] = ["#edf8e9", "#c7e9c0", "#a1d99b", "#74c476", "#31a354"];
const BLUE: [&str; 5] = ["#eff3ff", "#c6dbef", "#9ecae1", "#6baed6", "#3182bd"];
const RED: [&str; 5] = ["#fee5d9", "#fcbba1", "#fc9272", "#fb6a4a", "#de2d26"];
const PURPLE: [&str; 5] = ["#f2f0f7", "#dadaeb", "#bcbddc", "#9e9ac8", "#756bb1"];
const ORANGE: [&str; 5] = ["#feedde", "#fdbe85", "#fd8d3c", "#e6550d", "#a63603"];

/// Named thematic color ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Green,
    Blue,
    Red,
    Purple,
    Orange,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 5] = [
        ColorScheme::Green,
        ColorScheme::Blue,
        ColorScheme::Red,
        ColorScheme::Purple,
        ColorScheme::Orange,
    ];

    /// Look up a ramp by name. Unknown names fall back to green.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "green" => ColorScheme::Green,
            "blue" => ColorScheme::Blue,
            "red" => ColorScheme::Red,
            "purple" => ColorScheme::Purple,
            "orange" => ColorScheme::Orange,
            _ => ColorScheme::Green,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorScheme::Green => "green",
            ColorScheme::Blue => "blue",
            ColorScheme::Red => "red",
            ColorScheme::Purple => "purple",
            ColorScheme::Orange => "orange",
        }
    }

    pub fn palette(self) -> &'static [&'static str; 5] {
        match self {
            ColorScheme::Green => &GREEN,
            ColorScheme::Blue => &BLUE,
            ColorScheme::Red => &RED,
            ColorScheme::Purple => &PURPLE,
            ColorScheme::Orange => &ORANGE,
        }
    }

    /// Color for class `index`, cycling through the ramp
    pub fn color_at(self, index: usize) -> &'static str {
        let palette = self.palette();
        palette[index % palette.len()]
    }
}
