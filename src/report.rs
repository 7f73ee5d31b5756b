use chrono::NaiveDate;
use log::info;
use std::collections::HashMap;
use std::fmt::Write;

use crate::error::{MapError, Result};
use crate::selection::{SelectionSet, display_name};
use crate::util::{escape_html, value_to_display};

pub const DEFAULT_TITLE: &str = "Map Report";

const REPORT_CSS: &str = r#"
    body { padding: 20px; font-family: 'Cairo', sans-serif; }
    .report-header { text-align: center; margin-bottom: 20px; }
    .report-section { margin-bottom: 30px; }
    .report-map { margin: 20px 0; text-align: center; }
    .report-footer { margin-top: 40px; text-align: center; font-size: 0.9em; color: #777; }
    .arabic { direction: rtl; text-align: right; }
    table { border-collapse: collapse; width: 100%; }
    th, td { border: 1px solid #ddd; padding: 4px 8px; vertical-align: top; }
"#;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub title: String,
    pub description: String,
    pub include_map: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            title: DEFAULT_TITLE.to_string(),
            description: String::new(),
            include_map: false,
        }
    }
}

impl ReportOptions {
    /// Blank titles fall back to the default one
    pub fn new(title: Option<&str>, description: Option<&str>, include_map: bool) -> Self {
        ReportOptions {
            title: title
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_TITLE)
                .to_string(),
            description: description.unwrap_or_default().to_string(),
            include_map,
        }
    }
}

/// Standalone HTML document listing every selected feature in pick order.
///
/// `layer_names` maps layer ids to display names; unknown ids show as-is.
pub fn build_report(
    options: &ReportOptions,
    selection: &SelectionSet,
    layer_names: &HashMap<String, String>,
    date: NaiveDate,
) -> Result<String> {
    if selection.is_empty() {
        return Err(MapError::EmptySelection);
    }

    let title = escape_html(&options.title);
    let date = date.format("%Y-%m-%d").to_string();
    let mut html = String::new();

    // Writing into a String cannot fail
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>{REPORT_CSS}</style>
</head>
<body>
<div class="container">
<div class="report-header">
<h1>{title}</h1>
<p>{description}</p>
<p><strong>Date:</strong> {date}</p>
</div>
<div class="report-section">
<h2>Selected Features</h2>
<p>Number of features: {count}</p>
<table class="report-features">
<thead><tr><th>#</th><th>Layer</th><th>Name</th><th>Properties</th></tr></thead>
<tbody>
"#,
        description = escape_html(&options.description),
        count = selection.len(),
    );

    for (index, item) in selection.iter().enumerate() {
        let layer = layer_names
            .get(&item.layer_id)
            .map(String::as_str)
            .unwrap_or(item.layer_id.as_str());
        let name = display_name(&item.properties, item.feature_id.as_ref(), index);

        let _ = writeln!(
            html,
            r#"<tr><td>{}</td><td>{}</td><td class="arabic">{}</td><td>"#,
            index + 1,
            escape_html(layer),
            escape_html(&name)
        );
        html.push_str("<table><thead><tr><th>Property</th><th>Value</th></tr></thead><tbody>\n");
        for (key, value) in item.properties.iter().filter(|(_, v)| !v.is_null()) {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td></tr>",
                escape_html(key),
                escape_html(&value_to_display(value))
            );
        }
        html.push_str("</tbody></table>\n</td></tr>\n");
    }

    html.push_str("</tbody>\n</table>\n</div>\n");

    if options.include_map {
        html.push_str(
            r#"<div class="report-section report-map">
<h2>Map View</h2>
<p>Map screenshot will be included here</p>
</div>
"#,
        );
    }

    let _ = write!(
        html,
        r#"<div class="report-footer">
<p>Generated by the damage map on {date}</p>
</div>
</div>
</body>
</html>
"#
    );

    info!("Built report '{}' with {} features", options.title, selection.len());
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;
    use serde_json::{Value, json};

    fn feature(props: Value) -> Feature {
        Feature::new(None, props.as_object().cloned().unwrap_or_default())
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_empty_selection_is_an_error() {
        let result = build_report(&ReportOptions::default(), &SelectionSet::new(), &HashMap::new(), date());
        assert!(matches!(result, Err(MapError::EmptySelection)));
    }

    #[test]
    fn test_report_lists_features_in_order() {
        let mut selection = SelectionSet::new();
        selection.toggle(
            &feature(json!({"ADM4_NAME_": "Al Waer", "power": 45, "note": null})),
            "neighborhood",
        );
        selection.toggle(&feature(json!({"name": "Main St"})), "routes");

        let mut names = HashMap::new();
        names.insert("neighborhood".to_string(), "الأحياء".to_string());

        let html = build_report(&ReportOptions::default(), &selection, &names, date()).unwrap();
        assert!(html.contains("<title>Map Report</title>"));
        assert!(html.contains("Number of features: 2"));
        assert_eq!(html.matches("2024-03-09").count(), 2);
        assert!(html.contains("الأحياء"));
        assert!(html.contains("<td>routes</td>"));
        assert!(html.contains("<tr><td>power</td><td>45</td></tr>"));
        assert!(!html.contains("note"));
        assert!(html.find("Al Waer").unwrap() < html.find("Main St").unwrap());
        assert!(!html.contains("Map View"));
    }

    #[test]
    fn test_report_escapes_text_and_includes_map() {
        let mut selection = SelectionSet::new();
        selection.toggle(&feature(json!({"name": "<b>x</b>"})), "routes");

        let options = ReportOptions::new(Some("A & B"), Some("\"quoted\""), true);
        let html = build_report(&options, &selection, &HashMap::new(), date()).unwrap();
        assert!(html.contains("<h1>A &amp; B</h1>"));
        assert!(html.contains("&quot;quoted&quot;"));
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(html.contains("Map View"));
    }

    #[test]
    fn test_blank_title_uses_default() {
        let options = ReportOptions::new(Some("  "), None, false);
        assert_eq!(options.title, DEFAULT_TITLE);
        assert_eq!(options.description, "");
    }
}
