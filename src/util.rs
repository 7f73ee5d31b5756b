use serde_json::Value;
use std::path::Path;

/// Parse the leading decimal number of a string, ignoring trailing text.
///
/// Mirrors how the browser viewer reads property values: `"45"` and
/// `"45 %"` are both 45, while `"abc"` and `""` are not numbers.
pub fn parse_leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut end = 0;

    if end < len && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    if s[end..].starts_with("Infinity") {
        return Some(if bytes.first() == Some(&b'-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = end;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < len && bytes[end] == b'.' {
        end += 1;
        let frac_start = end;
        while end < len && bytes[end].is_ascii_digit() {
            end += 1;
        }
        digits += end - frac_start;
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when it carries digits ("1e" is just 1)
    if end < len && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < len && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < len && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Numeric reading of a GeoJSON property value.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_leading_float(s),
        _ => None,
    }
}

/// Render a property value as plain text (strings unquoted).
///
/// Floats print the way the browser viewer shows them, so `1.0` reads `1`.
pub fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) if n.is_f64() => n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Derive a layer id from a GeoJSON file path (`data/routes.geojson` -> `routes`)
pub fn layer_id_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|name| name.to_str())
        .map(|name| name.split('.').next().unwrap_or(name).to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_parse_leading_float() {
        assert_eq!(parse_leading_float("45"), Some(45.0));
        assert_eq!(parse_leading_float("  12.5abc"), Some(12.5));
        assert_eq!(parse_leading_float("-.5"), Some(-0.5));
        assert_eq!(parse_leading_float("3e2x"), Some(300.0));
        assert_eq!(parse_leading_float("7e"), Some(7.0));
        assert_eq!(parse_leading_float("abc"), None);
        assert_eq!(parse_leading_float(""), None);
        assert_eq!(parse_leading_float("."), None);
        assert_eq!(parse_leading_float("-Infinity"), Some(f64::NEG_INFINITY));
    }

    #[test]
    fn test_parse_number_by_json_type() {
        assert_eq!(parse_number(&json!(80)), Some(80.0));
        assert_eq!(parse_number(&json!("80")), Some(80.0));
        assert_eq!(parse_number(&json!(true)), None);
        assert_eq!(parse_number(&Value::Null), None);
        assert_eq!(parse_number(&json!([1])), None);
    }

    #[test]
    fn test_value_to_display() {
        assert_eq!(value_to_display(&json!("حي الوعر")), "حي الوعر");
        assert_eq!(value_to_display(&json!(12)), "12");
        assert_eq!(value_to_display(&json!(1.5)), "1.5");
        assert_eq!(value_to_display(&json!(false)), "false");
        assert_eq!(value_to_display(&json!(1.0)), "1");
        assert_eq!(value_to_display(&json!(-40.0)), "-40");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Roads" & 'bridges'</b>"#),
            "&lt;b&gt;&quot;Roads&quot; &amp; &#39;bridges&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_layer_id_from_path() {
        assert_eq!(
            layer_id_from_path(&PathBuf::from("data/routes.geojson")),
            "routes"
        );
        assert_eq!(
            layer_id_from_path(&PathBuf::from("neighborhood.v2.geojson")),
            "neighborhood"
        );
    }
}
