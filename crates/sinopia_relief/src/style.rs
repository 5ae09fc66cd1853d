//! Inline `style` attribute declarations.

use compact_str::CompactString;

/// Parse `"color: red; width: 10px"` into ordered `(property, value)` pairs.
///
/// Declarations without a colon or with an empty property are dropped.
pub fn parse_style(style: &str) -> Vec<(CompactString, CompactString)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            let property = property.trim();
            if property.is_empty() {
                return None;
            }
            Some((property.into(), value.trim().into()))
        })
        .collect()
}

/// Serialize declarations back into a `style` attribute value.
pub fn serialize_style(declarations: &[(CompactString, CompactString)]) -> CompactString {
    let mut out = CompactString::default();
    for (i, (property, value)) in declarations.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        out.push_str(property);
        out.push_str(": ");
        out.push_str(value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_style() {
        let parsed = parse_style(" color : red ;; width:10px; bogus ");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], ("color".into(), "red".into()));
        assert_eq!(parsed[1], ("width".into(), "10px".into()));
    }

    #[test]
    fn test_url_values_keep_colons() {
        let parsed = parse_style("background: url(http://x/y.png)");
        assert_eq!(parsed[0].1, "url(http://x/y.png)");
    }

    #[test]
    fn test_serialize_style() {
        let declarations: Vec<(CompactString, CompactString)> =
            vec![("color".into(), "red".into()), ("top".into(), "0".into())];
        assert_eq!(serialize_style(&declarations), "color: red; top: 0");
    }
}
