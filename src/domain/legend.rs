// Legend text extraction from serialized label sets

/// Returns the text strictly between the first `{` and the first `}` that
/// follows it. Nested braces are not balanced: the capture ends at the first
/// closing brace.
pub fn extract_label(label: &str) -> Option<&str> {
    let open = label.find('{')?;
    let rest = &label[open + 1..];
    let close = rest.find('}')?;
    Some(&rest[..close])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_label_set() {
        assert_eq!(
            extract_label(r#"metric_name{job="x",instance="y"}"#),
            Some(r#"job="x",instance="y""#)
        );
    }

    #[test]
    fn test_extract_label_without_braces() {
        assert_eq!(extract_label("metric_name"), None);
        assert_eq!(extract_label("metric_name{job=\"x\""), None);
        assert_eq!(extract_label("metric_name}{"), None);
    }

    #[test]
    fn test_extract_label_stops_at_first_closing_brace() {
        assert_eq!(extract_label("m{a={b}}"), Some("a={b"));
        assert_eq!(extract_label("m{a}{b}"), Some("a"));
    }

    #[test]
    fn test_extract_label_empty_set() {
        assert_eq!(extract_label("{}"), Some(""));
    }
}
