//! Structural balance checks shared by engine adapters

use regex::Regex;

/// A paired open/close control tag counted during validation
pub struct TagPair {
    pub label: &'static str,
    open: Regex,
    close: Regex,
}

impl TagPair {
    pub fn new(label: &'static str, open: &str, close: &str) -> Self {
        // Patterns are compile-time literals supplied by the engines.
        Self {
            label,
            open: Regex::new(open).unwrap(),
            close: Regex::new(close).unwrap(),
        }
    }
}

/// Count open/close occurrences per pair and report mismatches.
pub fn check_tag_pairs(output: &str, pairs: &[TagPair]) -> Vec<String> {
    pairs
        .iter()
        .filter_map(|pair| {
            let opens = pair.open.find_iter(output).count();
            let closes = pair.close.find_iter(output).count();
            (opens != closes).then(|| {
                format!(
                    "unbalanced '{}' tags: {} opening, {} closing",
                    pair.label, opens, closes
                )
            })
        })
        .collect()
}

/// Count a delimiter pair (e.g. `{{` / `}}`) and report a mismatch.
pub fn check_delimiters(output: &str, open: &str, close: &str) -> Option<String> {
    let opens = output.matches(open).count();
    let closes = output.matches(close).count();
    (opens != closes).then(|| {
        format!("unbalanced '{open} {close}' delimiters: {opens} opening, {closes} closing")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_output_produces_no_errors() {
        let pairs = vec![TagPair::new("if", r"\{\%-?\s*if\b", r"\{\%-?\s*endif\b")];
        let output = "{% if a %}x{% endif %}{% if b %}y{% endif %}";
        assert!(check_tag_pairs(output, &pairs).is_empty());
    }

    #[test]
    fn missing_close_tag_is_reported() {
        let pairs = vec![TagPair::new("if", r"\{\%-?\s*if\b", r"\{\%-?\s*endif\b")];
        let output = "{% if a %}{% if b %}x{% endif %}";
        let errors = check_tag_pairs(output, &pairs);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("2 opening, 1 closing"));
    }

    #[test]
    fn end_tags_do_not_count_as_openers() {
        let pairs = vec![TagPair::new("if", r"\{\%-?\s*if\b", r"\{\%-?\s*endif\b")];
        assert!(check_tag_pairs("{% if a %}{% endif %}", &pairs).is_empty());
    }

    #[test]
    fn delimiter_imbalance_is_reported() {
        assert!(check_delimiters("{{ a }} {{ b", "{{", "}}").is_some());
        assert!(check_delimiters("{{ a }}", "{{", "}}").is_none());
    }
}
