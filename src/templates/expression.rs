//! Operator rewriting shared by engine adapters

/// Rewrite source-style operators via one left-to-right scan.
///
/// At each position the table is tried in order and the first matching
/// pattern wins, so longer operators must precede their prefixes
/// (`!==` before `!`) and identity entries can shield substrings that
/// must survive (`!=` before `!`).
pub fn rewrite_operators(expression: &str, table: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(expression.len());
    let mut rest = expression;

    'scan: while !rest.is_empty() {
        for (pattern, replacement) in table {
            if let Some(tail) = rest.strip_prefix(pattern) {
                out.push_str(replacement);
                rest = tail;
                continue 'scan;
            }
        }
        let mut chars = rest.chars();
        // Non-empty, so next() is always present.
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }

    out
}
