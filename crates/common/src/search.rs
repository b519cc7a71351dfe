//! Substring search helpers for SQL `LIKE`.

/// Builds a `%term%` pattern whose wildcards match literally.
///
/// Use with `ESCAPE '\'`.
pub fn like_contains(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
