mod macros;

pub use macros::*;

/// Returns `true` if `input` is likely to contain a template.
pub fn is_template(input: &str) -> bool {
    let mut slice = input.as_bytes();
    while let Some(i) = memchr::memchr(b'{', slice) {
        match slice.get(i + 1) {
            Some(b'{') | Some(b'%') => return true,
            Some(_) => slice = &slice[(i + 1)..],
            None => return false,
        }
    }

    false
}

/// Upper-cases the first character of `string` and lower-cases the rest.
///
/// ```rust
/// use sorting::util::capitalize;
///
/// assert_eq!(capitalize("last name"), "Last name");
/// assert_eq!(capitalize("LAST NAME"), "Last name");
/// assert_eq!(capitalize("émile"), "Émile");
/// assert_eq!(capitalize(""), "");
/// ```
pub fn capitalize(string: &str) -> String {
    let mut chars = string.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Whether `string` can name a template variable.
pub fn is_identifier(string: &str) -> bool {
    let mut chars = string.chars();
    chars.next().map_or(false, |c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_template() {
        assert!(is_template("a {{ b }}"));
        assert!(is_template("{% anchor name %}"));
        assert!(!is_template("a { b } {"));
        assert!(!is_template("plain"));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("sorted_items"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("site.items"));
        assert!(!is_identifier(""));
    }
}
