//! Slug derivation.

/// Derive a URL-friendly slug from a title or name.
///
/// Non-ASCII text is transliterated first (`é` becomes `e`, `ß` becomes `ss`).
/// ASCII letters and digits are then lowercased and kept, underscores are kept,
/// and every run of whitespace or hyphens collapses into a single `-`.
/// Everything else is dropped. Leading and trailing `-`/`_` are trimmed, so the
/// result may be empty for input made only of punctuation.
#[must_use]
pub fn slugify(value: &str) -> String {
    let ascii = deunicode::deunicode(value);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_separator = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_separator = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Whether `value` is already a well-formed slug.
#[must_use]
pub fn is_valid_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_title() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Test Post"), "test-post");
        assert_eq!(slugify("Technology"), "technology");
    }

    #[test]
    fn test_slugify_punctuation_dropped() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("Rust & Django: a comparison"), "rust-django-a-comparison");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  a -- b  "), "a-b");
        assert_eq!(slugify("one\t\ttwo"), "one-two");
    }

    #[test]
    fn test_slugify_keeps_underscores_inside() {
        assert_eq!(slugify("snake_case title"), "snake_case-title");
        assert_eq!(slugify("_private_"), "private");
    }

    #[test]
    fn test_slugify_transliterates_accents() {
        assert_eq!(slugify("Crème Brûlée Café"), "creme-brulee-cafe");
        assert_eq!(slugify("Straße"), "strasse");
        assert_eq!(slugify("Ångström über alles"), "angstrom-uber-alles");
    }

    #[test]
    fn test_slugify_non_latin_script_is_not_dropped() {
        let slug = slugify("日本語");
        assert!(is_valid_slug(&slug));
    }

    #[test]
    fn test_slugify_punctuation_only_is_empty() {
        assert_eq!(slugify("?!?"), "");
        assert_eq!(slugify("*** --- ***"), "");
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("hello-world"));
        assert!(is_valid_slug("post_2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Hello"));
        assert!(!is_valid_slug("a b"));
    }
}
