//! Slug normalization.
//!
//! Turns a post title into a lowercase, ASCII-safe, hyphen-delimited token.
//! Uniqueness against existing posts is handled by
//! [`PostService::unique_slug`](crate::services::post::PostService::unique_slug);
//! this module is the pure normalization step.

/// Fallback base when a title normalizes to nothing (e.g. all punctuation).
pub const FALLBACK_SLUG: &str = "post";

/// Fold common Latin diacritics and ligatures to ASCII.
const fn fold_diacritic(c: char) -> Option<&'static str> {
    Some(match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => "a",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'ī' => "i",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => "u",
        'ý' | 'ÿ' => "y",
        'ç' | 'ć' | 'č' => "c",
        'ñ' | 'ń' => "n",
        'š' => "s",
        'ž' => "z",
        'ł' => "l",
        'đ' => "d",
        'æ' => "ae",
        'œ' => "oe",
        'ß' => "ss",
        _ => return None,
    })
}

/// Normalize a title into a slug base.
///
/// Lowercases, folds diacritics to ASCII, drops remaining punctuation, and
/// collapses whitespace/hyphen runs into single hyphens with no leading or
/// trailing hyphen. A title that normalizes to nothing yields
/// [`FALLBACK_SLUG`] so the uniqueness search never loops on an empty base.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if let Some(folded) = fold_diacritic(c) {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push_str(folded);
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_hyphen = true;
        }
        // Remaining punctuation is dropped without becoming a separator,
        // so "Hello, World!" and "Hello World" share a slug base.
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_title() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
    }

    #[test]
    fn test_whitespace_collapses() {
        assert_eq!(slugify("  a   long\ttitle  "), "a-long-title");
    }

    #[test]
    fn test_hyphens_and_underscores_are_separators() {
        assert_eq!(slugify("rust - async_await"), "rust-async-await");
    }

    #[test]
    fn test_diacritics_fold_to_ascii() {
        assert_eq!(slugify("Café au Lait"), "cafe-au-lait");
        assert_eq!(slugify("Straße"), "strasse");
    }

    #[test]
    fn test_apostrophes_drop_without_separating() {
        assert_eq!(slugify("Don't Panic"), "dont-panic");
    }

    #[test]
    fn test_empty_title_falls_back() {
        assert_eq!(slugify(""), FALLBACK_SLUG);
        assert_eq!(slugify("   "), FALLBACK_SLUG);
        assert_eq!(slugify("!!!"), FALLBACK_SLUG);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(slugify("Same Title"), slugify("Same Title"));
    }

    #[test]
    fn test_numbers_kept() {
        assert_eq!(slugify("10 Tips for 2025"), "10-tips-for-2025");
    }
}
