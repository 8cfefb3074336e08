use std::sync::LazyLock;

use regex::Regex;

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));

/// Generate a URL-safe slug from a product name.
///
/// Spanish accented letters fold to ASCII, other non-ASCII characters are
/// dropped, spaces become dashes and runs of dashes collapse, e.g.
/// `"Anillo  Corazón"` becomes `"anillo-corazon"`.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(fold_accent)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else if c == ' ' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Check that `slug` is lowercase ASCII alphanumerics separated by single dashes.
///
/// # Errors
///
/// Returns a human-readable reason when the slug is empty or malformed.
pub fn validate_slug(slug: &str) -> Result<(), String> {
    if slug.is_empty() {
        return Err("slug must be non-empty".to_string());
    }
    if !SLUG_RE.is_match(slug) {
        return Err(format!(
            "slug '{slug}' must contain only lowercase letters, digits and single dashes"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_simple_name() {
        assert_eq!(slugify("Anillo Solitario"), "anillo-solitario");
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Aretes -- Perla  "), "aretes-perla");
    }

    #[test]
    fn slugify_strips_punctuation() {
        assert_eq!(slugify("Collar Señora's"), "collar-senoras");
    }

    #[test]
    fn slugify_folds_spanish_accents() {
        assert_eq!(slugify("Anillo Corazón"), "anillo-corazon");
        assert_eq!(slugify("ÁRETES PINGÜINO Ñandú"), "aretes-pinguino-nandu");
    }

    #[test]
    fn slugify_drops_other_scripts() {
        assert_eq!(slugify("Dije 翡翠"), "dije");
    }

    #[test]
    fn validate_accepts_slugify_output() {
        assert!(validate_slug(&slugify("Pulsera Tenis 14k")).is_ok());
    }

    #[test]
    fn validate_rejects_empty() {
        let err = validate_slug("").unwrap_err();
        assert!(err.contains("non-empty"));
    }

    #[test]
    fn validate_rejects_malformed() {
        for bad in ["Anillo", "anillo--oro", "-anillo", "anillo-", "anillo oro", "añillo"] {
            assert!(validate_slug(bad).is_err(), "{bad} should be rejected");
        }
    }
}
