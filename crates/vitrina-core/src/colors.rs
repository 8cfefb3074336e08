//! Fixed color table used for swatches and the color segment of generated SKUs.
//!
//! Color names are free text entered by catalog staff, so lookups never fail:
//! an unmapped name degrades to a neutral gray swatch and the reserved code
//! [`UNKNOWN_COLOR_CODE`].

/// SKU color segment for names missing from the table.
pub const UNKNOWN_COLOR_CODE: &str = "99";

/// Swatch shown for names missing from the table.
pub const UNKNOWN_COLOR_HEX: &str = "#9CA3AF";

struct ColorEntry {
    name: &'static str,
    hex: &'static str,
    code: &'static str,
}

const COLORS: &[ColorEntry] = &[
    ColorEntry { name: "Oro", hex: "#FFD700", code: "01" },
    ColorEntry { name: "Plata", hex: "#C0C0C0", code: "02" },
    ColorEntry { name: "Oro Rosa", hex: "#B76E79", code: "03" },
    ColorEntry { name: "Oro Blanco", hex: "#F5F5F0", code: "04" },
    ColorEntry { name: "Negro", hex: "#000000", code: "05" },
    ColorEntry { name: "Blanco", hex: "#FFFFFF", code: "06" },
    ColorEntry { name: "Rojo", hex: "#DC2626", code: "07" },
    ColorEntry { name: "Azul", hex: "#2563EB", code: "08" },
    ColorEntry { name: "Verde", hex: "#16A34A", code: "09" },
    ColorEntry { name: "Rosa", hex: "#F472B6", code: "10" },
    ColorEntry { name: "Morado", hex: "#7C3AED", code: "11" },
    ColorEntry { name: "Champagne", hex: "#F7E7CE", code: "12" },
    ColorEntry { name: "Bronce", hex: "#CD7F32", code: "13" },
    ColorEntry { name: "Cobre", hex: "#B87333", code: "14" },
    ColorEntry { name: "Perla", hex: "#EAE0C8", code: "15" },
];

fn lookup(name: &str) -> Option<&'static ColorEntry> {
    let name = name.trim();
    COLORS.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Display color for `name`, or [`UNKNOWN_COLOR_HEX`] when unmapped.
///
/// Matching ignores surrounding whitespace and ASCII case.
#[must_use]
pub fn hex_of(name: &str) -> &'static str {
    lookup(name).map_or(UNKNOWN_COLOR_HEX, |c| c.hex)
}

/// Two-digit SKU code for `name`, or [`UNKNOWN_COLOR_CODE`] when unmapped.
#[must_use]
pub fn code_of(name: &str) -> &'static str {
    lookup(name).map_or(UNKNOWN_COLOR_CODE, |c| c.code)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn known_colors_resolve() {
        assert_eq!(code_of("Oro"), "01");
        assert_eq!(code_of("Plata"), "02");
        assert_eq!(hex_of("Oro"), "#FFD700");
        assert_eq!(hex_of("Plata"), "#C0C0C0");
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        assert_eq!(code_of("  oro rosa "), "03");
        assert_eq!(hex_of("NEGRO"), "#000000");
    }

    #[test]
    fn unknown_color_degrades_instead_of_failing() {
        assert_eq!(code_of("Turquesa Mate"), UNKNOWN_COLOR_CODE);
        assert_eq!(hex_of("Turquesa Mate"), UNKNOWN_COLOR_HEX);
        assert_eq!(code_of(""), "99");
    }

    #[test]
    fn table_codes_are_unique_two_digit_and_never_reserved() {
        let mut seen = HashSet::new();
        for entry in COLORS {
            assert_eq!(entry.code.len(), 2, "{} has a malformed code", entry.name);
            assert!(entry.code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(entry.code, UNKNOWN_COLOR_CODE);
            assert!(seen.insert(entry.code), "duplicate code {}", entry.code);
        }
    }
}
