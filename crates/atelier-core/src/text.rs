//! Accent and case folding for name matching.
//!
//! Component and adjustment names are typed by hand in Spanish, so
//! "Confección", "CONFECCION" and "confeccion " must all compare equal.

/// Lowercases, trims and strips diacritics (`"Inflación" → "inflacion"`).
pub fn fold(text: &str) -> String {
    text.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(strip_diacritic)
        .collect()
}

/// True when the folded `haystack` contains the folded `needle`.
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    fold(haystack).contains(&fold(needle))
}

/// Case- and accent-insensitive equality.
pub fn same_name(a: &str, b: &str) -> bool {
    fold(a) == fold(b)
}

fn strip_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}
