// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Text folding and similarity helpers shared by normalizers and validators.

/// Lowercases, strips Spanish diacritics and collapses internal whitespace.
#[must_use]
pub fn fold(value: &str) -> String {
    let mut out: String = String::with_capacity(value.len());
    for word in value.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        for c in word.chars().flat_map(char::to_lowercase) {
            out.push(fold_char(c));
        }
    }
    out
}

const fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        'º' => '°',
        other => other,
    }
}

/// Similarity ratio in `[0.0, 1.0]` between two strings after folding.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&fold(a), &fold(b))
}

/// Returns whether two strings are equal after folding.
#[must_use]
pub fn same_text(a: &str, b: &str) -> bool {
    fold(a) == fold(b)
}

const ROMAN_LEVELS: [&str; 10] = ["i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix", "x"];

/// Splits a folded course name into `(stem, roman numeral)` when it ends in I..X.
#[must_use]
pub fn split_roman_suffix(folded: &str) -> Option<(&str, &str)> {
    let (stem, last) = folded.rsplit_once(' ')?;
    ROMAN_LEVELS
        .contains(&last)
        .then_some((stem.trim_end(), last))
}
