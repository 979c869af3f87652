// PPMH CLI - Text normalization
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Text normalization into the compressor's alphabet.
//!
//! Input text is lowercased, common Latin diacritics are folded to their
//! base letter, tabs become spaces and runs of spaces collapse to one.
//! Newlines are kept. Anything else outside `a-z`, space and newline is
//! dropped.

/// UTF-8 text that was decoded as Latin-1 and re-encoded.
const MOJIBAKE: &[(&str, &str)] = &[
    ("Ã¡", "á"),
    ("Ã ", "à"),
    ("Ã¢", "â"),
    ("Ã£", "ã"),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ãª", "ê"),
    ("Ã\u{ad}", "í"),
    ("Ã³", "ó"),
    ("Ã´", "ô"),
    ("Ãµ", "õ"),
    ("Ãº", "ú"),
    ("Ã§", "ç"),
];

/// Undo the most common double-encoding damage
pub fn repair_encoding(text: &str) -> String {
    if !text.contains('Ã') {
        return text.to_string();
    }
    MOJIBAKE
        .iter()
        .fold(text.to_string(), |acc, (broken, fixed)| {
            acc.replace(broken, fixed)
        })
}

/// Fold a lowercase character to its base letter
fn fold(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        '\t' => ' ',
        c => c,
    }
}

/// Normalize text so every character is a valid symbol
pub fn normalize(text: &str) -> String {
    let repaired = repair_encoding(text);
    let mut out = String::with_capacity(repaired.len());
    let mut last_space = false;

    for c in repaired.chars().flat_map(char::to_lowercase).map(fold) {
        match c {
            'a'..='z' | '\n' => {
                out.push(c);
                last_space = false;
            }
            ' ' if !last_space => {
                out.push(' ');
                last_space = true;
            }
            _ => {}
        }
    }

    out
}
