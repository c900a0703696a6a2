//! Region name normalization.
//!
//! Source sheets spell the same area differently between releases
//! (`"HARTLEPOOL "`, `"Hartlepool"`). Names are canonicalized before they
//! are used for display, dropdowns, or name-based lookups. Region codes are
//! never passed through here; they are exact-match keys.

/// Canonicalizes a free-text region name.
///
/// The pipeline:
/// 1. Trim surrounding whitespace
/// 2. Lowercase
/// 3. Uppercase every letter that does not follow another letter
///
/// Step 3 treats any non-letter as a word boundary, so
/// `"stockton-on-tees"` becomes `"Stockton-On-Tees"` and `"king's lynn"`
/// becomes `"King'S Lynn"`, matching the names in the published tidy
/// files. Applying the function twice gives the same result as once.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut prev_is_letter = false;

    for c in lower.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.push(c);
            } else {
                out.push(single_uppercase(c));
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }

    out
}

/// Uppercases `c` when it maps to exactly one character. Letters like `ß`
/// expand to several (`SS`), which would lowercase differently on the next
/// pass, so they are left alone.
fn single_uppercase(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

/// Returns `true` if two names refer to the same region once normalized.
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    normalize_name(a) == normalize_name(b)
}
