//! Vocabulary correction for misspelled or mis-scanned terms.
//!
//! A word is replaced only when it is at least 5 characters long, within
//! edit distance 2 of exactly one vocabulary term, and neither a term nor
//! a plural of one ("walkers" stays "walkers").

const MIN_WORD_CHARS: usize = 5;
const MAX_EDIT_DISTANCE: u32 = 2;

/// Correct every word of `text` against `vocabulary`. Multi-word terms
/// are ignored; separators and casing are preserved.
pub fn correct_terms(text: &str, vocabulary: &[String]) -> String {
    let terms: Vec<String> = vocabulary
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty() && !t.contains(char::is_whitespace))
        .collect();

    let mut result = String::with_capacity(text.len());
    let mut word = String::new();

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            word.push(ch);
        } else {
            if !word.is_empty() {
                result.push_str(&correct_word(&word, &terms));
                word.clear();
            }
            result.push(ch);
        }
    }
    if !word.is_empty() {
        result.push_str(&correct_word(&word, &terms));
    }

    result
}

fn correct_word(word: &str, terms: &[String]) -> String {
    let char_count = word.chars().count();
    if char_count < MIN_WORD_CHARS {
        return word.to_string();
    }

    let lower = word.to_lowercase();
    if terms.iter().any(|t| *t == lower || is_plural_of(&lower, t)) {
        return word.to_string();
    }

    let mut best: Option<&str> = None;
    let mut best_distance = MAX_EDIT_DISTANCE + 1;
    let mut ambiguous = false;

    for term in terms {
        let len_diff = (char_count as i64 - term.chars().count() as i64).unsigned_abs();
        if len_diff > u64::from(MAX_EDIT_DISTANCE) {
            continue;
        }

        let dist = edit_distance(&lower, term);
        if dist < best_distance {
            best_distance = dist;
            best = Some(term.as_str());
            ambiguous = false;
        } else if dist == best_distance && best.is_some_and(|b| b != term.as_str()) {
            ambiguous = true;
        }
    }

    match best {
        Some(term) if !ambiguous => preserve_case(word, term),
        _ => word.to_string(),
    }
}

/// `word` is `term` + "s", `term` + "es", or `term` with a final "y" made "ies".
fn is_plural_of(word: &str, term: &str) -> bool {
    let Some(suffix) = word.strip_prefix(term) else {
        return term
            .strip_suffix('y')
            .and_then(|stem| word.strip_prefix(stem))
            .is_some_and(|rest| rest == "ies");
    };
    suffix == "s" || suffix == "es"
}

/// Carry the original word's casing (all caps, capitalised, lower) over.
fn preserve_case(original: &str, correction: &str) -> String {
    if original.chars().all(|c| c.is_uppercase() || !c.is_alphabetic()) {
        return correction.to_uppercase();
    }

    if original.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = correction.chars();
        match chars.next() {
            Some(c) => c.to_uppercase().chain(chars).collect(),
            None => correction.to_string(),
        }
    } else {
        correction.to_string()
    }
}

/// Levenshtein distance over chars.
pub fn edit_distance(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len() as u32;
    }
    if b.is_empty() {
        return a.len() as u32;
    }

    let mut prev: Vec<u32> = (0..=b.len() as u32).collect();
    let mut curr = vec![0u32; b.len() + 1];

    for (i, &ac) in a.iter().enumerate() {
        curr[0] = (i + 1) as u32;
        for (j, &bc) in b.iter().enumerate() {
            let cost = u32::from(ac != bc);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn corrects_close_misspellings() {
        let v = vocab(&["walker", "wheelchair", "rollator"]);
        assert_eq!(correct_terms("whellchair", &v), "wheelchair");
        assert_eq!(correct_terms("Rollatr and cane", &v), "Rollator and cane");
    }

    #[test]
    fn keeps_exact_terms_and_short_words() {
        let v = vocab(&["metformin", "cane"]);
        assert_eq!(correct_terms("Metformin", &v), "Metformin");
        assert_eq!(correct_terms("cans", &v), "cans");
    }

    #[test]
    fn preserves_case_pattern() {
        let v = vocab(&["metformin"]);
        assert_eq!(correct_terms("METFONNIN", &v), "METFORMIN");
        assert_eq!(correct_terms("metfonnin 500 mg", &v), "metformin 500 mg");
    }

    #[test]
    fn plurals_of_terms_are_not_reduced() {
        let v = vocab(&["cane", "walker", "crutch", "ostomy supply", "commode"]);
        assert_eq!(correct_terms("Two canes, walkers", &v), "Two canes, walkers");
        assert_eq!(correct_terms("CRUTCHES", &v), "CRUTCHES");
        assert_eq!(correct_terms("commodes", &v), "commodes");
        assert_eq!(correct_terms("walkr", &v), "walker");
    }

    #[test]
    fn plural_forms() {
        assert!(is_plural_of("walkers", "walker"));
        assert!(is_plural_of("crutches", "crutch"));
        assert!(is_plural_of("ostomies", "ostomy"));
        assert!(!is_plural_of("walker", "walker"));
        assert!(!is_plural_of("walkery", "walker"));
    }

    #[test]
    fn ambiguous_match_left_alone() {
        let v = vocab(&["walker", "talker"]);
        assert_eq!(correct_terms("xalker", &v), "xalker");
    }

    #[test]
    fn unrelated_words_untouched() {
        let v = vocab(&["lisinopril", "warfarin"]);
        assert_eq!(correct_terms("Patient lives alone", &v), "Patient lives alone");
    }

    #[test]
    fn edit_distance_basic() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("metformin", "metfonnin"), 2);
    }
}
