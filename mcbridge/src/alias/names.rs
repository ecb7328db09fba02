//! Name coordination.
//!
//! When a pattern holds more than one name placeholder, all of them are derived from a single
//! synthesized base name by bounded mutation so that e.g. a first and last name look related.

use std::collections::HashMap;

use rand::prelude::RngExt;

use super::generators::{capitalize, name, pick, push_alternating};
use super::template::{DEFAULT_NAME_LENGTH, Occurrence, TokenKind};
use super::vocabulary::{CONSONANTS, VOWELS, is_vowel};

/// Generated value per distinct name occurrence, keyed by the occurrence's token text.
pub type NameAssignment<'a> = HashMap<&'a str, String>;

/// Fraction of the base name's characters rewritten for each role.
pub fn change_ratio(kind: TokenKind) -> f64 {
    match kind {
        TokenKind::FirstName => 0.3,
        TokenKind::LastName => 0.5,
        TokenKind::MiddleName => 0.7,
        TokenKind::Nickname => 0.4,
        _ => 0.2,
    }
}

/// Number of substitutions [`mutate`] performs on a name of `len` characters.
pub fn alterations(len: usize, ratio: f64) -> usize {
    (len as f64 * ratio).floor() as usize
}

/// Produce one value per occurrence.
///
/// A lone occurrence is generated directly. Two or more are mutated from a shared base name,
/// then fitted to their length qualifier when they carry one.
pub fn coordinate<'a, R: RngExt + ?Sized>(rng: &mut R, occurrences: &[Occurrence<'a>]) -> NameAssignment<'a> {
    match occurrences {
        [] => NameAssignment::new(),
        [single] => {
            let (min, max) = single.bounds();
            NameAssignment::from([(single.text, name(rng, min, max))])
        }
        many => {
            let base = name(rng, DEFAULT_NAME_LENGTH.0, DEFAULT_NAME_LENGTH.1);
            many.iter()
                .map(|occurrence| {
                    let mut value = mutate(rng, &base, change_ratio(occurrence.kind));
                    if occurrence.spec.is_some() {
                        let (min, max) = occurrence.bounds();
                        value = fit_length(rng, value, min as usize, max as usize);
                    }
                    (occurrence.text, value)
                })
                .collect()
        }
    }
}

/// Derive a variation of `base`, rewriting `floor(len * ratio)` characters within their class.
///
/// Independently, one character may be dropped (30%, only while the name stays at least three
/// long) and one opposite-class character may be inserted (30%). The first letter follows the
/// base's capitalization.
pub fn mutate<R: RngExt + ?Sized>(rng: &mut R, base: &str, ratio: f64) -> String {
    let mut bytes = base.to_ascii_lowercase().into_bytes();
    if bytes.is_empty() {
        return String::new();
    }

    let count = alterations(bytes.len(), ratio);
    substitute(rng, &mut bytes, count);

    if bytes.len() > 3 && rng.random_bool(0.3) {
        let pos = rng.random_range(0..bytes.len());
        bytes.remove(pos);
    }

    if rng.random_bool(0.3) {
        let pos = rng.random_range(0..bytes.len());
        let set = if is_vowel(char::from(bytes[pos])) { CONSONANTS } else { VOWELS };
        bytes.insert(pos, *pick(rng, set) as u8);
    }

    let mut out: String = bytes.into_iter().map(char::from).collect();
    if base.starts_with(|c: char| c.is_ascii_uppercase()) {
        capitalize(&mut out);
    }
    out
}

/// Rewrite `count` random positions, each with a different character of the same class.
fn substitute<R: RngExt + ?Sized>(rng: &mut R, bytes: &mut [u8], count: usize) {
    for _ in 0..count {
        let pos = rng.random_range(0..bytes.len());
        let current = char::from(bytes[pos]);
        let set = if is_vowel(current) { VOWELS } else { CONSONANTS };
        bytes[pos] = replace_within(rng, set, current) as u8;
    }
}

/// A member of `set` other than `current`, unless `current` is its only member.
fn replace_within<R: RngExt + ?Sized>(rng: &mut R, set: &[char], current: char) -> char {
    match set.iter().position(|&c| c == current) {
        Some(skip) if set.len() > 1 => {
            let index = rng.random_range(0..set.len() - 1);
            set[if index >= skip { index + 1 } else { index }]
        }
        Some(_) => current,
        None => *pick(rng, set),
    }
}

/// Pad or trim `value` into `[min, max]`.
///
/// Padding alternates vowels and consonants. Trimming prefers the longest cut within range that
/// falls right after a vowel and before a consonant, and otherwise cuts at `max`.
pub fn fit_length<R: RngExt + ?Sized>(rng: &mut R, mut value: String, min: usize, max: usize) -> String {
    while value.len() < min {
        push_alternating(rng, &mut value);
    }

    if value.len() > max {
        let bytes = value.as_bytes();
        let cut = (min.max(1)..=max)
            .rev()
            .find(|&i| is_vowel(char::from(bytes[i - 1])) && !is_vowel(char::from(bytes[i])))
            .unwrap_or(max);
        value.truncate(cut);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::template::{LengthSpec, name_occurrences, scan};
    use rand::{SeedableRng, rngs::StdRng};

    fn levenshtein(a: &str, b: &str) -> usize {
        let a = a.to_ascii_lowercase().into_bytes();
        let b = b.to_ascii_lowercase().into_bytes();
        let mut prev: Vec<usize> = (0..=b.len()).collect();
        for (i, ca) in a.iter().enumerate() {
            let mut row = vec![i + 1; b.len() + 1];
            for (j, cb) in b.iter().enumerate() {
                let cost = usize::from(ca != cb);
                row[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(row[j] + 1);
            }
            prev = row;
        }
        prev[b.len()]
    }

    #[test]
    fn test_levenshtein_helper() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("Anna", "anna"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
    }

    #[test]
    fn test_mutation_stays_within_edit_bound() {
        let mut rng = StdRng::seed_from_u64(11);
        for kind in [
            TokenKind::FirstName,
            TokenKind::LastName,
            TokenKind::MiddleName,
            TokenKind::Nickname,
            TokenKind::Names,
        ] {
            let ratio = change_ratio(kind);
            for _ in 0..100 {
                let base = name(&mut rng, 3, 10);
                let variant = mutate(&mut rng, &base, ratio);
                let bound = alterations(base.len(), ratio) + 2;
                assert!(
                    levenshtein(&base, &variant) <= bound,
                    "{variant} too far from {base} for {kind}"
                );
            }
        }
    }

    #[test]
    fn test_average_distance_tracks_change_ratio() {
        let mut rng = StdRng::seed_from_u64(42);
        for kind in [TokenKind::FirstName, TokenKind::LastName, TokenKind::MiddleName] {
            let ratio = change_ratio(kind);
            let runs = 100;
            let mut total = 0.0;
            for _ in 0..runs {
                let base = name(&mut rng, 3, 10);
                let variant = mutate(&mut rng, &base, ratio);
                total += levenshtein(&base, &variant) as f64;
            }
            let average = total / runs as f64;
            // Expected substitutions for a 10 character base plus the two optional edits.
            assert!(average <= 10.0 * ratio + 0.6, "average distance {average} for {kind}");
        }
    }

    #[test]
    fn test_substitution_preserves_character_class() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let base = name(&mut rng, 3, 10).to_ascii_lowercase();
            let mut bytes = base.clone().into_bytes();
            let count = bytes.len();
            substitute(&mut rng, &mut bytes, count);
            for (a, b) in base.bytes().zip(bytes) {
                assert_eq!(is_vowel(char::from(a)), is_vowel(char::from(b)));
            }
        }
    }

    #[test]
    fn test_replace_within_never_returns_current() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..500 {
            assert_ne!(replace_within(&mut rng, VOWELS, 'e'), 'e');
            assert!(VOWELS.contains(&replace_within(&mut rng, VOWELS, 'e')));
        }
        assert_eq!(replace_within(&mut rng, &['x'], 'x'), 'x');
    }

    #[test]
    fn test_mutation_follows_base_capitalization() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            let upper = mutate(&mut rng, "Marlin", 0.5);
            assert!(upper.as_bytes()[0].is_ascii_uppercase());
            assert!(upper.bytes().skip(1).all(|b| b.is_ascii_lowercase()));
            let lower = mutate(&mut rng, "marlin", 0.5);
            assert!(lower.bytes().all(|b| b.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_fit_length_pads_and_trims() {
        let mut rng = StdRng::seed_from_u64(1);
        let padded = fit_length(&mut rng, "Al".to_string(), 6, 8);
        assert_eq!(padded.len(), 6);
        assert!(padded.starts_with("Al"));

        // "Ramonita": cut after the vowel at index 3 ("Ramo|n") when asked for at most 5.
        assert_eq!(fit_length(&mut rng, "Ramonita".to_string(), 3, 5), "Ramo");
        // No vowel->consonant boundary in range: hard cut at max.
        assert_eq!(fit_length(&mut rng, "Strnkvl".to_string(), 2, 4), "Strn");
        assert_eq!(fit_length(&mut rng, "Ellen".to_string(), 3, 10), "Ellen");
    }

    #[test]
    fn test_coordinate_single_occurrence_uses_its_bounds() {
        let mut rng = StdRng::seed_from_u64(8);
        let pattern = "{lastname:4,6}@%d";
        let tokens = scan(pattern);
        let occurrences = name_occurrences(pattern, &tokens);
        for _ in 0..50 {
            let assignment = coordinate(&mut rng, &occurrences);
            let len = assignment["{lastname:4,6}"].len();
            assert!((4..=6).contains(&len));
        }
    }

    #[test]
    fn test_coordinate_many_occurrences() {
        let mut rng = StdRng::seed_from_u64(21);
        let pattern = "{firstname}.{middlename:1}.{lastname:5,7}";
        let tokens = scan(pattern);
        let occurrences = name_occurrences(pattern, &tokens);
        assert_eq!(occurrences[1].spec, Some(LengthSpec::Exact(1)));

        for _ in 0..100 {
            let assignment = coordinate(&mut rng, &occurrences);
            assert_eq!(assignment.len(), 3);
            assert!(!assignment["{firstname}"].is_empty());
            assert_eq!(assignment["{middlename:1}"].len(), 1);
            let last = assignment["{lastname:5,7}"].len();
            assert!((5..=7).contains(&last));
        }
    }

    #[test]
    fn test_coordinate_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(coordinate(&mut rng, &[]).is_empty());
    }
}
