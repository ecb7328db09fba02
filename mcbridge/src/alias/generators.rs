//! Primitive value generators for alias templates.
//!
//! Every generator takes the random source explicitly so expansion can be reproduced with a
//! seeded RNG in tests. Lengths are self-correcting: zero falls back to a default and anything
//! above [`MAX_LENGTH`] is clamped.

use rand::prelude::RngExt;

use super::template::{DEFAULT_CHAR_LENGTH, DEFAULT_NAME_LENGTH, MAX_LENGTH};
use super::vocabulary::{
    ADJECTIVES, ALL_CHARS, CONSONANTS, END_CONSONANTS, END_VOWELS, INITIAL_CLUSTERS, LETTERS, NAME_ENDINGS, NOUNS,
    SYLLABLES, VOWELS, WORD_CHARS, WORD_SEPARATORS, is_vowel,
};

pub(crate) fn pick<'a, T, R: RngExt + ?Sized>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

fn clamp_or(value: u32, default: u32) -> usize {
    let value = if value == 0 { default } else { value };
    value.min(MAX_LENGTH) as usize
}

/// Random combination of `count` dictionary words.
///
/// Fewer than three words may each come out as an adjective+noun compound (70%). Multiple words
/// are joined by one randomly chosen separator, possibly empty.
pub fn words<R: RngExt + ?Sized>(rng: &mut R, count: u32) -> String {
    let count = clamp_or(count, 1);

    let parts: Vec<String> = (0..count)
        .map(|_| {
            if count < 3 && rng.random_bool(0.7) {
                format!("{}{}", pick(rng, ADJECTIVES), pick(rng, NOUNS))
            } else if rng.random_bool(0.5) {
                pick(rng, ADJECTIVES).to_string()
            } else {
                pick(rng, NOUNS).to_string()
            }
        })
        .collect();

    let separator = if count > 1 { *pick(rng, WORD_SEPARATORS) } else { "" };
    parts.join(separator)
}

/// Letters and digits, starting with a letter.
pub fn word_chars<R: RngExt + ?Sized>(rng: &mut R, length: u32) -> String {
    leading_letter(rng, length, WORD_CHARS)
}

/// Letters, digits and `.-_`, starting with a letter.
pub fn chars<R: RngExt + ?Sized>(rng: &mut R, length: u32) -> String {
    leading_letter(rng, length, ALL_CHARS)
}

fn leading_letter<R: RngExt + ?Sized>(rng: &mut R, length: u32, rest: &[u8]) -> String {
    let length = clamp_or(length, DEFAULT_CHAR_LENGTH.0);
    let mut out = String::with_capacity(length);
    out.push(char::from(*pick(rng, LETTERS)));
    for _ in 1..length {
        out.push(char::from(*pick(rng, rest)));
    }
    out
}

/// A pronounceable, English-looking name with a length drawn uniformly from `[min, max]`.
pub fn name<R: RngExt + ?Sized>(rng: &mut R, min: u32, max: u32) -> String {
    let min = clamp_or(min, DEFAULT_NAME_LENGTH.0);
    let max = clamp_or(max, DEFAULT_NAME_LENGTH.1);
    let (min, max) = if min > max { (max, min) } else { (min, max) };
    let target = rng.random_range(min..=max);

    let mut out = String::with_capacity(target + 4);
    let start = rng.random::<f64>();
    if start < 0.5 {
        out.push_str(*pick(rng, SYLLABLES));
    } else if start < 0.8 {
        out.push_str(*pick(rng, INITIAL_CLUSTERS));
        out.push(*pick(rng, VOWELS));
    } else {
        out.push(*pick(rng, CONSONANTS));
        out.push(*pick(rng, VOWELS));
    }

    while out.len() + 2 < target {
        if rng.random_bool(0.6) {
            let syllable = pick(rng, SYLLABLES);
            if out.len() + syllable.len() <= target {
                out.push_str(syllable);
                continue;
            }
        }
        push_alternating(rng, &mut out);
    }

    if out.len() + 2 <= target {
        for _ in 0..5 {
            let ending = pick(rng, NAME_ENDINGS);
            if out.len() + ending.len() <= target {
                out.push_str(ending);
                break;
            }
        }
    }

    if out.len() + 1 == target {
        let tail = if ends_with_vowel(&out) { END_CONSONANTS } else { END_VOWELS };
        out.push(*pick(rng, tail));
    }

    while out.len() < target {
        push_alternating(rng, &mut out);
    }
    out.truncate(target);

    if rng.random_bool(0.7) {
        capitalize(&mut out);
    }
    out
}

/// Append a consonant after a vowel, otherwise a vowel.
pub(crate) fn push_alternating<R: RngExt + ?Sized>(rng: &mut R, out: &mut String) {
    let next = if ends_with_vowel(out) { CONSONANTS } else { VOWELS };
    out.push(*pick(rng, next));
}

fn ends_with_vowel(s: &str) -> bool {
    s.chars().last().is_some_and(is_vowel)
}

pub(crate) fn capitalize(s: &mut str) {
    if let Some(first) = s.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn test_word_chars_exact_length_and_leading_letter() {
        let mut rng = seeded();
        for length in [1, 2, 7, 16, 50] {
            let value = word_chars(&mut rng, length);
            assert_eq!(value.len(), length as usize);
            assert!(value.as_bytes()[0].is_ascii_lowercase());
            assert!(value.bytes().all(|b| WORD_CHARS.contains(&b)));
        }
    }

    #[test]
    fn test_chars_uses_punctuation_set() {
        let mut rng = seeded();
        for _ in 0..50 {
            let value = chars(&mut rng, 20);
            assert_eq!(value.len(), 20);
            assert!(value.as_bytes()[0].is_ascii_lowercase());
            assert!(value.bytes().all(|b| ALL_CHARS.contains(&b)));
        }
    }

    #[test]
    fn test_zero_and_oversized_lengths_are_corrected() {
        let mut rng = seeded();
        assert_eq!(word_chars(&mut rng, 0).len(), 10);
        assert_eq!(chars(&mut rng, 0).len(), 10);
        assert_eq!(chars(&mut rng, 10_000).len(), 50);
        assert_eq!(word_chars(&mut rng, u32::MAX).len(), 50);
    }

    #[test]
    fn test_single_word_has_no_separator() {
        let mut rng = seeded();
        for _ in 0..100 {
            let value = words(&mut rng, 1);
            assert!(value.bytes().all(|b| b.is_ascii_lowercase()), "unexpected word {value}");
        }
        assert!(!words(&mut rng, 0).is_empty());
    }

    #[test]
    fn test_many_words_draw_from_vocabulary() {
        let mut rng = seeded();
        for _ in 0..50 {
            let value = words(&mut rng, 3);
            let parts: Vec<&str> = value.split(['.', '_', '-']).collect();
            if parts.len() > 1 {
                assert_eq!(parts.len(), 3);
                for part in parts {
                    assert!(ADJECTIVES.contains(&part) || NOUNS.contains(&part), "{part} not in vocabulary");
                }
            }
        }
    }

    #[test]
    fn test_name_length_within_bounds() {
        let mut rng = seeded();
        for (min, max) in [(3, 10), (1, 1), (2, 3), (5, 5), (8, 20), (40, 50)] {
            for _ in 0..100 {
                let value = name(&mut rng, min, max);
                let len = value.len() as u32;
                assert!((min..=max).contains(&len), "{value} outside {min}..={max}");
                assert!(value.bytes().all(|b| b.is_ascii_alphabetic()));
                assert!(value.bytes().skip(1).all(|b| b.is_ascii_lowercase()));
            }
        }
    }

    #[test]
    fn test_name_swaps_inverted_bounds_and_defaults_zero() {
        let mut rng = seeded();
        for _ in 0..50 {
            let len = name(&mut rng, 9, 4).len();
            assert!((4..=9).contains(&len));
            let len = name(&mut rng, 0, 0).len();
            assert!((3..=10).contains(&len));
        }
    }

    #[test]
    fn test_name_capitalization_is_mixed() {
        let mut rng = seeded();
        let capitalized = (0..500)
            .filter(|_| name(&mut rng, 3, 10).as_bytes()[0].is_ascii_uppercase())
            .count();
        assert!((250..450).contains(&capitalized), "capitalized {capitalized}/500");
    }

    #[test]
    fn test_same_seed_same_output() {
        let a = name(&mut StdRng::seed_from_u64(7), 3, 10);
        let b = name(&mut StdRng::seed_from_u64(7), 3, 10);
        assert_eq!(a, b);
    }
}
