//! Alias template engine.
//!
//! A configured pattern such as `{firstname}.{lastname}@%d` is parsed once at startup into an
//! [`AliasTemplate`] and expanded for every request. Expansion runs in fixed stages: name
//! placeholders are generated first (coordinated when there are several), then length-qualified
//! tokens, then bare tokens, and the domain marker is substituted last.

pub mod generators;
pub mod names;
pub mod template;
pub mod vocabulary;

use rand::prelude::RngExt;
use thiserror::Error;

use template::{DOMAIN_MARKER, Token, TokenKind, name_occurrences, scan};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("address and pattern must be set")]
    MissingInput,
    #[error("invalid address format: {0}")]
    InvalidAddress(String),
}

/// A parsed alias pattern.
#[derive(Debug, Clone)]
pub struct AliasTemplate {
    pattern: String,
    tokens: Vec<Token>,
}

impl AliasTemplate {
    pub fn parse(pattern: impl Into<String>) -> Result<Self, GenerationError> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(GenerationError::MissingInput);
        }
        let tokens = scan(&pattern);
        Ok(Self { pattern, tokens })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Expand the pattern for the mailbox `address`.
    pub fn expand<R: RngExt + ?Sized>(&self, rng: &mut R, address: &str) -> Result<String, GenerationError> {
        if address.is_empty() {
            return Err(GenerationError::MissingInput);
        }
        let domain = domain_of(address)?;

        let mut values: Vec<Option<String>> = vec![None; self.tokens.len()];

        let occurrences = name_occurrences(&self.pattern, &self.tokens);
        let assigned = names::coordinate(rng, &occurrences);
        for (slot, token) in values.iter_mut().zip(&self.tokens) {
            if token.kind.is_name() {
                *slot = assigned.get(token.text(&self.pattern)).cloned();
            }
        }

        for qualified in [true, false] {
            for (slot, token) in values.iter_mut().zip(&self.tokens) {
                if slot.is_none() && token.is_qualified() == qualified {
                    *slot = Some(generate(rng, token));
                }
            }
        }

        let mut alias = String::with_capacity(self.pattern.len() * 2);
        let mut cursor = 0;
        for (token, value) in self.tokens.iter().zip(values) {
            alias.push_str(&self.pattern[cursor..token.span.start]);
            alias.push_str(&value.unwrap_or_default());
            cursor = token.span.end;
        }
        alias.push_str(&self.pattern[cursor..]);

        // The marker is resolved last, so a `%` next to a value starting with `d` also counts.
        Ok(alias.replace(DOMAIN_MARKER, domain))
    }
}

fn generate<R: RngExt + ?Sized>(rng: &mut R, token: &Token) -> String {
    let (min, max) = token.bounds();
    match token.kind {
        // Word ranges use their lower bound as the count.
        TokenKind::Words => generators::words(rng, min),
        TokenKind::WordChars => {
            let length = rng.random_range(min..=max);
            generators::word_chars(rng, length)
        }
        TokenKind::Chars => {
            let length = rng.random_range(min..=max);
            generators::chars(rng, length)
        }
        _ => generators::name(rng, min, max),
    }
}

/// The part of `address` after its single `@`.
pub fn domain_of(address: &str) -> Result<&str, GenerationError> {
    match address.split_once('@') {
        Some((_, domain)) if !domain.contains('@') => Ok(domain),
        _ => Err(GenerationError::InvalidAddress(address.to_string())),
    }
}

/// Expand `pattern` for `address` using the thread-local RNG.
pub fn generate_alias(address: &str, pattern: &str) -> Result<String, GenerationError> {
    if address.is_empty() || pattern.is_empty() {
        return Err(GenerationError::MissingInput);
    }
    AliasTemplate::parse(pattern)?.expand(&mut rand::rng(), address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn alphabetic(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphabetic())
    }

    #[test]
    fn test_default_pattern_shape() {
        for _ in 0..200 {
            let alias = generate_alias("user@example.com", "{firstname}.{lastname}@%d").unwrap();
            let (local, domain) = alias.split_once('@').unwrap();
            assert_eq!(domain, "example.com");
            let (first, last) = local.split_once('.').unwrap();
            assert!(alphabetic(first) && alphabetic(last), "unexpected alias {alias}");
        }
    }

    #[test]
    fn test_bad_address_is_rejected() {
        for address in ["bad-address", "a@b@c", "@@"] {
            assert_eq!(
                generate_alias(address, "{words}@%d"),
                Err(GenerationError::InvalidAddress(address.to_string()))
            );
        }
        assert_eq!(generate_alias("", "{words}"), Err(GenerationError::MissingInput));
        assert_eq!(generate_alias("user@example.com", ""), Err(GenerationError::MissingInput));
        assert!(AliasTemplate::parse("").is_err());
    }

    #[test]
    fn test_word_chars_exact_length() {
        let template = AliasTemplate::parse("x{word-chars:8}y@%d").unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let alias = template.expand(&mut rng, "me@mail.test").unwrap();
            let value = &alias[1..9];
            assert_eq!(&alias[9..], "y@mail.test");
            assert!(value.as_bytes()[0].is_ascii_alphabetic());
            assert!(value.bytes().all(|b| b.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_chars_range_is_normalized() {
        let template = AliasTemplate::parse("{chars:12,4}@%d").unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            let alias = template.expand(&mut rng, "me@mail.test").unwrap();
            let (value, domain) = alias.split_once('@').unwrap();
            assert_eq!(domain, "mail.test");
            assert!((4..=12).contains(&value.len()), "{value}");
            assert!(value.as_bytes()[0].is_ascii_alphabetic());
        }
    }

    #[test]
    fn test_domain_marker_substituted_everywhere() {
        let template = AliasTemplate::parse("{names}.%d@%d").unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let alias = template.expand(&mut rng, "me@example.org").unwrap();
        assert!(alias.ends_with(".example.org@example.org"), "{alias}");
        assert!(!alias.contains(DOMAIN_MARKER));
    }

    #[test]
    fn test_domain_marker_formed_across_generated_value() {
        let template = AliasTemplate::parse("x%{chars:1}@%d").unwrap();
        let mut joined = 0;
        for seed in 0..2000 {
            let alias = template.expand(&mut StdRng::seed_from_u64(seed), "me@example.org").unwrap();
            assert!(!alias.contains(DOMAIN_MARKER), "{alias}");
            assert!(alias.ends_with("@example.org"), "{alias}");
            if alias == "xexample.org@example.org" {
                joined += 1;
            }
        }
        assert!(joined > 0);
    }

    #[test]
    fn test_no_placeholders_remain() {
        let template =
            AliasTemplate::parse("{words}-{words:2}.{word-chars}{chars}{nickname:3,5}{middlename}@%d").unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..50 {
            let alias = template.expand(&mut rng, "me@example.org").unwrap();
            assert!(!alias.contains('{') && !alias.contains('}'), "{alias}");
            assert!(alias.ends_with("@example.org"));
        }
    }

    #[test]
    fn test_unknown_placeholders_pass_through() {
        let template = AliasTemplate::parse("{unknown}.{chars:x}.{words:3}@%d").unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let alias = template.expand(&mut rng, "me@example.org").unwrap();
        assert!(alias.starts_with("{unknown}.{chars:x}."), "{alias}");
        assert!(!alias.contains("{words"));
    }

    #[test]
    fn test_repeated_name_placeholder_reuses_value() {
        let template = AliasTemplate::parse("{firstname}+{firstname}@%d").unwrap();
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..20 {
            let alias = template.expand(&mut rng, "me@example.org").unwrap();
            let (local, _) = alias.split_once('@').unwrap();
            let (a, b) = local.split_once('+').unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_seeded_expansion_is_reproducible() {
        let template = AliasTemplate::parse("{firstname}.{lastname}.{chars:6}@%d").unwrap();
        let a = template.expand(&mut StdRng::seed_from_u64(99), "me@example.org").unwrap();
        let b = template.expand(&mut StdRng::seed_from_u64(99), "me@example.org").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_pattern_without_marker_is_kept() {
        let template = AliasTemplate::parse("static-{word-chars:3}").unwrap();
        let alias = template.expand(&mut StdRng::seed_from_u64(7), "me@example.org").unwrap();
        assert!(alias.starts_with("static-"));
        assert_eq!(alias.len(), "static-".len() + 3);
    }
}
