//! Placeholder scanning for alias patterns.
//!
//! A pattern is literal text interleaved with tokens of the form `{type}`, `{type:N}` or
//! `{type:N,M}`. Anything in braces that does not name a known type, or whose qualifier is not
//! made of decimal digits, is not a token and passes through as literal text.

use std::fmt;
use std::ops::Range;

/// Marker replaced with the caller's mail domain.
pub const DOMAIN_MARKER: &str = "%d";

/// Hard ceiling for any requested length or word count.
pub const MAX_LENGTH: u32 = 50;

/// Default bounds per token family, as `(min, max)`.
pub const DEFAULT_WORD_COUNT: (u32, u32) = (1, 1);
pub const DEFAULT_CHAR_LENGTH: (u32, u32) = (10, 10);
pub const DEFAULT_NAME_LENGTH: (u32, u32) = (3, 10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Words,
    WordChars,
    Chars,
    Names,
    FirstName,
    LastName,
    MiddleName,
    Nickname,
}

impl TokenKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "words" => Self::Words,
            "word-chars" => Self::WordChars,
            "chars" => Self::Chars,
            "names" => Self::Names,
            "firstname" => Self::FirstName,
            "lastname" => Self::LastName,
            "middlename" => Self::MiddleName,
            "nickname" => Self::Nickname,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Words => "words",
            Self::WordChars => "word-chars",
            Self::Chars => "chars",
            Self::Names => "names",
            Self::FirstName => "firstname",
            Self::LastName => "lastname",
            Self::MiddleName => "middlename",
            Self::Nickname => "nickname",
        }
    }

    /// Name-type tokens take part in coordination.
    pub fn is_name(self) -> bool {
        matches!(
            self,
            Self::Names | Self::FirstName | Self::LastName | Self::MiddleName | Self::Nickname
        )
    }

    pub fn default_bounds(self) -> (u32, u32) {
        match self {
            Self::Words => DEFAULT_WORD_COUNT,
            Self::WordChars | Self::Chars => DEFAULT_CHAR_LENGTH,
            _ => DEFAULT_NAME_LENGTH,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Length qualifier attached to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthSpec {
    Exact(u32),
    Range(u32, u32),
}

impl LengthSpec {
    /// Build a range, swapping the bounds when given in the wrong order.
    pub fn range(a: u32, b: u32) -> Self {
        if a > b { Self::Range(b, a) } else { Self::Range(a, b) }
    }

    /// Inclusive `(min, max)` bounds for this qualifier.
    ///
    /// A zero exact length or a zero upper bound falls back to `default`; a zero lower bound is
    /// raised to one. Both bounds are clamped to [`MAX_LENGTH`].
    pub fn bounds(self, default: (u32, u32)) -> (u32, u32) {
        let (min, max) = match self {
            Self::Exact(0) | Self::Range(_, 0) => return default,
            Self::Exact(n) => (n, n),
            Self::Range(min, max) => (min.max(1), max),
        };
        (min.min(MAX_LENGTH), max.min(MAX_LENGTH))
    }
}

/// One recognized placeholder in a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Byte range of the whole token, braces included.
    pub span: Range<usize>,
    pub kind: TokenKind,
    pub spec: Option<LengthSpec>,
}

impl Token {
    pub fn text<'a>(&self, pattern: &'a str) -> &'a str {
        &pattern[self.span.clone()]
    }

    pub fn is_qualified(&self) -> bool {
        self.spec.is_some()
    }

    /// Effective bounds, falling back to the kind's defaults.
    pub fn bounds(&self) -> (u32, u32) {
        resolve_bounds(self.kind, self.spec)
    }
}

/// A distinct name placeholder of a pattern, identified by its literal token text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence<'a> {
    pub text: &'a str,
    pub kind: TokenKind,
    pub spec: Option<LengthSpec>,
}

impl Occurrence<'_> {
    pub fn bounds(&self) -> (u32, u32) {
        resolve_bounds(self.kind, self.spec)
    }
}

fn resolve_bounds(kind: TokenKind, spec: Option<LengthSpec>) -> (u32, u32) {
    let default = kind.default_bounds();
    spec.map_or(default, |spec| spec.bounds(default))
}

/// Scan `pattern` left to right and return every recognized token in order.
pub fn scan(pattern: &str) -> Vec<Token> {
    let bytes = pattern.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(offset) = pattern[pos..].find('{') {
        let start = pos + offset;
        let Some(len) = pattern[start + 1..].find(['{', '}']) else {
            break;
        };
        let end = start + 1 + len;

        // Another opening brace before the closing one: restart from it.
        if bytes[end] == b'{' {
            pos = end;
            continue;
        }

        match parse_body(&pattern[start + 1..end]) {
            Some((kind, spec)) => {
                tokens.push(Token {
                    span: start..end + 1,
                    kind,
                    spec,
                });
                pos = end + 1;
            }
            None => pos = start + 1,
        }
    }

    tokens
}

fn parse_body(body: &str) -> Option<(TokenKind, Option<LengthSpec>)> {
    let (name, qualifier) = match body.split_once(':') {
        Some((name, qualifier)) => (name, Some(qualifier)),
        None => (body, None),
    };
    let kind = TokenKind::from_name(name)?;

    let spec = match qualifier {
        None => None,
        Some(qualifier) => Some(match qualifier.split_once(',') {
            Some((min, max)) => LengthSpec::range(parse_number(min)?, parse_number(max)?),
            None => LengthSpec::Exact(parse_number(qualifier)?),
        }),
    };

    Some((kind, spec))
}

fn parse_number(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(
        digits
            .bytes()
            .fold(0u32, |acc, b| acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))),
    )
}

/// Distinct name-type occurrences, in order of first appearance.
///
/// Bare and qualified forms of the same type are separate occurrences, as are two qualified
/// forms with different qualifiers.
pub fn name_occurrences<'a>(pattern: &'a str, tokens: &[Token]) -> Vec<Occurrence<'a>> {
    let mut occurrences: Vec<Occurrence<'a>> = Vec::new();
    for token in tokens.iter().filter(|t| t.kind.is_name()) {
        let text = token.text(pattern);
        if occurrences.iter().any(|o| o.text == text) {
            continue;
        }
        occurrences.push(Occurrence {
            text,
            kind: token.kind,
            spec: token.spec,
        });
    }
    occurrences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(pattern: &str) -> Vec<(TokenKind, Option<LengthSpec>)> {
        scan(pattern).into_iter().map(|t| (t.kind, t.spec)).collect()
    }

    #[test]
    fn test_scan_bare_and_qualified_tokens() {
        let pattern = "{firstname}.{lastname:4,8}-{chars:6}@%d";
        let tokens = scan(pattern);

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text(pattern), "{firstname}");
        assert_eq!(tokens[1].text(pattern), "{lastname:4,8}");
        assert_eq!(tokens[2].text(pattern), "{chars:6}");
        assert_eq!(tokens[1].spec, Some(LengthSpec::Range(4, 8)));
        assert_eq!(tokens[2].spec, Some(LengthSpec::Exact(6)));
        assert!(!tokens[0].is_qualified());
    }

    #[test]
    fn test_scan_swaps_inverted_range() {
        assert_eq!(kinds("{word-chars:9,3}"), vec![(TokenKind::WordChars, Some(LengthSpec::Range(3, 9)))]);
    }

    #[test]
    fn test_unknown_and_malformed_tokens_are_literal() {
        assert!(scan("{unknown}").is_empty());
        assert!(scan("{chars:}").is_empty());
        assert!(scan("{chars:a}").is_empty());
        assert!(scan("{chars:1,}").is_empty());
        assert!(scan("{Words}").is_empty());
        assert!(scan("{words").is_empty());
        assert!(scan("words}").is_empty());
    }

    #[test]
    fn test_scan_restarts_at_inner_brace() {
        let pattern = "{{words}}";
        let tokens = scan(pattern);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].span, 1..8);
    }

    #[test]
    fn test_scan_handles_multibyte_literals() {
        let pattern = "ü{names}ß";
        let tokens = scan(pattern);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text(pattern), "{names}");
    }

    #[test]
    fn test_huge_qualifier_saturates() {
        assert_eq!(kinds("{chars:99999999999}"), vec![(TokenKind::Chars, Some(LengthSpec::Exact(u32::MAX)))]);
    }

    #[test]
    fn test_bounds_defaults_and_clamping() {
        assert_eq!(LengthSpec::Exact(0).bounds(DEFAULT_CHAR_LENGTH), (10, 10));
        assert_eq!(LengthSpec::Exact(7).bounds(DEFAULT_CHAR_LENGTH), (7, 7));
        assert_eq!(LengthSpec::Exact(500).bounds(DEFAULT_CHAR_LENGTH), (50, 50));
        assert_eq!(LengthSpec::range(0, 5).bounds(DEFAULT_NAME_LENGTH), (1, 5));
        assert_eq!(LengthSpec::range(0, 0).bounds(DEFAULT_NAME_LENGTH), (3, 10));
        assert_eq!(LengthSpec::range(60, 80).bounds(DEFAULT_NAME_LENGTH), (50, 50));
    }

    #[test]
    fn test_name_occurrences_are_distinct_by_text() {
        let pattern = "{firstname}{firstname:4}{firstname}{lastname}{chars}{names:2,5}";
        let tokens = scan(pattern);
        let occurrences = name_occurrences(pattern, &tokens);

        let texts: Vec<_> = occurrences.iter().map(|o| o.text).collect();
        assert_eq!(texts, vec!["{firstname}", "{firstname:4}", "{lastname}", "{names:2,5}"]);
        assert_eq!(occurrences[1].bounds(), (4, 4));
        assert_eq!(occurrences[2].bounds(), DEFAULT_NAME_LENGTH);
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in [
            TokenKind::Words,
            TokenKind::WordChars,
            TokenKind::Chars,
            TokenKind::Names,
            TokenKind::FirstName,
            TokenKind::LastName,
            TokenKind::MiddleName,
            TokenKind::Nickname,
        ] {
            assert_eq!(TokenKind::from_name(kind.as_str()), Some(kind));
        }
    }
}
