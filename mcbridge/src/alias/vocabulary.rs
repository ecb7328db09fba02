//! Fixed word and phoneme tables used by the alias generators.
//!
//! All tables are lowercase ASCII so generated values can be sliced and re-cased byte-wise.

/// Adjectives ("qualities") for word combinations.
pub const ADJECTIVES: &[&str] = &[
    "amber", "ancient", "azure", "bold", "brave", "bright", "calm", "clever", "cosmic", "crystal", "curious", "daring", "deep",
    "eager", "elegant", "emerald", "enchanted", "energetic", "gentle", "golden", "happy", "hidden", "humble", "infinite", "jade",
    "joyful", "kind", "loyal", "lucky", "magical", "mighty", "mystic", "noble", "peaceful", "proud", "purple", "quick", "quiet",
    "radiant", "royal", "ruby", "rustic", "serene", "silent", "silver", "smooth", "solar", "swift", "tranquil", "valiant", "vibrant",
    "wild", "wise", "zealous",
];

/// Nouns ("objects") for word combinations.
pub const NOUNS: &[&str] = &[
    "apple", "arrow", "autumn", "beach", "bird", "book", "cake", "cloud", "coffee", "diamond", "dream", "eagle", "earth", "fire",
    "forest", "garden", "honey", "island", "jungle", "lake", "leaf", "lemon", "light", "lotus", "marble", "meadow", "moon",
    "mountain", "ocean", "panda", "paper", "planet", "river", "rocket", "rose", "shadow", "silver", "sky", "snow", "star", "storm",
    "summer", "sunset", "thunder", "tiger", "tree", "valley", "wave", "wind", "winter", "wolf", "zebra",
];

/// Separators used between multiple words.
pub const WORD_SEPARATORS: &[&str] = &[".", "_", "-", ""];

pub const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u'];

pub const CONSONANTS: &[char] = &[
    'b', 'c', 'd', 'f', 'g', 'h', 'j', 'k', 'l', 'm', 'n', 'p', 'q', 'r', 's', 't', 'v', 'w', 'x', 'y', 'z',
];

/// Consonants that read naturally at the end of a name. The second `t` is the one-letter form of `th`.
pub const END_CONSONANTS: &[char] = &['n', 'l', 'r', 's', 't', 'm', 't', 'y'];

/// Vowels (plus `y`) that read naturally at the end of a name.
pub const END_VOWELS: &[char] = &['a', 'e', 'i', 'o', 'y'];

/// Common English name syllables.
pub const SYLLABLES: &[&str] = &[
    "al", "an", "ar", "as", "ash", "ba", "be", "ben", "ber", "beth", "bi", "ble", "bri", "ca", "car", "ce", "cha", "che", "chi",
    "chris", "co", "con", "cy", "da", "dan", "de", "di", "do", "don", "dy", "ed", "el", "en", "er", "eth", "ey", "fa", "fe", "fi",
    "fo", "ford", "fred", "fy", "ga", "ge", "geor", "go", "gor", "ha", "han", "he", "hi", "ho", "hy", "in", "ing", "is", "ja",
    "jack", "jam", "je", "jen", "ji", "jo", "john", "jon", "ju", "ka", "ke", "ken", "ki", "kin", "la", "le", "len", "li", "lin",
    "lo", "ly", "ma", "mar", "matt", "me", "mel", "mi", "mich", "mo", "na", "ne", "ni", "nick", "no", "ny", "pa", "pe", "per",
    "phi", "pi", "po", "ra", "re", "ri", "rich", "rick", "ro", "rob", "ron", "ry", "sa", "sam", "se", "sha", "she", "si", "so",
    "son", "ste", "ster", "ston", "ta", "te", "ter", "tho", "thom", "ti", "to", "ton", "ty", "va", "ve", "vi", "vic", "vo", "wa",
    "we", "wil", "win", "wi", "ya", "ye", "yo", "za",
];

/// Common English name endings.
pub const NAME_ENDINGS: &[&str] = &[
    "a", "ah", "an", "ane", "ar", "ard", "as", "ay", "ce", "ch", "ck", "cy", "d", "dan", "don", "dy", "e", "ed", "el", "en", "er",
    "ers", "es", "ett", "ey", "feld", "ford", "fy", "h", "ia", "ian", "ie", "in", "ing", "ins", "io", "is", "ith", "le", "ley",
    "lyn", "man", "mer", "n", "na", "ne", "ner", "ney", "nie", "ny", "on", "or", "ry", "s", "son", "ston", "sy", "t", "th", "ton",
    "ty", "us", "y", "yn",
];

/// Consonant clusters that commonly start English names.
pub const INITIAL_CLUSTERS: &[&str] = &[
    "bl", "br", "ch", "cl", "cr", "dr", "fl", "fr", "gl", "gr", "pl", "pr", "sc", "sh", "sl", "sm", "sn", "sp", "st", "sw", "th",
    "tr", "tw", "wh", "wr",
];

pub const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
pub const WORD_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
pub const ALL_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789.-_";

/// Whether `c` is one of the five vowels, ignoring case.
pub fn is_vowel(c: char) -> bool {
    VOWELS.contains(&c.to_ascii_lowercase())
}
