//! Room token normalization, validation, and generation.
//!
//! Every raw token received from a guest link passes through [`normalize`]
//! before it is compared against stored rooms or requests.

use rand::Rng;

/// Prefix carried by links printed before tokens were randomized.
pub const LEGACY_PREFIX: &str = "demo-";

/// Default length of freshly generated room tokens.
pub const DEFAULT_TOKEN_LENGTH: usize = 14;

const MIN_TOKEN_LENGTH: usize = 12;
const MAX_TOKEN_LENGTH: usize = 16;

const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-";

/// Canonicalize a raw room token.
///
/// Trims whitespace, strips a case-insensitive `demo-` prefix, and trims
/// again. Empty input yields an empty string.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let has_prefix = trimmed
        .get(..LEGACY_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(LEGACY_PREFIX));

    if has_prefix {
        trimmed[LEGACY_PREFIX.len()..].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Whether `raw` normalizes to a non-empty token of `[A-Za-z0-9-]`.
#[must_use]
pub fn is_valid(raw: &str) -> bool {
    let token = normalize(raw);
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Generate a random room token.
///
/// `length` is clamped to 12..=16. Generated tokens always pass [`is_valid`].
#[must_use]
pub fn generate(length: usize) -> String {
    generate_with(&mut rand::thread_rng(), length)
}

/// Generate a token from the supplied RNG.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    let size = length.clamp(MIN_TOKEN_LENGTH, MAX_TOKEN_LENGTH);
    (0..size)
        .map(|_| char::from(TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())]))
        .collect()
}

/// Generate a token that does not collide with any token in `existing`.
pub fn generate_unique<'a, I>(length: usize, existing: I) -> String
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    loop {
        let candidate = generate(length);
        if !existing.clone().into_iter().any(|token| token == candidate) {
            return candidate;
        }
    }
}
