use rand::{rng, Rng};

/// Characters a generated shortcode is drawn from (base62)
pub const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Generates a random base62 short ID of exactly `length` characters
pub fn generate_short_id(length: usize) -> String {
    generate_short_id_with(&mut rng(), length)
}

/// Same as [`generate_short_id`] with a caller-provided random source
pub fn generate_short_id_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}
