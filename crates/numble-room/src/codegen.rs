//! Random room codes and secrets.
//!
//! The `_with` variants take the randomness source explicitly so tests can
//! use a seeded generator. The plain variants use the thread-local RNG;
//! none of these functions hold it across an `.await`.

use numble_protocol::{ROOM_CODE_ALPHABET, ROOM_CODE_LEN};
use rand::Rng;
use rand::seq::SliceRandom;

/// Draws a room code uniformly from `[A-Z0-9]{6}`.
pub fn generate_room_code() -> String {
    generate_room_code_with(&mut rand::rng())
}

/// [`generate_room_code`] with a caller-supplied RNG.
pub fn generate_room_code_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ROOM_CODE_LEN)
        .map(|_| char::from(ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())]))
        .collect()
}

/// Draws a secret of `digit_count` decimal digits.
///
/// Without duplicates the digits are sampled without replacement, so
/// `digit_count` is capped at 10.
pub fn generate_secret(digit_count: usize, allow_duplicates: bool) -> String {
    generate_secret_with(&mut rand::rng(), digit_count, allow_duplicates)
}

/// [`generate_secret`] with a caller-supplied RNG.
pub fn generate_secret_with<R: Rng + ?Sized>(
    rng: &mut R,
    digit_count: usize,
    allow_duplicates: bool,
) -> String {
    if allow_duplicates {
        return (0..digit_count)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect();
    }

    let mut digits: Vec<u8> = (b'0'..=b'9').collect();
    digits.shuffle(rng);
    digits
        .into_iter()
        .take(digit_count.min(10))
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use numble_protocol::RoomCode;

    #[test]
    fn test_room_code_is_valid() {
        for _ in 0..200 {
            let code = generate_room_code();
            assert_eq!(code.len(), ROOM_CODE_LEN);
            assert!(RoomCode::parse(&code).is_ok(), "{code}");
        }
    }

    #[test]
    fn test_room_code_with_seed_is_deterministic() {
        let a = generate_room_code_with(&mut StdRng::seed_from_u64(7));
        let b = generate_room_code_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_room_codes_vary() {
        let mut rng = StdRng::seed_from_u64(42);
        let codes: HashSet<_> = (0..100).map(|_| generate_room_code_with(&mut rng)).collect();
        assert!(codes.len() > 95);
    }

    #[test]
    fn test_secret_without_duplicates_has_distinct_digits() {
        let mut rng = StdRng::seed_from_u64(1);
        for digit_count in [4, 6, 10] {
            let secret = generate_secret_with(&mut rng, digit_count, false);
            assert_eq!(secret.len(), digit_count);
            assert!(secret.bytes().all(|b| b.is_ascii_digit()));
            let distinct: HashSet<_> = secret.bytes().collect();
            assert_eq!(distinct.len(), digit_count);
        }
    }

    #[test]
    fn test_secret_with_duplicates_is_digits() {
        let secret = generate_secret(6, true);
        assert_eq!(secret.len(), 6);
        assert!(secret.bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn test_secret_without_duplicates_caps_at_ten_digits() {
        assert_eq!(generate_secret(12, false).len(), 10);
    }
}
