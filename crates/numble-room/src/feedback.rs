//! Guess scoring.
//!
//! Mastermind-style, two passes over the digits:
//!
//! 1. exact position matches become [`Verdict::Green`] and use up that
//!    secret position;
//! 2. every other guess digit takes the leftmost unused secret position
//!    holding the same digit ([`Verdict::Yellow`]), or gets
//!    [`Verdict::Gray`] if none is left.
//!
//! A secret digit is never credited twice, which is what makes repeated
//! digits in a guess score sensibly.

use numble_protocol::Verdict;

/// Scores `guess` against `secret`, one verdict per position.
///
/// Both strings must have the same length; the caller validates that
/// before evaluating.
///
/// ```rust
/// use numble_protocol::Verdict::{Gray, Green, Yellow};
/// use numble_room::evaluate;
///
/// assert_eq!(evaluate("1123", "1234"), vec![Green, Gray, Yellow, Yellow]);
/// ```
pub fn evaluate(guess: &str, secret: &str) -> Vec<Verdict> {
    let guess = guess.as_bytes();
    let secret = secret.as_bytes();
    debug_assert_eq!(guess.len(), secret.len());

    let mut verdicts = vec![Verdict::Gray; guess.len()];
    let mut used = vec![false; secret.len()];

    for (i, (g, s)) in guess.iter().zip(secret).enumerate() {
        if g == s {
            verdicts[i] = Verdict::Green;
            used[i] = true;
        }
    }

    for (i, g) in guess.iter().enumerate() {
        if verdicts[i] == Verdict::Green {
            continue;
        }
        let hit = secret
            .iter()
            .enumerate()
            .position(|(j, s)| !used[j] && s == g);
        if let Some(j) = hit {
            verdicts[i] = Verdict::Yellow;
            used[j] = true;
        }
    }

    verdicts
}

/// A guess wins when every position is green.
pub fn is_win(feedback: &[Verdict]) -> bool {
    !feedback.is_empty() && feedback.iter().all(|v| *v == Verdict::Green)
}

#[cfg(test)]
mod tests {
    use super::*;
    use numble_protocol::Verdict::{Gray, Green, Yellow};

    #[test]
    fn test_evaluate_exact_match_is_all_green() {
        let feedback = evaluate("1234", "1234");
        assert_eq!(feedback, vec![Green; 4]);
        assert!(is_win(&feedback));
    }

    #[test]
    fn test_evaluate_swapped_tail_is_yellow() {
        assert_eq!(evaluate("1243", "1234"), vec![Green, Green, Yellow, Yellow]);
    }

    #[test]
    fn test_evaluate_repeated_guess_digit_is_credited_once() {
        assert_eq!(evaluate("1123", "1234"), vec![Green, Gray, Yellow, Yellow]);
    }

    #[test]
    fn test_evaluate_no_overlap_except_one_digit() {
        // '4' is in the secret, just not where it was guessed.
        assert_eq!(evaluate("1234", "4096"), vec![Gray, Gray, Gray, Yellow]);
        assert!(!is_win(&evaluate("1234", "4096")));
    }

    #[test]
    fn test_evaluate_leftmost_unused_secret_digit_is_consumed() {
        // Secret has two 7s; only one is left after the green.
        assert_eq!(evaluate("0777", "7701"), vec![Yellow, Green, Yellow, Gray]);
    }

    #[test]
    fn test_evaluate_six_digit_secret() {
        assert_eq!(
            evaluate("987654", "456789"),
            vec![Yellow, Yellow, Yellow, Yellow, Yellow, Yellow]
        );
    }

    #[test]
    fn test_is_win_rejects_empty_and_partial() {
        assert!(!is_win(&[]));
        assert!(!is_win(&[Green, Green, Yellow]));
    }

    #[test]
    fn test_evaluate_counts_match_multiset_intersection() {
        // Every 4-digit guess against a few duplicate-free secrets.
        for secret in ["0123", "4096", "9876", "1357"] {
            for n in 0..10_000u32 {
                let guess = format!("{n:04}");
                let feedback = evaluate(&guess, secret);

                let exact = guess
                    .bytes()
                    .zip(secret.bytes())
                    .filter(|(g, s)| g == s)
                    .count();
                let greens = feedback.iter().filter(|v| **v == Green).count();
                assert_eq!(greens, exact, "{guess} vs {secret}");

                let shared: usize = (b'0'..=b'9')
                    .map(|d| {
                        let in_guess = guess.bytes().filter(|b| *b == d).count();
                        let in_secret = secret.bytes().filter(|b| *b == d).count();
                        in_guess.min(in_secret)
                    })
                    .sum();
                let scored = feedback.iter().filter(|v| **v != Gray).count();
                assert_eq!(scored, shared, "{guess} vs {secret}");
            }
        }
    }
}
