//! Keystroke planning with per-character jitter, pauses, and typos.

use super::random_delay;
use rand::Rng;
use std::time::Duration;

/// Per-character delay bounds in milliseconds.
const KEY_DELAY_MS: (u64, u64) = (50, 150);
/// Thinking pause bounds in milliseconds.
const THINK_PAUSE_MS: (u64, u64) = (200, 500);
/// Probability of a thinking pause before a character.
const THINK_PROBABILITY: f64 = 0.10;
/// Probability of a corrected typo on a character.
const TYPO_PROBABILITY: f64 = 0.05;
/// Inputs this short are typed without typos.
const TYPO_MIN_LEN: usize = 5;

/// One planned keyboard action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    /// Type a character, then wait.
    Type {
        /// Character to type.
        ch: char,
        /// Delay after the key.
        delay: Duration,
    },
    /// Delete the previous character, then wait.
    Backspace {
        /// Delay after the key.
        delay: Duration,
    },
    /// Pause without typing.
    Pause(Duration),
}

/// Plans the keystrokes for typing `text`.
///
/// Every character gets a 50–150 ms delay. Before each character there is a
/// 10% chance of a 200–500 ms pause. For inputs longer than five characters,
/// each alphanumeric character has a 5% chance of being preceded by a wrong
/// character that is immediately deleted. Replaying the `Type` and
/// `Backspace` actions always yields exactly `text`.
pub fn plan_typing<R: Rng + ?Sized>(rng: &mut R, text: &str) -> Vec<Keystroke> {
    let allow_typos = text.chars().count() > TYPO_MIN_LEN;
    let mut plan = Vec::with_capacity(text.len());
    for ch in text.chars() {
        if rng.gen_bool(THINK_PROBABILITY) {
            plan.push(Keystroke::Pause(random_delay(
                rng,
                THINK_PAUSE_MS.0,
                THINK_PAUSE_MS.1,
            )));
        }
        if allow_typos && ch.is_ascii_alphanumeric() && rng.gen_bool(TYPO_PROBABILITY) {
            plan.push(Keystroke::Type {
                ch: wrong_key(rng, ch),
                delay: key_delay(rng),
            });
            plan.push(Keystroke::Backspace {
                delay: key_delay(rng),
            });
        }
        plan.push(Keystroke::Type {
            ch,
            delay: key_delay(rng),
        });
    }
    plan
}

fn key_delay<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    random_delay(rng, KEY_DELAY_MS.0, KEY_DELAY_MS.1)
}

fn wrong_key<R: Rng + ?Sized>(rng: &mut R, intended: char) -> char {
    let candidate = char::from(rng.gen_range(b'a'..=b'z'));
    if candidate == intended.to_ascii_lowercase() {
        if candidate == 'z' { 'a' } else { 'z' }
    } else {
        candidate
    }
}
