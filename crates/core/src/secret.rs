//! Strength rules for the session signing secrets of both binaries.
//!
//! Cookie keys are derived from the secret, so a short, guessable or
//! copy-pasted value from a sample `.env` is refused at startup.

use std::collections::HashMap;

use thiserror::Error;

/// The signing key needs 64 bytes of input.
pub const MIN_SECRET_LENGTH: usize = 64;

/// Minimum Shannon entropy, in bits per character.
pub const MIN_ENTROPY_BITS: f64 = 3.3;

/// Fragments that only show up in sample values. Matched case-insensitively.
const SAMPLE_FRAGMENTS: &[&str] = &[
    "changeme",
    "change-me",
    "placeholder",
    "example",
    "secret",
    "password",
    "hearth",
    "your-",
    "put-your",
    "replace",
    "insert",
    "todo",
    "fixme",
    "xxx",
];

/// Why a secret was refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeakSecret {
    #[error("must be at least {min} characters (got {0})", min = MIN_SECRET_LENGTH)]
    TooShort(usize),
    #[error("looks like a sample value (contains '{0}')")]
    Sample(&'static str),
    #[error("entropy too low ({0:.2} bits/char, need >= {min:.1}); use a randomly generated value", min = MIN_ENTROPY_BITS)]
    LowEntropy(f64),
}

/// Check a session secret against every rule, shortest check first.
///
/// # Errors
///
/// The first [`WeakSecret`] rule the value breaks.
pub fn check_session_secret(value: &str) -> Result<(), WeakSecret> {
    let length = value.chars().count();
    if length < MIN_SECRET_LENGTH {
        return Err(WeakSecret::TooShort(length));
    }

    let lower = value.to_lowercase();
    if let Some(fragment) = SAMPLE_FRAGMENTS.iter().find(|f| lower.contains(*f)) {
        return Err(WeakSecret::Sample(*fragment));
    }

    let entropy = entropy_bits(value);
    if entropy < MIN_ENTROPY_BITS {
        return Err(WeakSecret::LowEntropy(entropy));
    }
    Ok(())
}

/// Shannon entropy of the character distribution.
#[must_use]
pub fn entropy_bits(value: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    let mut total = 0_u32;
    for c in value.chars() {
        *counts.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let total = f64::from(total);
    counts
        .values()
        .map(|&n| {
            let p = f64::from(n) / total;
            -p * p.log2()
        })
        .sum()
}
