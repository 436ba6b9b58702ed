//! Lexical diversity estimators.
//!
//! Five classical measures over content words, each rescaled to `[0, 1]`
//! against fixed empirical bounds and averaged into one 0–100 score.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::statistics::{mean, round2, scale};

/// Score assigned to texts with fewer than [`MIN_CONTENT_WORDS`] content words.
pub const SHORT_TEXT_DIVERSITY: f64 = 35.0;
pub const MIN_CONTENT_WORDS: usize = 10;

const MTLD_THRESHOLD: f64 = 0.72;
const HDD_SAMPLE_SIZE: usize = 42;

const TTR_BOUNDS: (f64, f64) = (0.25, 0.8);
const HERDAN_BOUNDS: (f64, f64) = (0.5, 1.2);
const MAAS_INV_BOUNDS: (f64, f64) = (0.5, 4.0);
const MTLD_BOUNDS: (f64, f64) = (10.0, 150.0);
const HDD_BOUNDS: (f64, f64) = (0.2, 0.9);

/// Per-measure rescaled values, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DiversityBreakdown {
    pub ttr: f64,
    pub herdan_c: f64,
    pub maas_inv: f64,
    pub mtld: f64,
    pub hdd: f64,
}

impl DiversityBreakdown {
    /// Rescaled measures for `words`; all zero under the minimum length.
    pub fn compute(words: &[String]) -> Self {
        match rescaled(words) {
            Some([ttr, herdan_c, maas_inv, mtld, hdd]) => Self {
                ttr: round2(ttr * 100.0),
                herdan_c: round2(herdan_c * 100.0),
                maas_inv: round2(maas_inv * 100.0),
                mtld: round2(mtld * 100.0),
                hdd: round2(hdd * 100.0),
            },
            None => Self::default(),
        }
    }
}

/// Composite diversity score in `[0, 100]`, rounded to two decimals.
pub fn lexical_diversity(words: &[String]) -> f64 {
    match rescaled(words) {
        Some(parts) => round2(mean(&parts) * 100.0),
        None => SHORT_TEXT_DIVERSITY,
    }
}

fn rescaled(words: &[String]) -> Option<[f64; 5]> {
    if words.len() < MIN_CONTENT_WORDS {
        return None;
    }
    let tokens = words.len();
    let types = words.iter().collect::<HashSet<_>>().len();

    Some([
        scale(type_token_ratio(types, tokens), TTR_BOUNDS.0, TTR_BOUNDS.1),
        scale(herdan_c(types, tokens), HERDAN_BOUNDS.0, HERDAN_BOUNDS.1),
        scale(
            1.0 / (maas_a(types, tokens) + 1e-6),
            MAAS_INV_BOUNDS.0,
            MAAS_INV_BOUNDS.1,
        ),
        scale(mtld(words), MTLD_BOUNDS.0, MTLD_BOUNDS.1),
        scale(hdd(words), HDD_BOUNDS.0, HDD_BOUNDS.1),
    ])
}

pub fn type_token_ratio(types: usize, tokens: usize) -> f64 {
    if tokens == 0 {
        return 0.0;
    }
    types as f64 / tokens as f64
}

/// Herdan's C: `log(V) / log(N)`.
pub fn herdan_c(types: usize, tokens: usize) -> f64 {
    (types.max(1) as f64).ln() / (tokens.max(2) as f64).ln().max(1e-6)
}

/// Maas's a: `sqrt((ln N - ln V) / (ln N)^2)`.
pub fn maas_a(types: usize, tokens: usize) -> f64 {
    let ln_n = (tokens.max(2) as f64).ln();
    let ln_v = (types.max(1) as f64).ln();
    let a2 = (ln_n - ln_v) / (ln_n * ln_n + 1e-9);
    a2.max(0.0).sqrt()
}

/// Approximate MTLD: mean length of sequential segments whose running TTR
/// stays at or above 0.72, with a partial factor for the trailing segment.
pub fn mtld(words: &[String]) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let mut factors = 0.0;
    let mut segment: HashSet<&str> = HashSet::new();
    let mut count = 0usize;
    for word in words {
        count += 1;
        segment.insert(word.as_str());
        let ttr = segment.len() as f64 / count as f64;
        if ttr < MTLD_THRESHOLD {
            factors += 1.0;
            segment.clear();
            count = 0;
        }
    }
    if count > 0 {
        factors += count as f64 / segment.len().max(1) as f64;
    }
    words.len() as f64 / f64::max(factors, 1e-6)
}

/// Approximate HD-D: mean probability that each type appears in a random
/// draw of 42 tokens.
pub fn hdd(words: &[String]) -> f64 {
    let n = words.len();
    if n == 0 {
        return 0.0;
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in words {
        *counts.entry(word.as_str()).or_default() += 1;
    }
    let sample = HDD_SAMPLE_SIZE.min(n) as i32;
    let total: f64 = counts
        .values()
        .map(|&f| 1.0 - ((n - f) as f64 / n as f64).powi(sample))
        .sum();
    total / counts.len().max(1) as f64
}
