//! Small numeric helpers shared by the scorers.

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Linearly rescale `x` from `[lo, hi]` to `[0, 1]`, clipping at both ends.
pub fn scale(x: f64, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        return 0.0;
    }
    ((x - lo) / (hi - lo)).clamp(0.0, 1.0)
}

/// Round to `places` decimal places.
pub fn round_to(x: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (x * factor).round() / factor
}

pub fn round2(x: f64) -> f64 {
    round_to(x, 2)
}

/// Shannon entropy in bits of a count distribution.
pub fn shannon_entropy(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

/// Entropy normalised by `log2(k + 1)` where `k` is the number of non-empty
/// categories.
pub fn normalized_entropy(counts: &[usize]) -> f64 {
    let k = counts.iter().filter(|&&c| c > 0).count();
    if k == 0 {
        return 0.0;
    }
    shannon_entropy(counts) / ((k + 1) as f64).log2().max(1e-9)
}

/// Value at fraction `q` of a sorted slice, using the lower index
/// `floor(q * (n - 1))`.
pub fn lower_quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (q * (sorted.len() - 1) as f64).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Similarity ratio `2 * M / T` of two strings, where `M` is the length of
/// their longest common character subsequence and `T` the total length.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    2.0 * prev[b.len()] as f64 / total as f64
}
