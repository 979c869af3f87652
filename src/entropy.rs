//! Shannon entropy of discrete distributions

use crate::context::Distribution;

/// Entropy in bits of a distribution
///
/// Sum of `p * log2(1/p)` over symbols with positive probability.
/// Empty and one-point distributions give 0.
pub fn entropy(distribution: &Distribution) -> f64 {
    entropy_of(distribution.iter().map(|(_, p)| p))
}

/// Entropy in bits of a sequence of probabilities
pub fn entropy_of<I>(probabilities: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let h: f64 = probabilities
        .into_iter()
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.log2())
        .sum();
    // -0.0 and tiny negatives from rounding on p == 1.0
    h.max(0.0)
}
