//! Rate and entropy statistics for a coding run
//!
//! This module provides the per-run measurements: mean entropy of the
//! predicted distributions, mean coded length, back-off depth distribution
//! and wall-clock timings.

use crate::context::ContextModel;
use crate::encoder::CodingMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Bits per symbol of the uncompressed text (one byte per character)
pub const RAW_BITS_PER_SYMBOL: f64 = 8.0;

/// Statistics collected while encoding (and optionally decoding) a sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Coding mode of the run
    pub mode: CodingMode,
    /// Model order of the run
    pub max_order: usize,
    /// Number of positions predicted
    pub positions: u64,
    /// Sum of per-position entropies (bits)
    pub total_entropy: f64,
    /// Total emitted bits
    pub total_bits: u64,
    /// Context length used after back-off -> number of positions
    pub order_distribution: BTreeMap<usize, u64>,
    /// Encoding wall time
    pub encode_time: Duration,
    /// Decoding wall time, once measured
    pub decode_time: Option<Duration>,
}

impl RunStats {
    /// Create an empty collector
    pub fn new(mode: CodingMode, max_order: usize) -> Self {
        Self {
            mode,
            max_order,
            ..Default::default()
        }
    }

    /// Record one predicted position
    pub fn record_prediction(&mut self, order: usize, entropy: f64) {
        self.positions += 1;
        self.total_entropy += entropy;
        *self.order_distribution.entry(order).or_insert(0) += 1;
    }

    /// Record emitted bits
    pub fn record_bits(&mut self, bits: usize) {
        self.total_bits += bits as u64;
    }

    /// Record decoding time
    pub fn record_decode(&mut self, elapsed: Duration) {
        self.decode_time = Some(elapsed);
    }

    /// Mean entropy in bits/symbol
    pub fn mean_entropy(&self) -> f64 {
        if self.positions == 0 {
            return 0.0;
        }
        self.total_entropy / self.positions as f64
    }

    /// Mean coded length in bits/symbol
    pub fn mean_code_length(&self) -> f64 {
        if self.positions == 0 {
            return 0.0;
        }
        self.total_bits as f64 / self.positions as f64
    }

    /// Entropy over rate (1.0 = the code meets the entropy bound)
    pub fn efficiency(&self) -> f64 {
        if self.total_bits == 0 {
            return 0.0;
        }
        self.total_entropy / self.total_bits as f64
    }

    /// Compression ratio against 8-bit text (higher = better)
    pub fn compression_ratio(&self) -> f64 {
        if self.total_bits == 0 {
            return 1.0;
        }
        self.positions as f64 * RAW_BITS_PER_SYMBOL / self.total_bits as f64
    }

    /// Space savings percentage against 8-bit text
    pub fn space_savings_percent(&self) -> f64 {
        if self.positions == 0 {
            return 0.0;
        }
        (1.0 - self.mean_code_length() / RAW_BITS_PER_SYMBOL) * 100.0
    }

    /// Most used back-off order
    pub fn most_used_order(&self) -> Option<usize> {
        self.order_distribution
            .iter()
            .max_by_key(|(_, count)| *count)
            .map(|(order, _)| *order)
    }

    /// Generate a human-readable report
    pub fn report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== PPMH Run Statistics ===\n\n");
        report.push_str(&format!("Mode: {:?}, order {}\n", self.mode, self.max_order));
        report.push_str(&format!("Symbols: {}\n", self.positions));
        report.push_str(&format!("Emitted bits: {}\n", self.total_bits));
        report.push_str(&format!(
            "Mean entropy: {:.4} bits/symbol\n",
            self.mean_entropy()
        ));
        report.push_str(&format!(
            "Mean code length: {:.4} bits/symbol\n",
            self.mean_code_length()
        ));
        report.push_str(&format!("Efficiency: {:.1}%\n", self.efficiency() * 100.0));
        report.push_str(&format!(
            "Compression ratio: {:.2}x\n",
            self.compression_ratio()
        ));
        report.push_str(&format!("Encode time: {:?}\n", self.encode_time));
        if let Some(decode_time) = self.decode_time {
            report.push_str(&format!("Decode time: {:?}\n", decode_time));
        }

        report.push_str("\nBack-off orders:\n");
        for (order, count) in &self.order_distribution {
            let percent = if self.positions > 0 {
                (*count as f64 / self.positions as f64) * 100.0
            } else {
                0.0
            };
            report.push_str(&format!("  order {}: {} ({:.1}%)\n", order, count, percent));
        }

        report
    }
}

/// Context model statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextMetrics {
    /// Configured maximum order
    pub max_order: usize,
    /// Number of distinct contexts
    pub context_count: usize,
    /// Number of (context, symbol) entries
    pub entry_count: usize,
    /// Symbols consumed by training
    pub trained_symbols: u64,
    /// Table fingerprint
    pub fingerprint: u64,
}

impl ContextMetrics {
    /// Create metrics from a trained model
    pub fn from_model(model: &ContextModel) -> Self {
        Self {
            max_order: model.max_order(),
            context_count: model.context_count(),
            entry_count: model.entry_count(),
            trained_symbols: model.trained_symbols(),
            fingerprint: model.fingerprint(),
        }
    }

    /// Generate a human-readable report
    pub fn report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Context Model ===\n\n");
        report.push_str(&format!("Order: {}\n", self.max_order));
        report.push_str(&format!("Trained symbols: {}\n", self.trained_symbols));
        report.push_str(&format!("Contexts: {}\n", self.context_count));
        report.push_str(&format!("Entries: {}\n", self.entry_count));
        report.push_str(&format!("Fingerprint: {:016x}\n", self.fingerprint));

        report
    }
}
