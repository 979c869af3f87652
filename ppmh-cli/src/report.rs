// PPMH CLI - Order/mode comparison report
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Compression report across context orders and coding modes.

use crate::error::Result;
use ppmh::{CodingMode, Decoder, Encoder, EncoderConfig, Symbol};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, warn};

/// One (order, mode) measurement.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub order: usize,
    pub mode: CodingMode,
    pub symbols: usize,
    pub mean_entropy: f64,
    pub mean_code_length: f64,
    pub efficiency: f64,
    pub compression_ratio: f64,
    pub encode_ms: f64,
    pub decode_ms: f64,
    pub roundtrip_ok: bool,
}

/// Measure every order in `0..=max_order` in both modes
pub fn measure(symbols: &[Symbol], max_order: usize) -> Result<Vec<ReportRow>> {
    let mut rows = Vec::with_capacity((max_order + 1) * 2);

    for order in 0..=max_order {
        for config in [
            EncoderConfig::static_mode(order),
            EncoderConfig::per_position(order),
        ] {
            let mut result = Encoder::new(config).compress(symbols)?;

            let start = Instant::now();
            let decoded = Decoder::with_model(&result.model).decode(&result.artifact)?;
            result.stats.record_decode(start.elapsed());

            let roundtrip_ok = decoded == symbols;
            if !roundtrip_ok {
                warn!("Roundtrip mismatch at order {} ({:?})", order, config.mode);
            }

            let stats = &result.stats;
            debug!(
                "order {} {:?}: {:.4} bits/symbol",
                order,
                config.mode,
                stats.mean_code_length()
            );
            rows.push(ReportRow {
                order,
                mode: config.mode,
                symbols: symbols.len(),
                mean_entropy: stats.mean_entropy(),
                mean_code_length: stats.mean_code_length(),
                efficiency: stats.efficiency(),
                compression_ratio: stats.compression_ratio(),
                encode_ms: stats.encode_time.as_secs_f64() * 1000.0,
                decode_ms: stats
                    .decode_time
                    .map(|d| d.as_secs_f64() * 1000.0)
                    .unwrap_or_default(),
                roundtrip_ok,
            });
        }
    }

    Ok(rows)
}

/// Render rows as a fixed-width table
pub fn render_table(rows: &[ReportRow]) -> String {
    let mut table = String::new();

    table.push_str(&format!(
        "{:>5}  {:<12} {:>9} {:>9} {:>7} {:>7} {:>10} {:>10}  {}\n",
        "order", "mode", "H(bits)", "L(bits)", "eff%", "ratio", "enc(ms)", "dec(ms)", "ok"
    ));
    for row in rows {
        table.push_str(&format!(
            "{:>5}  {:<12} {:>9.4} {:>9.4} {:>7.1} {:>7.2} {:>10.3} {:>10.3}  {}\n",
            row.order,
            format!("{:?}", row.mode),
            row.mean_entropy,
            row.mean_code_length,
            row.efficiency * 100.0,
            row.compression_ratio,
            row.encode_ms,
            row.decode_ms,
            if row.roundtrip_ok { "yes" } else { "NO" }
        ));
    }

    table
}
