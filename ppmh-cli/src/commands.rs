// PPMH CLI - File commands
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! File-level normalize, compress and decompress.
//!
//! Compressed files use the [`PackedStream`] container. Static streams are
//! self-contained; per-position streams are decoded by retraining the model
//! on the same text the encoder saw (`--model-text`).

use crate::error::{CliError, Result};
use crate::normalize::normalize;
use ppmh::{
    parse_symbols, symbols_to_string, ArtifactBody, Codebook, CodingMode, ContextModel, Decoder,
    Encoder, EncoderConfig, ModelConfig, PackedStream, RunStats, Symbol, WeightSource,
};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Options for [`compress_file`]
#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// Maximum context order
    pub order: usize,
    /// Coding mode
    pub mode: CodingMode,
    /// Static codebook weights
    pub weights: WeightSource,
    /// Skip normalization (input must already be in the alphabet)
    pub raw: bool,
}

fn read_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

/// Read a text file and turn it into symbols
pub fn load_symbols(path: &Path, raw: bool) -> Result<Vec<Symbol>> {
    let text = read_text(path)?;
    let text = if raw { text } else { normalize(&text) };
    Ok(parse_symbols(&text)?)
}

/// Normalize `input` into `output`, returning the number of characters written
pub fn normalize_file(input: &Path, output: &Path) -> Result<usize> {
    let text = read_text(input)?;
    let normalized = normalize(&text);
    fs::write(output, &normalized)?;

    info!(
        "Normalized {} -> {} ({} chars)",
        input.display(),
        output.display(),
        normalized.chars().count()
    );
    Ok(normalized.chars().count())
}

/// Compress `input` into a container at `output`
///
/// When `codebook_out` is given and the mode is static, the codebook is also
/// written there as JSON.
pub fn compress_file(
    input: &Path,
    output: &Path,
    codebook_out: Option<&Path>,
    options: &CompressOptions,
) -> Result<RunStats> {
    let symbols = load_symbols(input, options.raw)?;

    let config = EncoderConfig {
        mode: options.mode,
        weights: options.weights,
        model: ModelConfig::with_order(options.order),
    };
    let result = Encoder::new(config).compress(&symbols)?;

    let stream = PackedStream::from_artifact(&result.artifact);
    let bytes = stream.to_bytes();
    fs::write(output, &bytes)?;

    if let (Some(path), Some(codebook)) = (codebook_out, result.artifact.codebook()) {
        fs::write(path, serde_json::to_string_pretty(codebook)?)?;
        debug!("Codebook written to {}", path.display());
    }

    info!(
        "Compressed {} symbols into {} bytes ({:?}, order {}, {:.3} bits/symbol)",
        symbols.len(),
        bytes.len(),
        options.mode,
        options.order,
        result.stats.mean_code_length()
    );
    Ok(result.stats)
}

/// Decompress a container at `input` into text at `output`
///
/// `codebook` replaces the embedded codebook of a static stream.
/// `model_text` is required for per-position streams.
pub fn decompress_file(
    input: &Path,
    output: &Path,
    codebook: Option<&Path>,
    model_text: Option<&Path>,
    raw: bool,
) -> Result<usize> {
    if !input.exists() {
        return Err(CliError::FileNotFound(input.to_path_buf()));
    }
    let mut stream = PackedStream::from_bytes(&fs::read(input)?)?;

    if let Some(path) = codebook {
        let json = read_text(path)?;
        let replacement: Codebook = serde_json::from_str(&json)?;
        stream.codebook = Some(replacement);
    }

    let artifact = stream.into_artifact()?;
    let symbols = match artifact.body() {
        ArtifactBody::Static { .. } => Decoder::new().decode(&artifact)?,
        ArtifactBody::PerPosition { max_order, .. } => {
            let path = model_text.ok_or(CliError::ModelTextRequired)?;
            let mut model = ContextModel::with_order(*max_order)?;
            model.train(&load_symbols(path, raw)?);
            Decoder::with_model(&model).decode(&artifact)?
        }
    };

    fs::write(output, symbols_to_string(&symbols))?;
    info!(
        "Decompressed {} symbols into {}",
        symbols.len(),
        output.display()
    );
    Ok(symbols.len())
}
