//! Encoder module
//!
//! This module turns a symbol sequence into a compressed artifact, driving
//! the context model and the code builder in one of two explicit modes:
//!
//! - [`CodingMode::Static`]: one codebook for the whole sequence, built from
//!   aggregated statistics
//! - [`CodingMode::PerPosition`]: a fresh codebook per position, built from
//!   that position's predicted distribution
//!
//! The artifact records which mode produced it, so a decoder can never
//! apply a single codebook to a per-position stream.

use crate::bitstream::{pack, BitString, PackedBits};
use crate::context::{ContextModel, ModelConfig};
use crate::error::Result;
use crate::huffman::Codebook;
use crate::metrics::RunStats;
use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

/// How codebooks are built during encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CodingMode {
    /// One codebook from aggregated weights
    #[default]
    Static = 0,
    /// One codebook per position from its predicted distribution
    PerPosition = 1,
}

impl CodingMode {
    /// Convert from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Static),
            1 => Some(Self::PerPosition),
            _ => None,
        }
    }
}

/// Where the static codebook's weights come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeightSource {
    /// Sum over positions of the predicted probability of each symbol
    #[default]
    PredictedProbability,
    /// Plain occurrence count of each symbol in the sequence
    SymbolFrequency,
}

/// Encoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Coding mode
    pub mode: CodingMode,
    /// Static codebook weights (ignored per position)
    pub weights: WeightSource,
    /// Context model configuration
    pub model: ModelConfig,
}

impl EncoderConfig {
    /// Static mode with the given order
    pub fn static_mode(max_order: usize) -> Self {
        Self {
            mode: CodingMode::Static,
            model: ModelConfig::with_order(max_order),
            ..Default::default()
        }
    }

    /// Per-position mode with the given order
    pub fn per_position(max_order: usize) -> Self {
        Self {
            mode: CodingMode::PerPosition,
            model: ModelConfig::with_order(max_order),
            ..Default::default()
        }
    }

    /// Replace the static weight source
    pub fn with_weights(mut self, weights: WeightSource) -> Self {
        self.weights = weights;
        self
    }
}

/// Mode-specific part of an artifact
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactBody {
    /// The single codebook used for every symbol
    Static {
        /// Order of the model that weighted the codebook
        max_order: usize,
        /// Codebook for the whole sequence
        codebook: Codebook,
    },
    /// Codebooks are rebuilt from this model during decoding
    PerPosition {
        /// Order of the model
        max_order: usize,
        /// Fingerprint of the model's table
        model_fingerprint: u64,
    },
}

/// Encoded bits plus everything needed to decode them
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedArtifact {
    symbol_count: usize,
    bits: BitString,
    body: ArtifactBody,
}

impl CompressedArtifact {
    pub(crate) fn new(symbol_count: usize, bits: BitString, body: ArtifactBody) -> Self {
        Self {
            symbol_count,
            bits,
            body,
        }
    }

    /// Number of encoded symbols
    pub fn symbol_count(&self) -> usize {
        self.symbol_count
    }

    /// Encoded bits
    pub fn bits(&self) -> &BitString {
        &self.bits
    }

    /// Number of encoded bits
    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    /// Mode-specific data
    pub fn body(&self) -> &ArtifactBody {
        &self.body
    }

    /// Coding mode that produced the artifact
    pub fn mode(&self) -> CodingMode {
        match self.body {
            ArtifactBody::Static { .. } => CodingMode::Static,
            ArtifactBody::PerPosition { .. } => CodingMode::PerPosition,
        }
    }

    /// Static codebook, if any
    pub fn codebook(&self) -> Option<&Codebook> {
        match &self.body {
            ArtifactBody::Static { codebook, .. } => Some(codebook),
            ArtifactBody::PerPosition { .. } => None,
        }
    }

    /// Context order of the model behind the artifact
    pub fn max_order(&self) -> usize {
        match self.body {
            ArtifactBody::Static { max_order, .. } | ArtifactBody::PerPosition { max_order, .. } => {
                max_order
            }
        }
    }

    /// Pack the bits into bytes
    pub fn pack(&self) -> PackedBits {
        pack(&self.bits)
    }
}

/// Output of [`Encoder::compress`]
#[derive(Debug, Clone)]
pub struct Compression {
    /// The compressed artifact
    pub artifact: CompressedArtifact,
    /// Model trained on the input
    pub model: ContextModel,
    /// Run statistics
    pub stats: RunStats,
}

/// Encoder for symbol sequences
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    config: EncoderConfig,
}

impl Encoder {
    /// Create a new encoder
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Get configuration
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Train a model on `symbols`, then encode them with it
    pub fn compress(&self, symbols: &[Symbol]) -> Result<Compression> {
        let mut model = ContextModel::with_config(self.config.model)?;
        model.train(symbols);
        let (artifact, stats) = self.compress_with_model(&model, symbols)?;
        Ok(Compression {
            artifact,
            model,
            stats,
        })
    }

    /// Encode `symbols` with an already trained model
    ///
    /// The model's own order is used; `config.model` only matters for
    /// [`Encoder::compress`].
    pub fn compress_with_model(
        &self,
        model: &ContextModel,
        symbols: &[Symbol],
    ) -> Result<(CompressedArtifact, RunStats)> {
        let mut stats = RunStats::new(self.config.mode, model.max_order());
        let start = Instant::now();

        let artifact = match self.config.mode {
            CodingMode::Static => self.encode_static(model, symbols, &mut stats)?,
            CodingMode::PerPosition => self.encode_per_position(model, symbols, &mut stats)?,
        };

        stats.record_bits(artifact.bit_len());
        stats.encode_time = start.elapsed();

        #[cfg(feature = "logging")]
        log::debug!(
            "{:?} encode: {} symbols -> {} bits ({:.3} bits/symbol, entropy {:.3})",
            self.config.mode,
            symbols.len(),
            artifact.bit_len(),
            stats.mean_code_length(),
            stats.mean_entropy()
        );

        Ok((artifact, stats))
    }

    fn encode_static(
        &self,
        model: &ContextModel,
        symbols: &[Symbol],
        stats: &mut RunStats,
    ) -> Result<CompressedArtifact> {
        let mut aggregate: BTreeMap<Symbol, f64> = BTreeMap::new();
        for index in 0..symbols.len() {
            let prediction = model.predict_at(symbols, index)?;
            stats.record_prediction(prediction.order, prediction.distribution.entropy());
            if self.config.weights == WeightSource::PredictedProbability {
                for (symbol, p) in prediction.distribution.iter() {
                    *aggregate.entry(symbol).or_insert(0.0) += p;
                }
            }
        }
        if self.config.weights == WeightSource::SymbolFrequency {
            for &symbol in symbols {
                *aggregate.entry(symbol).or_insert(0.0) += 1.0;
            }
        }

        let codebook = Codebook::build(aggregate)?;

        #[cfg(feature = "logging")]
        log::trace!(
            "static codebook: {} symbols, longest codeword {} bits",
            codebook.len(),
            codebook.max_codeword_len()
        );

        let bits = codebook.encode(symbols)?;
        Ok(CompressedArtifact::new(
            symbols.len(),
            bits,
            ArtifactBody::Static {
                max_order: model.max_order(),
                codebook,
            },
        ))
    }

    fn encode_per_position(
        &self,
        model: &ContextModel,
        symbols: &[Symbol],
        stats: &mut RunStats,
    ) -> Result<CompressedArtifact> {
        let mut bits = BitString::new();
        for (index, &symbol) in symbols.iter().enumerate() {
            let prediction = model.predict_at(symbols, index)?;
            stats.record_prediction(prediction.order, prediction.distribution.entropy());

            let codebook = Codebook::from_distribution(&prediction.distribution)?;
            codebook.encode_symbol(symbol, &mut bits)?;
        }

        Ok(CompressedArtifact::new(
            symbols.len(),
            bits,
            ArtifactBody::PerPosition {
                max_order: model.max_order(),
                model_fingerprint: model.fingerprint(),
            },
        ))
    }
}
