//! Decoder module
//!
//! This module turns a compressed artifact back into symbols. Static
//! artifacts carry their codebook; per-position artifacts are decoded by
//! replaying the encoder's codebook sequence from the same context model.

use crate::bitstream::BitString;
use crate::context::ContextModel;
use crate::encoder::{ArtifactBody, CompressedArtifact};
use crate::error::{DecodeError, Result};
use crate::huffman::Codebook;
use crate::symbol::Symbol;

/// Decoder for compressed artifacts
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder<'m> {
    /// Model for per-position replay
    model: Option<&'m ContextModel>,
}

impl Decoder<'static> {
    /// Create a decoder for static artifacts
    pub fn new() -> Self {
        Self { model: None }
    }
}

impl<'m> Decoder<'m> {
    /// Create a decoder able to replay per-position artifacts
    pub fn with_model(model: &'m ContextModel) -> Self {
        Self { model: Some(model) }
    }

    /// Decode an artifact
    pub fn decode(&self, artifact: &CompressedArtifact) -> Result<Vec<Symbol>> {
        let symbols = match artifact.body() {
            ArtifactBody::Static { codebook, .. } => codebook.decode(artifact.bits())?,
            ArtifactBody::PerPosition {
                max_order,
                model_fingerprint,
            } => {
                let model = self.model.ok_or(DecodeError::ModelRequired)?;
                if model.max_order() != *max_order {
                    return Err(DecodeError::OrderMismatch {
                        expected: *max_order,
                        actual: model.max_order(),
                    }
                    .into());
                }
                let actual = model.fingerprint();
                if actual != *model_fingerprint {
                    return Err(DecodeError::ModelMismatch {
                        expected: *model_fingerprint,
                        actual,
                    }
                    .into());
                }
                self.replay(model, artifact.bits(), artifact.symbol_count())?
            }
        };

        if symbols.len() != artifact.symbol_count() {
            return Err(DecodeError::SymbolCountMismatch {
                expected: artifact.symbol_count(),
                actual: symbols.len(),
            }
            .into());
        }

        Ok(symbols)
    }

    /// Rebuild each position's codebook from the already decoded prefix
    fn replay(
        &self,
        model: &ContextModel,
        bits: &BitString,
        symbol_count: usize,
    ) -> Result<Vec<Symbol>> {
        // Every codeword is at least one bit long
        if symbol_count > bits.len() {
            return Err(DecodeError::SymbolCountMismatch {
                expected: symbol_count,
                actual: bits.len(),
            }
            .into());
        }

        let mut symbols = Vec::with_capacity(symbol_count);
        let mut cursor = 0;

        for index in 0..symbol_count {
            let prediction = model.predict_at(&symbols, index)?;
            let codebook = Codebook::from_distribution(&prediction.distribution)?;
            let symbol = codebook.decode_one(bits, &mut cursor)?;
            symbols.push(symbol);
        }

        if cursor < bits.len() {
            return Err(DecodeError::IncompleteCode {
                leftover_bits: bits.len() - cursor,
            }
            .into());
        }

        Ok(symbols)
    }
}
