//! # PPMH - PPM context modelling with Huffman coding
//!
//! An adaptive text compressor for normalized text (lowercase letters,
//! space, newline). A finite-context model predicts each symbol from the
//! symbols before it; Huffman codebooks built from those predictions turn
//! the text into a compact bit sequence.
//!
//! ## Key Features
//!
//! - **Back-off prediction**: longest known context first, down to order 0
//! - **Two explicit coding modes**: one static codebook, or one codebook per position
//! - **Deterministic codebooks**: same weights, same codewords, on both sides
//! - **Exact bit lengths**: packed streams always record their unpadded length
//!
//! ## Quick Start
//!
//! ```rust
//! use ppmh::{parse_symbols, Decoder, Encoder, EncoderConfig};
//!
//! let text = parse_symbols("the cat sat on the mat").unwrap();
//!
//! // One codebook for the whole text, order-2 contexts
//! let encoder = Encoder::new(EncoderConfig::static_mode(2));
//! let result = encoder.compress(&text).unwrap();
//! println!("{:.3} bits/symbol", result.stats.mean_code_length());
//!
//! let decoded = Decoder::new().decode(&result.artifact).unwrap();
//! assert_eq!(decoded, text);
//!
//! // Per-position codebooks need the model to replay them
//! let encoder = Encoder::new(EncoderConfig::per_position(2));
//! let result = encoder.compress(&text).unwrap();
//! let decoded = Decoder::with_model(&result.model)
//!     .decode(&result.artifact)
//!     .unwrap();
//! assert_eq!(decoded, text);
//! ```
//!
//! ## Modules
//!
//! - [`symbol`]: The 28-symbol alphabet
//! - [`context`]: Context table and back-off prediction
//! - [`entropy`]: Shannon entropy of distributions
//! - [`huffman`]: Prefix code construction, encode and decode
//! - [`encoder`]: Static and per-position encoding
//! - [`decoder`]: Artifact decoding
//! - [`bitstream`]: Bit strings, byte packing and the stream container
//! - [`metrics`]: Rate and entropy statistics

// Modules
pub mod bitstream;
pub mod context;
pub mod decoder;
pub mod encoder;
pub mod entropy;
pub mod error;
pub mod huffman;
pub mod metrics;
pub mod symbol;

// Re-exports for convenient access
pub use bitstream::{pack, unpack, BitString, PackedBits, PackedStream};
pub use context::{ContextModel, Distribution, ModelConfig, Prediction};
pub use decoder::Decoder;
pub use encoder::{
    ArtifactBody, CodingMode, CompressedArtifact, Compression, Encoder, EncoderConfig,
    WeightSource,
};
pub use entropy::entropy;
pub use error::{PpmhError, Result};
pub use huffman::{Codebook, HuffmanTree};
pub use metrics::{ContextMetrics, RunStats};
pub use symbol::{parse_symbols, symbols_to_string, Symbol};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
