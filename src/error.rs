//! Error types for PPMH
//!
//! This module defines all error types used throughout the library.
//! Every failure is local and recoverable; the library never logs an
//! error, it returns it.

use thiserror::Error;

/// Result type alias for PPMH operations
pub type Result<T> = std::result::Result<T, PpmhError>;

/// Main error type for PPMH operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PpmhError {
    /// Symbol outside the alphabet
    #[error("Symbol error: {0}")]
    Symbol(#[from] SymbolError),

    /// Context model error
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Prefix code construction or encoding error
    #[error("Code error: {0}")]
    Code(#[from] CodeError),

    /// Decoding error
    #[error("Decoding error: {0}")]
    Decode(#[from] DecodeError),

    /// Bit-stream packing / container error
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),
}

/// Errors while converting characters to symbols
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SymbolError {
    /// Character is not part of the alphabet
    #[error("Invalid symbol {0:?}: expected 'a'-'z', space or newline")]
    InvalidSymbol(char),

    /// Symbol index out of range
    #[error("Invalid symbol index: {0}")]
    InvalidIndex(u8),
}

/// Errors raised by the context model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// No statistics at all, not even for the empty context
    #[error("No prediction available: model has not been trained")]
    NoPrediction,

    /// Requested order above the supported maximum
    #[error("Invalid model order {order}: maximum is {max}")]
    InvalidOrder { order: usize, max: usize },
}

/// Errors raised while building or using a codebook
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodeError {
    /// No symbol with positive weight
    #[error("Empty alphabet: at least one symbol with positive weight is required")]
    EmptyAlphabet,

    /// Weight is negative or not a number
    #[error("Invalid weight {weight} for symbol {symbol:?}")]
    InvalidWeight { symbol: char, weight: f64 },

    /// Symbol has no codeword in the codebook
    #[error("Unknown symbol {symbol:?}: no codeword assigned")]
    UnknownSymbol { symbol: char },

    /// Codeword text contains something other than '0' and '1'
    #[error("Invalid codeword {0:?}")]
    InvalidCodeword(String),

    /// Codeword set is not prefix-free
    #[error("Codebook is not prefix-free: {prefix:?} is a prefix of {codeword:?}")]
    NotPrefixFree { prefix: String, codeword: String },
}

/// Errors during decoding
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Trailing bits matched no codeword
    #[error("Incomplete code: {leftover_bits} trailing bits match no codeword")]
    IncompleteCode { leftover_bits: usize },

    /// Per-position artifact decoded without the model that produced it
    #[error("Per-position artifact requires the context model used for encoding")]
    ModelRequired,

    /// Per-position artifact decoded against a different model
    #[error("Model mismatch: artifact expects {expected:016x}, model is {actual:016x}")]
    ModelMismatch { expected: u64, actual: u64 },

    /// Per-position artifact decoded against a model of a different order
    #[error("Order mismatch: artifact expects order {expected}, model has {actual}")]
    OrderMismatch { expected: usize, actual: usize },

    /// Decoded symbol count differs from the recorded one
    #[error("Symbol count mismatch: expected {expected}, decoded {actual}")]
    SymbolCountMismatch { expected: usize, actual: usize },
}

/// Errors related to bit packing and the stream container
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    /// Bytes unpacked without the original bit length
    #[error("Bit length unknown: the unpadded bit length must be supplied")]
    BitLengthUnknown,

    /// Recorded bit length does not fit the byte buffer
    #[error("Bit length {bit_len} does not fit {bytes} bytes")]
    BitLengthOverflow { bit_len: u64, bytes: usize },

    /// Buffer too short
    #[error("Buffer too short: need at least {needed} bytes, got {available}")]
    BufferTooShort { needed: usize, available: usize },

    /// Wrong magic bytes
    #[error("Invalid magic bytes: {0:02x?}")]
    InvalidMagic([u8; 4]),

    /// Container written by a newer format
    #[error("Unsupported format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u8, supported: u8 },

    /// Unknown coding mode byte
    #[error("Unknown coding mode: 0x{0:02x}")]
    UnknownMode(u8),

    /// Payload checksum mismatch
    #[error("Invalid checksum: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// Container carries a mode that cannot hold the requested data
    #[error("Container error: {0}")]
    Malformed(String),
}
