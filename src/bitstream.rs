// PPMH - PPM context modelling with Huffman coding
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Bit sequences, byte packing and the `.ppmh` stream container
//!
//! # Packing
//!
//! Bits are grouped by 8, most-significant bit first. A final group shorter
//! than 8 bits is left-padded with zeros, so `101` packs to `0b0000_0101`.
//! The padding is invisible in the bytes, which is why [`PackedBits`]
//! always carries the exact bit length and [`unpack`] refuses to run
//! without it.
//!
//! # Container format
//!
//! Little-endian:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ magic "PPMH" (4) │ version (1) │ mode (1)    │
//! │ max order (1)    │ reserved (1)              │
//! │ symbol count (8) │ bit length (8)            │
//! │ model fingerprint (8) │ CRC-32 (4)           │
//! ├──────────────────────────────────────────────┤
//! │ Codebook section (static mode only)          │
//! ├──────────────────────────────────────────────┤
//! │ Packed payload                               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The CRC-32 covers everything except the checksum field itself.

use crate::encoder::{ArtifactBody, CodingMode, CompressedArtifact};
use crate::error::{PpmhError, Result, StreamError};
use crate::huffman::Codebook;
use crate::symbol::Symbol;
use bitvec::prelude::*;
use crc::{Crc, CRC_32_ISO_HDLC};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Magic bytes of a packed stream
pub const STREAM_MAGIC: [u8; 4] = *b"PPMH";

/// Current container format version
pub const STREAM_FORMAT_VERSION: u8 = 1;

/// Header size in bytes
pub const STREAM_HEADER_SIZE: usize = 36;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// The checksum field is the last 4 header bytes
const CHECKSUM_OFFSET: usize = STREAM_HEADER_SIZE - 4;

/// An ordered sequence of bits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitString {
    bits: BitVec<u8, Msb0>,
}

impl BitString {
    /// Create an empty bit string
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bit string with room for `capacity` bits
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: BitVec::with_capacity(capacity),
        }
    }

    /// Parse the textual '0'/'1' form
    pub fn from_bit_text(text: &str) -> Result<Self> {
        let mut bits = BitVec::with_capacity(text.len());
        for (offset, c) in text.chars().enumerate() {
            match c {
                '0' => bits.push(false),
                '1' => bits.push(true),
                _ => {
                    return Err(StreamError::Malformed(format!(
                        "invalid bit character {:?} at offset {}",
                        c, offset
                    ))
                    .into())
                }
            }
        }
        Ok(Self { bits })
    }

    /// Render as '0'/'1' text
    pub fn to_bit_text(&self) -> String {
        self.iter().map(|bit| if bit { '1' } else { '0' }).collect()
    }

    /// Append one bit
    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Append another bit string
    pub fn extend_from(&mut self, other: &BitString) {
        self.bits.extend_from_bitslice(&other.bits);
    }

    /// Remove the last bit
    pub fn pop(&mut self) -> Option<bool> {
        self.bits.pop()
    }

    /// Remove all bits
    pub fn clear(&mut self) {
        self.bits.clear();
    }

    /// Number of bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether there are no bits
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Bit at `index`
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).map(|bit| *bit)
    }

    /// Iterate over the bits
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().by_vals()
    }

    /// Whether `prefix` is a prefix of this bit string
    pub fn starts_with(&self, prefix: &BitString) -> bool {
        self.bits.starts_with(&prefix.bits)
    }

    /// Borrow the bits
    pub fn as_bitslice(&self) -> &BitSlice<u8, Msb0> {
        &self.bits
    }
}

impl Hash for BitString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.len().hash(state);
        for bit in self.iter() {
            bit.hash(state);
        }
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bit_text())
    }
}

impl FromIterator<bool> for BitString {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

/// Bytes plus the exact number of meaningful bits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBits {
    /// Unpadded bit length
    pub bit_len: u64,
    /// Packed bytes
    pub bytes: Vec<u8>,
}

impl PackedBits {
    /// Zero bits added to fill the final byte
    pub fn padding_bits(&self) -> usize {
        (self.bytes.len() * 8).saturating_sub(self.bit_len as usize)
    }

    /// Recover the bit string
    pub fn unpack(&self) -> Result<BitString> {
        unpack(&self.bytes, Some(self.bit_len))
    }
}

/// Pack bits into bytes, MSB first, final group left-padded
pub fn pack(bits: &BitString) -> PackedBits {
    let bytes = bits
        .bits
        .chunks(8)
        .map(|group| {
            group
                .iter()
                .by_vals()
                .fold(0u8, |byte, bit| (byte << 1) | bit as u8)
        })
        .collect();

    PackedBits {
        bit_len: bits.len() as u64,
        bytes,
    }
}

/// Unpack bytes produced by [`pack`]
///
/// `bit_len` is the unpadded length recorded at packing time; without it
/// the padding cannot be told apart from data.
pub fn unpack(bytes: &[u8], bit_len: Option<u64>) -> Result<BitString> {
    let bit_len = bit_len.ok_or(StreamError::BitLengthUnknown)?;

    let full_bytes = (bit_len / 8) as usize;
    let remainder = (bit_len % 8) as usize;
    let expected_bytes = full_bytes + usize::from(remainder > 0);
    if bytes.len() != expected_bytes {
        return Err(StreamError::BitLengthOverflow {
            bit_len,
            bytes: bytes.len(),
        }
        .into());
    }

    let mut bits = BitString::with_capacity(bit_len as usize);
    for &byte in &bytes[..full_bytes] {
        bits.bits.extend_from_bitslice(byte.view_bits::<Msb0>());
    }
    if remainder > 0 {
        let last = bytes[full_bytes];
        for shift in (0..remainder).rev() {
            bits.push((last >> shift) & 1 == 1);
        }
    }

    Ok(bits)
}

/// A compressed artifact laid out as bytes
#[derive(Debug, Clone, PartialEq)]
pub struct PackedStream {
    /// Coding mode of the payload
    pub mode: CodingMode,
    /// Context order used for encoding
    pub max_order: u8,
    /// Number of encoded symbols
    pub symbol_count: u64,
    /// Fingerprint of the model (0 in static mode)
    pub model_fingerprint: u64,
    /// Codebook (static mode only)
    pub codebook: Option<Codebook>,
    /// Packed payload
    pub payload: PackedBits,
}

impl PackedStream {
    /// Lay out an artifact
    pub fn from_artifact(artifact: &CompressedArtifact) -> Self {
        let (max_order, model_fingerprint, codebook) = match artifact.body() {
            ArtifactBody::Static {
                max_order,
                codebook,
            } => (*max_order as u8, 0, Some(codebook.clone())),
            ArtifactBody::PerPosition {
                max_order,
                model_fingerprint,
            } => (*max_order as u8, *model_fingerprint, None),
        };

        Self {
            mode: artifact.mode(),
            max_order,
            symbol_count: artifact.symbol_count() as u64,
            model_fingerprint,
            codebook,
            payload: pack(artifact.bits()),
        }
    }

    /// Rebuild the artifact
    pub fn into_artifact(self) -> Result<CompressedArtifact> {
        let bits = self.payload.unpack()?;
        let body = match (self.mode, self.codebook) {
            (CodingMode::Static, Some(codebook)) => ArtifactBody::Static {
                max_order: self.max_order as usize,
                codebook,
            },
            (CodingMode::Static, None) => {
                return Err(StreamError::Malformed("static stream without codebook".into()).into())
            }
            (CodingMode::PerPosition, _) => ArtifactBody::PerPosition {
                max_order: self.max_order as usize,
                model_fingerprint: self.model_fingerprint,
            },
        };
        Ok(CompressedArtifact::new(
            self.symbol_count as usize,
            bits,
            body,
        ))
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(self.payload.bytes.len() + 64);
        if let Some(codebook) = &self.codebook {
            write_codebook(codebook, &mut body);
        }
        body.extend_from_slice(&self.payload.bytes);

        let mut bytes = Vec::with_capacity(STREAM_HEADER_SIZE + body.len());
        bytes.extend_from_slice(&STREAM_MAGIC);
        bytes.push(STREAM_FORMAT_VERSION);
        bytes.push(self.mode as u8);
        bytes.push(self.max_order);
        bytes.push(0); // reserved
        bytes.extend_from_slice(&self.symbol_count.to_le_bytes());
        bytes.extend_from_slice(&self.payload.bit_len.to_le_bytes());
        bytes.extend_from_slice(&self.model_fingerprint.to_le_bytes());

        let mut digest = CRC32.digest();
        digest.update(&bytes);
        digest.update(&body);
        bytes.extend_from_slice(&digest.finalize().to_le_bytes());
        bytes.extend_from_slice(&body);
        bytes
    }

    /// Deserialize from bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < STREAM_HEADER_SIZE {
            return Err(StreamError::BufferTooShort {
                needed: STREAM_HEADER_SIZE,
                available: data.len(),
            }
            .into());
        }

        let magic = [data[0], data[1], data[2], data[3]];
        if magic != STREAM_MAGIC {
            return Err(StreamError::InvalidMagic(magic).into());
        }

        let version = data[4];
        if version > STREAM_FORMAT_VERSION {
            return Err(StreamError::UnsupportedVersion {
                found: version,
                supported: STREAM_FORMAT_VERSION,
            }
            .into());
        }

        let mode = CodingMode::from_u8(data[5]).ok_or(StreamError::UnknownMode(data[5]))?;
        let max_order = data[6];
        let symbol_count = read_u64(data, 8);
        let bit_len = read_u64(data, 16);
        let model_fingerprint = read_u64(data, 24);
        let checksum = u32::from_le_bytes([
            data[CHECKSUM_OFFSET],
            data[CHECKSUM_OFFSET + 1],
            data[CHECKSUM_OFFSET + 2],
            data[CHECKSUM_OFFSET + 3],
        ]);

        let body = &data[STREAM_HEADER_SIZE..];
        let mut digest = CRC32.digest();
        digest.update(&data[..CHECKSUM_OFFSET]);
        digest.update(body);
        let actual = digest.finalize();
        if actual != checksum {
            return Err(StreamError::ChecksumMismatch {
                expected: checksum,
                actual,
            }
            .into());
        }

        let (codebook, offset) = match mode {
            CodingMode::Static => {
                let (codebook, consumed) = read_codebook(body)?;
                (Some(codebook), consumed)
            }
            CodingMode::PerPosition => (None, 0),
        };

        Ok(Self {
            mode,
            max_order,
            symbol_count,
            model_fingerprint,
            codebook,
            payload: PackedBits {
                bit_len,
                bytes: body[offset..].to_vec(),
            },
        })
    }
}

fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(buf)
}

/// entry count (1), then per entry: symbol (1), length (1), packed codeword
fn write_codebook(codebook: &Codebook, out: &mut Vec<u8>) {
    out.push(codebook.len() as u8);
    for (symbol, codeword) in codebook.iter() {
        let packed = pack(codeword);
        out.push(symbol.index());
        out.push(packed.bit_len as u8);
        out.extend_from_slice(&packed.bytes);
    }
}

fn read_codebook(data: &[u8]) -> Result<(Codebook, usize)> {
    let too_short = |needed: usize| -> PpmhError {
        StreamError::BufferTooShort {
            needed,
            available: data.len(),
        }
        .into()
    };

    let count = *data.first().ok_or_else(|| too_short(1))? as usize;
    let mut offset = 1;
    let mut codewords = BTreeMap::new();

    for _ in 0..count {
        if offset + 2 > data.len() {
            return Err(too_short(offset + 2));
        }
        let symbol = Symbol::from_index(data[offset])?;
        let bit_len = data[offset + 1] as u64;
        offset += 2;

        let byte_len = (bit_len as usize + 7) / 8;
        if offset + byte_len > data.len() {
            return Err(too_short(offset + byte_len));
        }
        let codeword = unpack(&data[offset..offset + byte_len], Some(bit_len))?;
        offset += byte_len;

        codewords.insert(symbol, codeword);
    }

    Ok((Codebook::from_codewords(codewords)?, offset))
}
