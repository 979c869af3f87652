// PPMH - PPM context modelling with Huffman coding
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Huffman prefix code construction
//!
//! The tree lives in an arena: nodes sit in a `Vec` and internal nodes
//! refer to their children by [`NodeId`]. Codewords are assigned with an
//! explicit worklist, so a heavily skewed distribution (a deep, comb-shaped
//! tree) cannot exhaust the call stack.
//!
//! Construction is deterministic: leaves are queued in symbol order and
//! equal weights are broken by queue order, so the same weights always give
//! the same codebook. Encoder and decoder rely on this when codebooks are
//! rebuilt per position.

use crate::bitstream::BitString;
use crate::context::Distribution;
use crate::error::{CodeError, DecodeError, PpmhError, Result};
use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

/// Handle of a node in a [`HuffmanTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node of the code tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Symbol with its weight
    Leaf { symbol: Symbol, weight: f64 },
    /// Two children and the sum of their weights
    Internal {
        left: NodeId,
        right: NodeId,
        weight: f64,
    },
}

impl Node {
    /// Weight of the subtree
    pub fn weight(&self) -> f64 {
        match self {
            Node::Leaf { weight, .. } | Node::Internal { weight, .. } => *weight,
        }
    }
}

/// Min-heap entry: lowest weight first, then oldest first
#[derive(Debug)]
struct QueueEntry {
    weight: f64,
    order: usize,
    node: NodeId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .weight
            .total_cmp(&self.weight)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Huffman tree stored as an arena
#[derive(Debug, Clone, PartialEq)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl HuffmanTree {
    /// Build a tree from symbol weights
    ///
    /// Repeated symbols have their weights summed. Symbols with zero weight
    /// get no leaf. Fails with `EmptyAlphabet` when no weight is positive
    /// and `InvalidWeight` on negative or NaN weights.
    pub fn build<I>(weights: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Symbol, f64)>,
    {
        let mut merged: BTreeMap<Symbol, f64> = BTreeMap::new();
        for (symbol, weight) in weights {
            if weight.is_nan() || weight < 0.0 {
                return Err(CodeError::InvalidWeight {
                    symbol: symbol.as_char(),
                    weight,
                }
                .into());
            }
            *merged.entry(symbol).or_insert(0.0) += weight;
        }

        let mut nodes = Vec::with_capacity(merged.len() * 2);
        let mut queue = BinaryHeap::with_capacity(merged.len());
        for (symbol, weight) in merged.into_iter().filter(|&(_, w)| w > 0.0) {
            let node = NodeId(nodes.len());
            nodes.push(Node::Leaf { symbol, weight });
            queue.push(QueueEntry {
                weight,
                order: node.0,
                node,
            });
        }

        while queue.len() > 1 {
            let (Some(left), Some(right)) = (queue.pop(), queue.pop()) else {
                break;
            };
            let weight = left.weight + right.weight;
            let node = NodeId(nodes.len());
            nodes.push(Node::Internal {
                left: left.node,
                right: right.node,
                weight,
            });
            queue.push(QueueEntry {
                weight,
                order: node.0,
                node,
            });
        }

        let root = queue.pop().ok_or(CodeError::EmptyAlphabet)?.node;
        Ok(Self { nodes, root })
    }

    /// Build a tree from a predicted distribution
    pub fn from_distribution(distribution: &Distribution) -> Result<Self> {
        Self::build(distribution.iter())
    }

    /// Root node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node by handle
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a built tree has at least one leaf
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Assign codewords: '0' for left, '1' for right
    ///
    /// A lone leaf gets the single-bit codeword `0`.
    pub fn codebook(&self) -> Codebook {
        let mut codes = BTreeMap::new();
        let mut stack = vec![(self.root, BitString::new())];

        while let Some((id, prefix)) = stack.pop() {
            match self.node(id) {
                Node::Leaf { symbol, .. } => {
                    let codeword = if prefix.is_empty() {
                        std::iter::once(false).collect()
                    } else {
                        prefix
                    };
                    codes.insert(*symbol, codeword);
                }
                Node::Internal { left, right, .. } => {
                    let mut right_code = prefix.clone();
                    right_code.push(true);
                    stack.push((*right, right_code));

                    let mut left_code = prefix;
                    left_code.push(false);
                    stack.push((*left, left_code));
                }
            }
        }

        Codebook::from_codes(codes)
    }
}

/// Two-way mapping between symbols and prefix-free codewords
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Symbol, String>",
    into = "BTreeMap<Symbol, String>"
)]
pub struct Codebook {
    codes: BTreeMap<Symbol, BitString>,
    reverse: HashMap<BitString, Symbol>,
    max_len: usize,
}

impl Codebook {
    /// Build the Huffman codebook for some weights
    pub fn build<I>(weights: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Symbol, f64)>,
    {
        Ok(HuffmanTree::build(weights)?.codebook())
    }

    /// Build the Huffman codebook for a distribution
    pub fn from_distribution(distribution: &Distribution) -> Result<Self> {
        Self::build(distribution.iter())
    }

    /// Accept an externally supplied mapping after validating it
    ///
    /// Codewords must be non-empty, distinct and prefix-free.
    pub fn from_codewords(codes: BTreeMap<Symbol, BitString>) -> Result<Self> {
        if codes.is_empty() {
            return Err(CodeError::EmptyAlphabet.into());
        }
        if let Some(empty) = codes.values().find(|c| c.is_empty()) {
            return Err(CodeError::InvalidCodeword(empty.to_bit_text()).into());
        }
        check_prefix_free(codes.values())?;
        Ok(Self::from_codes(codes))
    }

    fn from_codes(codes: BTreeMap<Symbol, BitString>) -> Self {
        let reverse = codes
            .iter()
            .map(|(&symbol, code)| (code.clone(), symbol))
            .collect();
        let max_len = codes.values().map(BitString::len).max().unwrap_or(0);
        Self {
            codes,
            reverse,
            max_len,
        }
    }

    /// Codeword of a symbol
    pub fn codeword(&self, symbol: Symbol) -> Option<&BitString> {
        self.codes.get(&symbol)
    }

    /// Symbol of an exact codeword
    pub fn symbol(&self, codeword: &BitString) -> Option<Symbol> {
        self.reverse.get(codeword).copied()
    }

    /// Number of symbols
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the codebook is empty
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Iterate over (symbol, codeword) in symbol order
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &BitString)> + '_ {
        self.codes.iter().map(|(&s, c)| (s, c))
    }

    /// Longest codeword length
    pub fn max_codeword_len(&self) -> usize {
        self.max_len
    }

    /// Whether no codeword is a prefix of another
    pub fn is_prefix_free(&self) -> bool {
        check_prefix_free(self.codes.values()).is_ok()
    }

    /// Expected codeword length under a distribution, in bits
    pub fn expected_length(&self, distribution: &Distribution) -> f64 {
        distribution
            .iter()
            .filter_map(|(symbol, p)| self.codeword(symbol).map(|c| p * c.len() as f64))
            .sum()
    }

    /// Append the codeword of one symbol
    pub fn encode_symbol(&self, symbol: Symbol, out: &mut BitString) -> Result<()> {
        let codeword = self.codeword(symbol).ok_or(CodeError::UnknownSymbol {
            symbol: symbol.as_char(),
        })?;
        out.extend_from(codeword);
        Ok(())
    }

    /// Concatenate the codewords of a sequence
    ///
    /// Fails on the first symbol without a codeword; nothing is skipped.
    pub fn encode(&self, symbols: &[Symbol]) -> Result<BitString> {
        let mut bits = BitString::with_capacity(symbols.len() * self.max_len.max(1));
        for &symbol in symbols {
            self.encode_symbol(symbol, &mut bits)?;
        }
        Ok(bits)
    }

    /// Greedily decode a whole bit string
    pub fn decode(&self, bits: &BitString) -> Result<Vec<Symbol>> {
        let mut symbols = Vec::new();
        let mut cursor = 0;
        while cursor < bits.len() {
            symbols.push(self.decode_one(bits, &mut cursor)?);
        }
        Ok(symbols)
    }

    /// Decode the single codeword starting at `cursor`
    ///
    /// On success `cursor` moves past the codeword. Fails with
    /// `IncompleteCode` when the remaining bits match no codeword.
    pub fn decode_one(&self, bits: &BitString, cursor: &mut usize) -> Result<Symbol> {
        let start = *cursor;
        let mut buffer = BitString::with_capacity(self.max_len);

        for position in start..bits.len() {
            if buffer.len() >= self.max_len {
                break;
            }
            buffer.push(bits.get(position).unwrap_or(false));
            if let Some(symbol) = self.symbol(&buffer) {
                *cursor = position + 1;
                return Ok(symbol);
            }
        }

        Err(DecodeError::IncompleteCode {
            leftover_bits: bits.len() - start,
        }
        .into())
    }
}

fn check_prefix_free<'a, I>(codewords: I) -> Result<()>
where
    I: IntoIterator<Item = &'a BitString>,
{
    // In lexicographic order a prefix sorts right before its extensions
    let mut texts: Vec<String> = codewords.into_iter().map(BitString::to_bit_text).collect();
    texts.sort();
    for pair in texts.windows(2) {
        if pair[1].starts_with(pair[0].as_str()) {
            return Err(CodeError::NotPrefixFree {
                prefix: pair[0].clone(),
                codeword: pair[1].clone(),
            }
            .into());
        }
    }
    Ok(())
}

impl TryFrom<BTreeMap<Symbol, String>> for Codebook {
    type Error = PpmhError;

    fn try_from(map: BTreeMap<Symbol, String>) -> Result<Self> {
        let codes = map
            .into_iter()
            .map(|(symbol, text)| {
                BitString::from_bit_text(&text)
                    .map(|code| (symbol, code))
                    .map_err(|_| CodeError::InvalidCodeword(text).into())
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        Self::from_codewords(codes)
    }
}

impl From<Codebook> for BTreeMap<Symbol, String> {
    fn from(codebook: Codebook) -> Self {
        codebook
            .codes
            .into_iter()
            .map(|(symbol, code)| (symbol, code.to_bit_text()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::parse_symbols;
    use approx::assert_relative_eq;

    fn sym(c: char) -> Symbol {
        Symbol::from_char(c).unwrap()
    }

    fn weights(pairs: &[(char, f64)]) -> Vec<(Symbol, f64)> {
        pairs.iter().map(|&(c, w)| (sym(c), w)).collect()
    }

    #[test]
    fn test_empty_alphabet() {
        let err = Codebook::build(Vec::new()).unwrap_err();
        assert_eq!(err, PpmhError::Code(CodeError::EmptyAlphabet));

        let err = Codebook::build(weights(&[('a', 0.0), ('b', 0.0)])).unwrap_err();
        assert_eq!(err, PpmhError::Code(CodeError::EmptyAlphabet));
    }

    #[test]
    fn test_invalid_weight() {
        let err = Codebook::build(weights(&[('a', -1.0)])).unwrap_err();
        assert!(matches!(
            err,
            PpmhError::Code(CodeError::InvalidWeight { symbol: 'a', .. })
        ));
        assert!(Codebook::build(weights(&[('a', f64::NAN)])).is_err());
    }

    #[test]
    fn test_single_symbol_gets_one_bit() {
        let codebook = Codebook::build(weights(&[('x', 5.0)])).unwrap();
        assert_eq!(codebook.len(), 1);
        assert_eq!(codebook.codeword(sym('x')).unwrap().to_bit_text(), "0");

        let bits = codebook.encode(&parse_symbols("xxx").unwrap()).unwrap();
        assert_eq!(bits.to_bit_text(), "000");
        assert_eq!(codebook.decode(&bits).unwrap().len(), 3);
    }

    #[test]
    fn test_two_symbols() {
        let codebook = Codebook::build(weights(&[('a', 0.5), ('b', 0.5)])).unwrap();
        let a = codebook.codeword(sym('a')).unwrap().to_bit_text();
        let b = codebook.codeword(sym('b')).unwrap().to_bit_text();
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_optimal_lengths() {
        // Classic example: lengths 1, 2, 3, 3
        let codebook =
            Codebook::build(weights(&[('a', 0.5), ('b', 0.25), ('c', 0.125), ('d', 0.125)]))
                .unwrap();
        assert_eq!(codebook.codeword(sym('a')).unwrap().len(), 1);
        assert_eq!(codebook.codeword(sym('b')).unwrap().len(), 2);
        assert_eq!(codebook.codeword(sym('c')).unwrap().len(), 3);
        assert_eq!(codebook.codeword(sym('d')).unwrap().len(), 3);
        assert!(codebook.is_prefix_free());
        assert_eq!(codebook.max_codeword_len(), 3);
    }

    #[test]
    fn test_expected_length_matches_entropy_for_dyadic() {
        let mut probs = BTreeMap::new();
        probs.insert(sym('a'), 0.5);
        probs.insert(sym('b'), 0.25);
        probs.insert(sym('c'), 0.25);
        let dist = Distribution::from_probabilities(probs);

        let codebook = Codebook::from_distribution(&dist).unwrap();
        assert_relative_eq!(codebook.expected_length(&dist), 1.5);
        assert_relative_eq!(dist.entropy(), 1.5);
    }

    #[test]
    fn test_deterministic_construction() {
        let w = weights(&[('e', 3.0), ('t', 3.0), ('a', 3.0), ('o', 1.0), ('n', 1.0)]);
        let first = Codebook::build(w.clone()).unwrap();
        for _ in 0..10 {
            assert_eq!(Codebook::build(w.clone()).unwrap(), first);
        }
        // Input order does not matter either
        let mut reversed = w;
        reversed.reverse();
        assert_eq!(Codebook::build(reversed).unwrap(), first);
    }

    #[test]
    fn test_repeated_symbols_are_merged() {
        let codebook = Codebook::build(weights(&[('a', 1.0), ('a', 1.0), ('b', 2.0)])).unwrap();
        assert_eq!(codebook.len(), 2);
    }

    #[test]
    fn test_skewed_weights_deep_tree() {
        // Fibonacci-like weights produce a comb of maximal depth
        let mut w = Vec::new();
        let (mut x, mut y) = (1.0, 1.0);
        for symbol in Symbol::all() {
            w.push((symbol, x));
            let next = x + y;
            x = y;
            y = next;
        }
        let tree = HuffmanTree::build(w).unwrap();
        assert_eq!(tree.leaf_count(), 28);
        assert_eq!(tree.len(), 55);

        let codebook = tree.codebook();
        assert_eq!(codebook.max_codeword_len(), 27);
        assert!(codebook.is_prefix_free());
    }

    #[test]
    fn test_tree_arena() {
        let tree = HuffmanTree::build(weights(&[('a', 1.0), ('b', 2.0), ('c', 4.0)])).unwrap();
        assert_eq!(tree.len(), 5);
        assert_relative_eq!(tree.node(tree.root()).weight(), 7.0);
        match tree.node(tree.root()) {
            Node::Internal { left, right, .. } => {
                // The lighter subtree (a+b) is popped first and goes left
                assert_relative_eq!(tree.node(*left).weight(), 3.0);
                assert_relative_eq!(tree.node(*right).weight(), 4.0);
            }
            Node::Leaf { .. } => panic!("root should be internal"),
        }
    }

    #[test]
    fn test_encode_decode() {
        let text = parse_symbols("abracadabra").unwrap();
        let mut counts: BTreeMap<Symbol, f64> = BTreeMap::new();
        for &s in &text {
            *counts.entry(s).or_insert(0.0) += 1.0;
        }
        let codebook = Codebook::build(counts).unwrap();
        let bits = codebook.encode(&text).unwrap();
        assert_eq!(codebook.decode(&bits).unwrap(), text);
    }

    #[test]
    fn test_unknown_symbol_fails() {
        let codebook = Codebook::build(weights(&[('a', 1.0), ('b', 1.0)])).unwrap();
        let err = codebook.encode(&parse_symbols("abz").unwrap()).unwrap_err();
        assert_eq!(err, PpmhError::Code(CodeError::UnknownSymbol { symbol: 'z' }));
    }

    #[test]
    fn test_incomplete_code() {
        let codebook =
            Codebook::build(weights(&[('a', 0.5), ('b', 0.25), ('c', 0.25)])).unwrap();
        let mut bits = codebook.encode(&parse_symbols("ab").unwrap()).unwrap();
        // 'b' and 'c' have two-bit codewords; a lone '1' completes neither
        bits.push(true);

        let err = codebook.decode(&bits).unwrap_err();
        assert_eq!(
            err,
            PpmhError::Decode(DecodeError::IncompleteCode { leftover_bits: 1 })
        );
    }

    #[test]
    fn test_decode_one_advances_cursor() {
        let codebook =
            Codebook::build(weights(&[('a', 0.5), ('b', 0.25), ('c', 0.25)])).unwrap();
        let bits = codebook.encode(&parse_symbols("cab").unwrap()).unwrap();

        let mut cursor = 0;
        assert_eq!(codebook.decode_one(&bits, &mut cursor).unwrap(), sym('c'));
        assert_eq!(cursor, 2);
        assert_eq!(codebook.decode_one(&bits, &mut cursor).unwrap(), sym('a'));
        assert_eq!(codebook.decode_one(&bits, &mut cursor).unwrap(), sym('b'));
        assert_eq!(cursor, bits.len());
    }

    #[test]
    fn test_from_codewords_rejects_prefix() {
        let mut codes = BTreeMap::new();
        codes.insert(sym('a'), BitString::from_bit_text("0").unwrap());
        codes.insert(sym('b'), BitString::from_bit_text("01").unwrap());
        let err = Codebook::from_codewords(codes).unwrap_err();
        assert!(matches!(err, PpmhError::Code(CodeError::NotPrefixFree { .. })));
    }

    #[test]
    fn test_serde_json_roundtrip() {
        let codebook =
            Codebook::build(weights(&[('a', 0.5), (' ', 0.25), ('\n', 0.25)])).unwrap();
        let json = serde_json::to_string(&codebook).unwrap();
        assert!(json.contains("\"a\":\"0\""));

        let restored: Codebook = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, codebook);

        assert!(serde_json::from_str::<Codebook>(r#"{"a":"0","b":"01"}"#).is_err());
    }
}
