//! Context model module
//!
//! This module accumulates the finite-context statistics used for prediction:
//! - Context table: preceding symbols -> counts of the symbol that followed
//! - Back-off prediction from the longest known suffix down to the empty context
//! - Fingerprint of the table so an adaptive stream can name its model

use crate::error::{ModelError, Result};
use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use xxhash_rust::xxh64::xxh64;

/// Highest supported context order
pub const MAX_ORDER: usize = 5;

/// Default context order
pub const DEFAULT_ORDER: usize = 4;

/// Probability distribution over the next symbol
///
/// Keys iterate in symbol order, so two equal distributions always
/// feed the code builder the same leaf sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Distribution {
    probabilities: BTreeMap<Symbol, f64>,
}

impl Distribution {
    /// Normalize a count table, `None` when the total is zero
    pub fn from_counts(counts: &BTreeMap<Symbol, u64>) -> Option<Self> {
        let total: u64 = counts.values().sum();
        if total == 0 {
            return None;
        }
        let probabilities = counts
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(&symbol, &count)| (symbol, count as f64 / total as f64))
            .collect();
        Some(Self { probabilities })
    }

    /// Build from raw probabilities (not renormalized)
    pub fn from_probabilities(probabilities: BTreeMap<Symbol, f64>) -> Self {
        Self { probabilities }
    }

    /// Probability of a symbol (0 if absent)
    pub fn probability(&self, symbol: Symbol) -> f64 {
        self.probabilities.get(&symbol).copied().unwrap_or(0.0)
    }

    /// Iterate over (symbol, probability) in symbol order
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, f64)> + '_ {
        self.probabilities.iter().map(|(&s, &p)| (s, p))
    }

    /// Number of symbols in the support
    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    /// Whether the distribution is empty
    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Underlying map
    pub fn as_map(&self) -> &BTreeMap<Symbol, f64> {
        &self.probabilities
    }

    /// Shannon entropy in bits
    pub fn entropy(&self) -> f64 {
        crate::entropy::entropy(self)
    }
}

/// Result of a prediction
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Distribution of the next symbol
    pub distribution: Distribution,
    /// Context length actually used after back-off
    pub order: usize,
}

/// Counts of the symbols seen after one context
#[derive(Debug, Clone, Default, PartialEq)]
struct SymbolCounts {
    counts: BTreeMap<Symbol, u64>,
    total: u64,
}

impl SymbolCounts {
    fn increment(&mut self, symbol: Symbol) {
        *self.counts.entry(symbol).or_insert(0) += 1;
        self.total += 1;
    }
}

/// Configuration for the context model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Longest context considered (0..=MAX_ORDER)
    pub max_order: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            max_order: DEFAULT_ORDER,
        }
    }
}

impl ModelConfig {
    /// Configuration with a specific order
    pub fn with_order(max_order: usize) -> Self {
        Self { max_order }
    }

    /// Check the order against the supported range
    pub fn validate(&self) -> Result<()> {
        if self.max_order > MAX_ORDER {
            return Err(ModelError::InvalidOrder {
                order: self.max_order,
                max: MAX_ORDER,
            }
            .into());
        }
        Ok(())
    }
}

/// Finite-context model with back-off prediction
#[derive(Debug, Clone, PartialEq)]
pub struct ContextModel {
    /// Context -> counts of the following symbol
    table: HashMap<Vec<Symbol>, SymbolCounts>,
    /// Configuration
    config: ModelConfig,
    /// Number of symbols consumed by training
    trained_symbols: u64,
}

impl ContextModel {
    /// Create an empty model with the default order
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            config: ModelConfig::default(),
            trained_symbols: 0,
        }
    }

    /// Create an empty model with custom configuration
    pub fn with_config(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            table: HashMap::new(),
            config,
            trained_symbols: 0,
        })
    }

    /// Create an empty model of a given order
    pub fn with_order(max_order: usize) -> Result<Self> {
        Self::with_config(ModelConfig::with_order(max_order))
    }

    /// Configured maximum order
    pub fn max_order(&self) -> usize {
        self.config.max_order
    }

    /// Configuration
    pub fn config(&self) -> ModelConfig {
        self.config
    }

    /// Whether any statistics exist
    pub fn is_trained(&self) -> bool {
        self.trained_symbols > 0
    }

    /// Number of symbols consumed by training
    pub fn trained_symbols(&self) -> u64 {
        self.trained_symbols
    }

    /// Number of distinct contexts in the table
    pub fn context_count(&self) -> usize {
        self.table.len()
    }

    /// Number of (context, symbol) entries in the table
    pub fn entry_count(&self) -> usize {
        self.table.values().map(|c| c.counts.len()).sum()
    }

    /// Record one occurrence of `symbol` after `context`
    ///
    /// Only the exact context is touched; `train` handles the suffixes.
    pub fn observe(&mut self, context: &[Symbol], symbol: Symbol) {
        match self.table.get_mut(context) {
            Some(counts) => counts.increment(symbol),
            None => {
                let mut counts = SymbolCounts::default();
                counts.increment(symbol);
                self.table.insert(context.to_vec(), counts);
            }
        }
    }

    /// Train on a full sequence
    ///
    /// For every position `i` and every length `k` in `0..=min(i, K)`, the
    /// `k` symbols ending before `i` gain one occurrence of `sequence[i]`.
    pub fn train(&mut self, sequence: &[Symbol]) {
        let max_order = self.config.max_order;
        for (i, &symbol) in sequence.iter().enumerate() {
            for k in 0..=i.min(max_order) {
                self.observe(&sequence[i - k..i], symbol);
            }
        }
        self.trained_symbols += sequence.len() as u64;

        #[cfg(feature = "logging")]
        log::debug!(
            "trained order-{} model on {} symbols: {} contexts, {} entries",
            max_order,
            sequence.len(),
            self.table.len(),
            self.entry_count()
        );
    }

    /// Total count recorded for an exact context (0 if absent)
    pub fn total(&self, context: &[Symbol]) -> u64 {
        self.table.get(context).map(|c| c.total).unwrap_or(0)
    }

    /// Count of `symbol` after an exact context (0 if absent)
    pub fn count(&self, context: &[Symbol], symbol: Symbol) -> u64 {
        self.table
            .get(context)
            .and_then(|c| c.counts.get(&symbol).copied())
            .unwrap_or(0)
    }

    /// Raw counts for an exact context
    pub fn counts(&self, context: &[Symbol]) -> Option<&BTreeMap<Symbol, u64>> {
        self.table.get(context).map(|c| &c.counts)
    }

    /// Predict the next-symbol distribution after `context`
    ///
    /// The context is cut to its last `K` symbols, then shortened from the
    /// front until a suffix with a positive total is found. Fails with
    /// `NoPrediction` only when even the empty context is unobserved.
    pub fn predict(&self, context: &[Symbol]) -> Result<Prediction> {
        let start = context.len().saturating_sub(self.config.max_order);
        let context = &context[start..];

        for order in (0..=context.len()).rev() {
            let suffix = &context[context.len() - order..];
            if let Some(counts) = self.table.get(suffix) {
                if let Some(distribution) = Distribution::from_counts(&counts.counts) {
                    return Ok(Prediction {
                        distribution,
                        order,
                    });
                }
            }
        }

        Err(ModelError::NoPrediction.into())
    }

    /// Predict for position `index` of `sequence`, using its preceding symbols
    pub fn predict_at(&self, sequence: &[Symbol], index: usize) -> Result<Prediction> {
        let start = index.saturating_sub(self.config.max_order);
        self.predict(&sequence[start..index])
    }

    /// Hash of the whole table, independent of insertion order
    pub fn fingerprint(&self) -> u64 {
        let mut contexts: Vec<_> = self.table.keys().collect();
        contexts.sort();

        let mut data = Vec::with_capacity(16 + contexts.len() * 16);
        data.push(self.config.max_order as u8);
        for context in contexts {
            if let Some(counts) = self.table.get(context) {
                data.push(context.len() as u8);
                data.extend(context.iter().map(|s| s.index()));
                data.extend_from_slice(&(counts.counts.len() as u16).to_le_bytes());
                for (symbol, count) in &counts.counts {
                    data.push(symbol.index());
                    data.extend_from_slice(&count.to_le_bytes());
                }
            }
        }

        xxh64(&data, 0)
    }

    /// Drop all statistics
    pub fn reset(&mut self) {
        self.table.clear();
        self.trained_symbols = 0;
    }
}

impl Default for ContextModel {
    fn default() -> Self {
        Self::new()
    }
}
