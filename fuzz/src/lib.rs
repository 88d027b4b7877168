//! MiniOS Fuzzing Infrastructure
//!
//! Drives the script engine with mutated page scripts and checks that it
//! keeps its invariants whatever the input.

#![no_std]
extern crate alloc;

pub mod harness;
pub mod script;

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashSet;

/// Fuzzing target trait
pub trait FuzzTarget {
    /// Name of the fuzz target
    fn name(&self) -> &str;

    /// Run fuzzing iteration with input
    fn fuzz(&mut self, input: &[u8]) -> FuzzResult;

    /// Reset state between iterations
    fn reset(&mut self);
}

/// Result of a fuzz iteration
#[derive(Debug, Clone, PartialEq)]
pub enum FuzzResult {
    /// Input ran and every invariant held
    Ok,
    /// Input was not fed to the engine (too large, not UTF-8)
    Rejected(String),
    /// Input ran and hit a new kind of outcome worth keeping
    Interesting(u64),
    /// An engine invariant was broken
    Violation(String),
}

impl FuzzResult {
    /// Check if this is an invariant violation
    pub fn is_violation(&self) -> bool {
        matches!(self, FuzzResult::Violation(_))
    }

    /// Check if this is interesting
    pub fn is_interesting(&self) -> bool {
        matches!(self, FuzzResult::Interesting(_) | FuzzResult::Violation(_))
    }
}

/// Fuzzer configuration
#[derive(Debug, Clone)]
pub struct FuzzerConfig {
    /// Maximum input size in bytes
    pub max_input_size: usize,
    /// Mutator seed
    pub seed: u64,
    /// Maximum corpus entries
    pub max_corpus: usize,
    /// Also run every input with lexical scoping
    pub lexical: bool,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        Self {
            max_input_size: 4096,
            seed: 12345,
            max_corpus: 1024,
            lexical: true,
        }
    }
}

/// Fuzzing statistics
#[derive(Debug, Clone, Default)]
pub struct FuzzStats {
    /// Total iterations
    pub iterations: u64,
    /// Invariant violations found
    pub violations: u64,
    /// Distinct violating inputs kept
    pub unique_violations: u64,
    /// Inputs rejected before execution
    pub rejected: u64,
    /// Corpus size
    pub corpus_size: usize,
}

/// Mutator for input generation
pub struct Mutator {
    /// Current seed
    seed: u64,
    /// Tokens spliced into inputs
    dictionary: Vec<Vec<u8>>,
}

impl Mutator {
    /// Create a new mutator
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            dictionary: Vec::new(),
        }
    }

    /// Add dictionary entry
    pub fn add_dictionary(&mut self, entry: Vec<u8>) {
        self.dictionary.push(entry);
    }

    /// Next pseudo-random value
    pub fn next_u64(&mut self) -> u64 {
        self.seed = self.seed.wrapping_mul(1103515245).wrapping_add(12345);
        self.seed >> 16
    }

    fn below(&mut self, n: usize) -> usize {
        if n == 0 {
            0
        } else {
            (self.next_u64() as usize) % n
        }
    }

    /// Mutate input
    pub fn mutate(&mut self, input: &mut Vec<u8>) {
        match self.below(8) {
            0 => self.byte_replace(input),
            1 => self.byte_insert(input),
            2 => self.byte_delete(input),
            3 => self.token_insert(input),
            4 => self.token_insert(input),
            5 => self.duplicate_range(input),
            6 => self.swap_delimiter(input),
            _ => self.havoc(input),
        }
    }

    fn byte_replace(&mut self, input: &mut Vec<u8>) {
        if input.is_empty() {
            return;
        }
        let pos = self.below(input.len());
        input[pos] = self.printable();
    }

    fn byte_insert(&mut self, input: &mut Vec<u8>) {
        let pos = self.below(input.len() + 1);
        let byte = self.printable();
        input.insert(pos, byte);
    }

    fn byte_delete(&mut self, input: &mut Vec<u8>) {
        if input.is_empty() {
            return;
        }
        let pos = self.below(input.len());
        input.remove(pos);
    }

    /// Insert a dictionary token at a random position.
    fn token_insert(&mut self, input: &mut Vec<u8>) {
        if self.dictionary.is_empty() {
            return self.byte_insert(input);
        }
        let idx = self.below(self.dictionary.len());
        let pos = self.below(input.len() + 1);
        let token = self.dictionary[idx].clone();
        input.splice(pos..pos, token);
    }

    /// Repeat a slice of the input in place; grows nesting quickly.
    fn duplicate_range(&mut self, input: &mut Vec<u8>) {
        if input.is_empty() {
            return;
        }
        let start = self.below(input.len());
        let len = 1 + self.below((input.len() - start).min(32));
        let chunk: Vec<u8> = input[start..start + len].to_vec();
        input.splice(start..start, chunk);
    }

    /// Replace a delimiter with another one to unbalance the script.
    fn swap_delimiter(&mut self, input: &mut Vec<u8>) {
        const DELIMITERS: &[u8] = b"(){};\"'`";
        let positions: Vec<usize> = input
            .iter()
            .enumerate()
            .filter(|(_, b)| DELIMITERS.contains(*b))
            .map(|(i, _)| i)
            .collect();
        if positions.is_empty() {
            return;
        }
        let pos = positions[self.below(positions.len())];
        input[pos] = DELIMITERS[self.below(DELIMITERS.len())];
    }

    fn havoc(&mut self, input: &mut Vec<u8>) {
        let rounds = self.below(8) + 1;
        for _ in 0..rounds {
            match self.below(5) {
                0 => self.byte_replace(input),
                1 => self.byte_insert(input),
                2 => self.byte_delete(input),
                3 => self.token_insert(input),
                _ => self.swap_delimiter(input),
            }
        }
    }

    fn printable(&mut self) -> u8 {
        // Mostly printable ASCII, occasionally any byte.
        if self.below(16) == 0 {
            (self.next_u64() & 0xFF) as u8
        } else {
            b' ' + self.below(95) as u8
        }
    }
}

/// Corpus manager
///
/// Keeps one input per distinct outcome signature, oldest evicted first.
pub struct Corpus {
    /// Input entries
    entries: VecDeque<CorpusEntry>,
    /// Signatures already represented
    seen: HashSet<u64>,
    /// Maximum size
    max_size: usize,
}

/// A corpus entry
#[derive(Debug, Clone)]
pub struct CorpusEntry {
    /// Input data
    pub data: Vec<u8>,
    /// Outcome signature this input produced
    pub signature: u64,
    /// Times picked as a mutation base
    pub exec_count: u64,
}

impl Corpus {
    /// Create new corpus
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            seen: HashSet::new(),
            max_size,
        }
    }

    /// Seed the corpus unconditionally.
    pub fn seed(&mut self, data: Vec<u8>) {
        self.push(data, 0);
    }

    /// Add an entry if its signature is new
    pub fn add(&mut self, data: Vec<u8>, signature: u64) -> bool {
        if !self.seen.insert(signature) {
            return false;
        }
        self.push(data, signature);
        true
    }

    fn push(&mut self, data: Vec<u8>, signature: u64) {
        self.entries.push_back(CorpusEntry {
            data,
            signature,
            exec_count: 0,
        });
        if self.entries.len() > self.max_size {
            if let Some(old) = self.entries.pop_front() {
                self.seen.remove(&old.signature);
            }
        }
    }

    /// Pick an entry as a mutation base
    pub fn pick(&mut self, seed: u64) -> Option<&[u8]> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = (seed as usize) % self.entries.len();
        let entry = &mut self.entries[idx];
        entry.exec_count += 1;
        Some(entry.data.as_slice())
    }

    /// Get corpus size
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
