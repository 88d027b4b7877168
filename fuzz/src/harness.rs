//! Fuzzing Harness
//!
//! Main fuzzing loop, reporting, and input minimization.

use crate::{Corpus, FuzzResult, FuzzStats, FuzzTarget, FuzzerConfig, Mutator};
use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// Main fuzzer harness
pub struct FuzzHarness {
    /// Configuration
    config: FuzzerConfig,
    /// Fuzz targets
    targets: Vec<Box<dyn FuzzTarget>>,
    /// Mutator
    mutator: Mutator,
    /// Corpus
    corpus: Corpus,
    /// Statistics
    stats: FuzzStats,
    /// Violating inputs found
    violations: Vec<ViolationEntry>,
}

/// An input that broke an engine invariant
#[derive(Debug, Clone)]
pub struct ViolationEntry {
    /// Input that broke the invariant
    pub input: Vec<u8>,
    /// What broke
    pub message: String,
    /// Target name
    pub target: String,
}

impl FuzzHarness {
    /// Create new harness
    pub fn new(config: FuzzerConfig) -> Self {
        Self {
            mutator: Mutator::new(config.seed),
            corpus: Corpus::new(config.max_corpus),
            targets: Vec::new(),
            stats: FuzzStats::default(),
            violations: Vec::new(),
            config,
        }
    }

    /// Add fuzz target
    pub fn add_target(&mut self, target: Box<dyn FuzzTarget>) {
        self.targets.push(target);
    }

    /// Add corpus entry
    pub fn add_corpus(&mut self, data: Vec<u8>) {
        self.corpus.seed(data);
        self.stats.corpus_size = self.corpus.len();
    }

    /// Add dictionary entries
    pub fn add_dictionary(&mut self, entries: Vec<Vec<u8>>) {
        for entry in entries {
            self.mutator.add_dictionary(entry);
        }
    }

    /// Run fuzzing loop
    pub fn run(&mut self, iterations: u64) -> FuzzReport {
        for _ in 0..iterations {
            self.fuzz_iteration();
        }
        log::debug!(
            "[FUZZ] {} iterations, {} violations, corpus {}",
            self.stats.iterations,
            self.stats.violations,
            self.corpus.len()
        );

        FuzzReport {
            stats: self.stats.clone(),
            violations: self.violations.clone(),
        }
    }

    /// Run single fuzzing iteration
    fn fuzz_iteration(&mut self) {
        self.stats.iterations += 1;

        let pick = self.mutator.next_u64();
        let mut input = self.corpus.pick(pick).map(<[u8]>::to_vec).unwrap_or_default();
        self.mutator.mutate(&mut input);
        input.truncate(self.config.max_input_size);

        let mut signatures = Vec::new();
        let mut found = Vec::new();

        for target in &mut self.targets {
            match target.fuzz(&input) {
                FuzzResult::Violation(message) => {
                    found.push((message, String::from(target.name())));
                }
                FuzzResult::Interesting(signature) => signatures.push(signature),
                FuzzResult::Rejected(_) => self.stats.rejected += 1,
                FuzzResult::Ok => {}
            }
            target.reset();
        }

        for (message, target) in found {
            self.record_violation(&input, message, target);
        }
        for signature in signatures {
            if self.corpus.add(input.clone(), signature) {
                self.stats.corpus_size = self.corpus.len();
            }
        }
    }

    fn record_violation(&mut self, input: &[u8], message: String, target: String) {
        self.stats.violations += 1;
        log::warn!("[FUZZ] {}: {}", target, message);

        let known = self
            .violations
            .iter()
            .any(|v| v.message == message && v.target == target);
        if !known {
            self.stats.unique_violations += 1;
            self.violations.push(ViolationEntry {
                input: input.to_vec(),
                message,
                target,
            });
        }
    }

    /// Get current statistics
    pub fn stats(&self) -> &FuzzStats {
        &self.stats
    }

    /// Get found violations
    pub fn violations(&self) -> &[ViolationEntry] {
        &self.violations
    }

    /// Get corpus size
    pub fn corpus_size(&self) -> usize {
        self.corpus.len()
    }
}

/// Fuzzing report
#[derive(Debug, Clone)]
pub struct FuzzReport {
    /// Statistics
    pub stats: FuzzStats,
    /// Violations found
    pub violations: Vec<ViolationEntry>,
}

impl FuzzReport {
    /// Format as text
    pub fn format(&self) -> String {
        let mut output = String::new();

        output.push_str("=== Fuzzing Report ===\n\n");
        output.push_str(&format!("  Iterations: {}\n", self.stats.iterations));
        output.push_str(&format!(
            "  Violations: {} ({} unique)\n",
            self.stats.violations, self.stats.unique_violations
        ));
        output.push_str(&format!("  Rejected: {}\n", self.stats.rejected));
        output.push_str(&format!("  Corpus: {}\n", self.stats.corpus_size));

        if !self.violations.is_empty() {
            output.push_str("\nViolations:\n");
            for v in &self.violations {
                output.push_str(&format!(
                    "  - {} in {} ({} byte input)\n",
                    v.message,
                    v.target,
                    v.input.len()
                ));
            }
        }

        output
    }
}

/// Shrinks an input while it keeps breaking an invariant
pub struct Minimizer<'a> {
    /// Target to reproduce the violation
    target: &'a mut dyn FuzzTarget,
    /// Maximum reproduction attempts
    max_attempts: usize,
    /// Attempts made so far
    attempts: usize,
}

impl<'a> Minimizer<'a> {
    /// Create new minimizer
    pub fn new(target: &'a mut dyn FuzzTarget) -> Self {
        Self {
            target,
            max_attempts: 10000,
            attempts: 0,
        }
    }

    /// Minimize a violating input
    pub fn minimize(&mut self, input: Vec<u8>) -> Vec<u8> {
        let mut current = input;
        let mut improved = true;

        while improved && self.attempts < self.max_attempts {
            improved = false;
            for chunk_size in [32, 16, 8, 4, 2, 1] {
                if let Some(smaller) = self.remove_chunk(&current, chunk_size) {
                    current = smaller;
                    improved = true;
                    break;
                }
            }
        }

        current
    }

    /// First candidate with one chunk removed that still fails.
    fn remove_chunk(&mut self, input: &[u8], chunk_size: usize) -> Option<Vec<u8>> {
        for start in (0..input.len()).step_by(chunk_size) {
            if self.attempts >= self.max_attempts {
                return None;
            }
            let end = (start + chunk_size).min(input.len());
            let mut candidate = Vec::with_capacity(input.len() - (end - start));
            candidate.extend_from_slice(&input[..start]);
            candidate.extend_from_slice(&input[end..]);
            if self.still_fails(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    fn still_fails(&mut self, input: &[u8]) -> bool {
        self.attempts += 1;
        self.target.reset();
        self.target.fuzz(input).is_violation()
    }
}

/// Run a quick fuzz session against one target; returns whether any
/// invariant was broken.
pub fn quick_fuzz<T: FuzzTarget>(mut target: T, corpus: Vec<Vec<u8>>, iterations: u64) -> bool {
    let mut mutator = Mutator::new(42);
    let mut current_corpus = corpus;

    for _ in 0..iterations {
        let mut input = if current_corpus.is_empty() {
            Vec::new()
        } else {
            let idx = mutator.next_u64() as usize % current_corpus.len();
            current_corpus[idx].clone()
        };
        mutator.mutate(&mut input);

        let result = target.fuzz(&input);
        target.reset();
        if result.is_violation() {
            return true;
        }
        if result.is_interesting() && current_corpus.len() < 256 {
            current_corpus.push(input);
        }
    }

    false
}
