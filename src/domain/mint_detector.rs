//! Mint Detector
//!
//! Recognizes mint-initialization operations in a resolved feed entry.

use serde::Deserialize;

use crate::ports::Operation;

use super::known_programs::{CREATE_TOKEN_INSTRUCTION, MINT_INIT_INSTRUCTIONS, TOKEN_PROGRAMS};

/// Program + instruction type pair that creates a mint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MintPattern {
    /// Program id or parsed program name; `None` matches any program
    #[serde(default)]
    pub program: Option<String>,
    /// Parsed instruction type
    pub kind: String,
}

impl MintPattern {
    pub fn new(program: Option<&str>, kind: &str) -> Self {
        Self {
            program: program.map(str::to_string),
            kind: kind.to_string(),
        }
    }

    pub fn matches(&self, op: &Operation) -> bool {
        if op.kind.as_deref() != Some(self.kind.as_str()) {
            return false;
        }
        match &self.program {
            None => true,
            Some(p) => op.program_id == *p || op.program.as_deref() == Some(p.as_str()),
        }
    }
}

/// Result of scanning one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintMatch {
    /// Operation creates `mint`
    Mint(String),
    /// Operation matched a pattern but carried no readable mint
    MissingMint { kind: String },
}

#[derive(Debug, Clone)]
pub struct MintDetector {
    patterns: Vec<MintPattern>,
}

impl Default for MintDetector {
    fn default() -> Self {
        Self::new(Self::default_patterns())
    }
}

impl MintDetector {
    pub fn new(patterns: Vec<MintPattern>) -> Self {
        Self { patterns }
    }

    /// Built-in patterns plus `extra`, without duplicates
    pub fn with_extra(extra: &[MintPattern]) -> Self {
        let mut patterns = Self::default_patterns();
        for pattern in extra {
            if !patterns.contains(pattern) {
                patterns.push(pattern.clone());
            }
        }
        Self::new(patterns)
    }

    pub fn default_patterns() -> Vec<MintPattern> {
        let mut patterns: Vec<MintPattern> = TOKEN_PROGRAMS
            .iter()
            .flat_map(|program| {
                MINT_INIT_INSTRUCTIONS
                    .iter()
                    .map(move |kind| MintPattern::new(Some(*program), kind))
            })
            .collect();
        patterns.push(MintPattern::new(None, CREATE_TOKEN_INSTRUCTION));
        patterns
    }

    pub fn patterns(&self) -> &[MintPattern] {
        &self.patterns
    }

    /// Check one operation against every pattern
    pub fn detect(&self, op: &Operation) -> Option<MintMatch> {
        let pattern = self.patterns.iter().find(|p| p.matches(op))?;
        match op.info_str("mint") {
            Some(mint) if !mint.is_empty() => Some(MintMatch::Mint(mint.to_string())),
            _ => Some(MintMatch::MissingMint {
                kind: pattern.kind.clone(),
            }),
        }
    }

    /// Every match in an entry's operations, in order, mints deduplicated
    pub fn scan(&self, operations: &[Operation]) -> Vec<MintMatch> {
        let mut out: Vec<MintMatch> = Vec::new();
        for m in operations.iter().filter_map(|op| self.detect(op)) {
            if matches!(m, MintMatch::Mint(_)) && out.contains(&m) {
                continue;
            }
            out.push(m);
        }
        out
    }
}
