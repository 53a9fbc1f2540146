//! Offline braid-word validation.
//!
//! Rules run in a fixed order and the first failure wins:
//!
//! 1. the braid word is non-empty after trimming
//! 2. every whitespace-separated token is `sN` or `sN^-1` (`N` positive, no
//!    leading zero, at most [`MAX_GENERATOR_INDEX`])
//! 3. at least three tokens
//! 4. at least two distinct generators
//! 5. generators `s1..=sM` are all referenced, `M` being the largest index
//!
//! [`analyze_braid_word`] applies rules 1 and 2 only and reports the
//! structural statistics the service derives from the same word.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use qknot_model::{JobSpecification, spec::MAX_SHOTS};
use regex::Regex;
use serde::Serialize;

use crate::error::{ValidationError, generator_list};

static BRAID_TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^s([1-9]\d*)(\^-1)?$")
        .expect("braid token regex should compile")
});

/// Largest accepted generator index. `sN` spans `N + 1` strands and needs
/// one qubit per strand plus an ancilla, which already exceeds current
/// devices at this bound.
pub const MAX_GENERATOR_INDEX: u32 = 127;

const MIN_TOKENS: usize = 3;
const MIN_DISTINCT_GENERATORS: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BraidToken {
    pub generator: u32,
    pub inverse: bool,
}

/// Structural summary of a parsed braid word.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BraidAnalysis {
    pub tokens: Vec<BraidToken>,
    pub token_count: usize,
    /// Keyed by generator name (`s1`, `s2`, ...), ordered by index.
    pub generator_counts: BTreeMap<String, usize>,
    pub inverse_count: usize,
    pub net_writhe: i64,
    pub generator_switches: usize,
    /// Switches per adjacent token pair, rounded to three decimals.
    pub alternation_ratio: f64,
    pub unique_generator_count: usize,
    pub max_generator_index: u32,
    pub strand_count: u32,
    pub missing_generators: Vec<u32>,
    pub is_contiguous: bool,
    pub strand_connectivity: String,
    /// One qubit per strand plus an ancilla.
    pub required_qubits: u32,
}

impl BraidAnalysis {
    pub fn missing_generator_names(&self) -> String {
        generator_list(&self.missing_generators)
    }
}

fn parse_token(token: &str) -> Result<BraidToken, ValidationError> {
    let unsupported = || ValidationError::UnsupportedToken {
        token: token.to_string(),
    };
    let captures = BRAID_TOKEN_PATTERN.captures(token).ok_or_else(unsupported)?;
    let generator = captures
        .get(1)
        .and_then(|index| index.as_str().parse::<u32>().ok())
        .ok_or_else(unsupported)?;
    if generator > MAX_GENERATOR_INDEX {
        return Err(ValidationError::GeneratorOutOfRange {
            token: token.to_string(),
            max: MAX_GENERATOR_INDEX,
        });
    }
    Ok(BraidToken {
        generator,
        inverse: captures.get(2).is_some(),
    })
}

pub fn parse_braid_word(
    braid_word: &str,
) -> Result<Vec<BraidToken>, ValidationError> {
    if braid_word.trim().is_empty() {
        return Err(ValidationError::Empty);
    }
    braid_word.split_whitespace().map(parse_token).collect()
}

pub fn analyze_braid_word(
    braid_word: &str,
) -> Result<BraidAnalysis, ValidationError> {
    let tokens = parse_braid_word(braid_word)?;

    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    let mut inverse_count = 0;
    let mut net_writhe = 0i64;
    let mut generator_switches = 0;
    let mut previous: Option<u32> = None;

    for token in &tokens {
        *counts.entry(token.generator).or_default() += 1;
        if token.inverse {
            inverse_count += 1;
            net_writhe -= 1;
        } else {
            net_writhe += 1;
        }
        if previous.is_some_and(|prev| prev != token.generator) {
            generator_switches += 1;
        }
        previous = Some(token.generator);
    }

    // Non-empty after parse, so there is always a largest key.
    let max_generator_index = counts.keys().next_back().copied().unwrap_or(0);
    let missing_generators: Vec<u32> = (1..=max_generator_index)
        .filter(|index| !counts.contains_key(index))
        .collect();
    let token_count = tokens.len();
    let unique_generator_count = counts.len();
    let strand_count = max_generator_index.saturating_add(1);
    let is_contiguous = missing_generators.is_empty();
    let raw_ratio =
        generator_switches as f64 / token_count.saturating_sub(1).max(1) as f64;
    let alternation_ratio = (raw_ratio * 1000.0).round() / 1000.0;
    let strand_connectivity =
        if unique_generator_count >= MIN_DISTINCT_GENERATORS && is_contiguous {
            format!("connected-{strand_count}-strand")
        } else {
            format!("partial-{strand_count}-strand")
        };

    Ok(BraidAnalysis {
        tokens,
        token_count,
        generator_counts: counts
            .into_iter()
            .map(|(index, count)| (format!("s{index}"), count))
            .collect(),
        inverse_count,
        net_writhe,
        generator_switches,
        alternation_ratio,
        unique_generator_count,
        max_generator_index,
        strand_count,
        missing_generators,
        is_contiguous,
        strand_connectivity,
        required_qubits: strand_count.saturating_add(1),
    })
}

/// Full braid-word check. `Ok` carries the analysis of the accepted word.
pub fn validate_braid_word(
    braid_word: &str,
) -> Result<BraidAnalysis, ValidationError> {
    let analysis = analyze_braid_word(braid_word)?;

    if analysis.token_count < MIN_TOKENS {
        return Err(ValidationError::TooFewTokens {
            count: analysis.token_count,
        });
    }
    if analysis.unique_generator_count < MIN_DISTINCT_GENERATORS {
        return Err(ValidationError::TooFewGenerators);
    }
    if !analysis.is_contiguous {
        return Err(ValidationError::NonContiguous {
            max: analysis.max_generator_index,
            missing: analysis.missing_generators,
        });
    }

    Ok(analysis)
}

/// Braid rules first, then the remaining submit inputs.
pub fn validate_job_specification(
    spec: &JobSpecification,
) -> Result<BraidAnalysis, ValidationError> {
    let analysis = validate_braid_word(&spec.braid_word)?;
    if spec.backend_name.trim().is_empty() {
        return Err(ValidationError::EmptyBackend);
    }
    if spec.shots == 0 || spec.shots > MAX_SHOTS {
        return Err(ValidationError::ShotsOutOfRange { shots: spec.shots });
    }
    Ok(analysis)
}
