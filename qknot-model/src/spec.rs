use std::{fmt, str::FromStr};

use crate::error::{ModelError, Result};
use crate::runtime::RuntimeSelection;

/// Upper bound on shots accepted for a single job.
pub const MAX_SHOTS: u32 = 100_000;

/// Transpiler optimization level (0 through 3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "u8", into = "u8")
)]
pub struct OptimizationLevel(u8);

impl OptimizationLevel {
    pub const MAX: u8 = 3;

    pub fn new(level: u8) -> Result<Self> {
        if level > Self::MAX {
            return Err(ModelError::InvalidOptimizationLevel(level));
        }
        Ok(Self(level))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for OptimizationLevel {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

impl TryFrom<u8> for OptimizationLevel {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<OptimizationLevel> for u8 {
    fn from(value: OptimizationLevel) -> Self {
        value.0
    }
}

impl fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the braid is closed into a knot before measurement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum ClosureMethod {
    #[default]
    Trace,
    Plat,
}

impl ClosureMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClosureMethod::Trace => "trace",
            ClosureMethod::Plat => "plat",
        }
    }
}

impl FromStr for ClosureMethod {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(ClosureMethod::Trace),
            "plat" => Ok(ClosureMethod::Plat),
            _ => Err(ModelError::InvalidClosureMethod(raw.to_string())),
        }
    }
}

impl fmt::Display for ClosureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable input to a submission.
///
/// String fields are trimmed on construction so the controller, the
/// validator and the wire request all see the same text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobSpecification {
    /// Target device identifier, or `least_busy` to let the service choose.
    pub backend_name: String,
    /// Braid word, e.g. `s1 s2^-1 s1`.
    pub braid_word: String,
    pub shots: u32,
    pub optimization_level: OptimizationLevel,
    pub closure_method: ClosureMethod,
    pub runtime: RuntimeSelection,
}

impl JobSpecification {
    pub fn new(
        backend_name: impl AsRef<str>,
        braid_word: impl AsRef<str>,
        shots: u32,
    ) -> Self {
        Self {
            backend_name: backend_name.as_ref().trim().to_string(),
            braid_word: braid_word.as_ref().trim().to_string(),
            shots,
            optimization_level: OptimizationLevel::default(),
            closure_method: ClosureMethod::default(),
            runtime: RuntimeSelection::default(),
        }
    }

    pub fn with_optimization_level(mut self, level: OptimizationLevel) -> Self {
        self.optimization_level = level;
        self
    }

    pub fn with_closure_method(mut self, method: ClosureMethod) -> Self {
        self.closure_method = method;
        self
    }

    pub fn with_runtime(mut self, runtime: RuntimeSelection) -> Self {
        self.runtime = runtime;
        self
    }
}
