use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub const CORE_WEIGHTS: usize = 17;
// Core vector plus the short-term weights w17 and w18
pub const EXTENDED_WEIGHTS: usize = 19;

pub const DEFAULT_DECAY: f64 = -0.5;
pub const DEFAULT_RETENTION: f64 = 0.9;

pub const DEFAULT_WEIGHTS: [f64; EXTENDED_WEIGHTS] = [
    0.40255, 1.18385, 3.173, 15.69105, 7.1949, 0.5345, 1.4604, 0.0046, 1.54575, 0.1192, 1.01925,
    1.9395, 0.11, 0.29605, 2.2698, 0.2315, 2.9898, 0.51655, 0.6621,
];

/// Fixed scheduling configuration, shared read-only by every scheduling call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ParameterFile", into = "ParameterFile")]
pub struct Parameters {
    weights: [f64; EXTENDED_WEIGHTS],
    decay: f64,
    request_retention: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParameterFile {
    weights: Vec<f64>,
    #[serde(default)]
    decay: Option<f64>,
    #[serde(default)]
    request_retention: Option<f64>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            decay: DEFAULT_DECAY,
            request_retention: DEFAULT_RETENTION,
        }
    }
}

impl Parameters {
    // 17 weights keep the default w17/w18
    pub fn from_weights(weights: &[f64]) -> Result<Self> {
        let mut full = DEFAULT_WEIGHTS;
        match weights.len() {
            CORE_WEIGHTS | EXTENDED_WEIGHTS => full[..weights.len()].copy_from_slice(weights),
            n => {
                return Err(EngineError::InvalidParameters(format!(
                    "expected {CORE_WEIGHTS} or {EXTENDED_WEIGHTS} weights, got {n}"
                )));
            }
        }
        if let Some(i) = full.iter().position(|w| !w.is_finite()) {
            return Err(EngineError::InvalidParameters(format!(
                "weight w{i} is not a finite number"
            )));
        }
        Ok(Self {
            weights: full,
            ..Self::default()
        })
    }

    pub fn with_decay(mut self, decay: f64) -> Result<Self> {
        if !(decay.is_finite() && decay < 0.0) {
            return Err(EngineError::InvalidParameters(format!(
                "decay must be a negative number, got {decay}"
            )));
        }
        self.decay = decay;
        Ok(self)
    }

    pub fn with_request_retention(mut self, retention: f64) -> Result<Self> {
        if !(retention > 0.0 && retention < 1.0) {
            return Err(EngineError::InvalidParameters(format!(
                "request retention must lie strictly between 0 and 1, got {retention}"
            )));
        }
        self.request_retention = retention;
        Ok(self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let params: Parameters = serde_json::from_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            decay = params.decay,
            request_retention = params.request_retention,
            "loaded scheduling parameters"
        );
        Ok(params)
    }

    pub fn w(&self, i: usize) -> f64 {
        self.weights[i]
    }

    pub fn weights(&self) -> &[f64; EXTENDED_WEIGHTS] {
        &self.weights
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    // Retrievability is 0.9 when elapsed time equals stability
    pub fn factor(&self) -> f64 {
        0.9f64.powf(1.0 / self.decay) - 1.0
    }

    pub fn request_retention(&self) -> f64 {
        self.request_retention
    }
}

impl TryFrom<ParameterFile> for Parameters {
    type Error = EngineError;

    fn try_from(file: ParameterFile) -> Result<Self> {
        let mut params = Parameters::from_weights(&file.weights)?;
        if let Some(decay) = file.decay {
            params = params.with_decay(decay)?;
        }
        if let Some(retention) = file.request_retention {
            params = params.with_request_retention(retention)?;
        }
        Ok(params)
    }
}

impl From<Parameters> for ParameterFile {
    fn from(params: Parameters) -> Self {
        Self {
            weights: params.weights.to_vec(),
            decay: Some(params.decay),
            request_retention: Some(params.request_retention),
        }
    }
}
