//! Blending a prompt embedding with a seed-book embedding.
//!
//! Both inputs are scaled to unit length before the weighted sum, so a weight means a share
//! of direction rather than a share of raw magnitude: equal weights land on the angular
//! midpoint even when one model emits much longer vectors than the other. The fused vector
//! is left unnormalized; cosine distance ignores its length.

use serde::{Deserialize, Serialize};

use crate::core::error::{FolioError, Result};
use crate::{l2_norm, l2_normalize};

/// Fused vectors shorter than this carry no usable direction.
const MIN_FUSED_NORM: f32 = 1e-4;


#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWeights")]
pub struct FusionWeights {
    w_text: f32,
    w_seed: f32,
}

#[derive(Deserialize)]
struct RawWeights {
    w_text: f32,
    w_seed: f32,
}

impl TryFrom<RawWeights> for FusionWeights {
    type Error = FolioError;

    fn try_from(raw: RawWeights) -> Result<Self> {
        Self::new(raw.w_text, raw.w_seed)
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self { w_text: 0.5, w_seed: 0.5 }
    }
}

impl FusionWeights {
    /// Accepts any non-negative pair and rescales it to sum to one.
    pub fn new(w_text: f32, w_seed: f32) -> Result<Self> {
        if !w_text.is_finite() || !w_seed.is_finite() || w_text < 0.0 || w_seed < 0.0 {
            return Err(FolioError::invalid_query(format!(
                "fusion weights must be non-negative numbers (text={w_text}, seed={w_seed})"
            )));
        }
        let total = w_text + w_seed;
        if total <= 0.0 {
            return Err(FolioError::invalid_query("fusion weights cannot both be zero"));
        }
        Ok(Self {
            w_text: w_text / total,
            w_seed: w_seed / total,
        })
    }

    pub fn w_text(&self) -> f32 {
        self.w_text
    }

    pub fn w_seed(&self) -> f32 {
        self.w_seed
    }

    #[must_use]
    pub fn swapped(&self) -> Self {
        Self {
            w_text: self.w_seed,
            w_seed: self.w_text,
        }
    }
}


fn unit(v: &[f32], label: &str) -> Result<Vec<f32>> {
    let mut out = v.to_vec();
    if !l2_normalize(&mut out) {
        return Err(FolioError::invalid_query(format!(
            "{label} embedding has zero magnitude and cannot be fused"
        )));
    }
    Ok(out)
}

/// `w_text * unit(v_text) + w_seed * unit(v_seed)`. Inputs that cancel out (opposite
/// directions under balancing weights) are rejected.
pub fn fuse(v_text: &[f32], v_seed: &[f32], weights: FusionWeights) -> Result<Vec<f32>> {
    if v_text.len() != v_seed.len() {
        return Err(FolioError::DimensionMismatch {
            expected: v_seed.len(),
            got: v_text.len(),
        });
    }

    let u_text = unit(v_text, "text")?;
    let u_seed = unit(v_seed, "seed")?;

    let fused: Vec<f32> = u_text
        .iter()
        .zip(u_seed.iter())
        .map(|(t, s)| weights.w_text * t + weights.w_seed * s)
        .collect();

    if l2_norm(&fused) < MIN_FUSED_NORM {
        return Err(FolioError::invalid_query(
            "prompt and seed book point in opposite directions; adjust the weights or use one input",
        ));
    }
    Ok(fused)
}
