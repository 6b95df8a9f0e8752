//! ONNX model inference using tract
//!
//! Loads the pre-trained classifier artifact and runs single-row inference.

use super::Classifier;
use crate::models::TraderClass;
use anyhow::{Context, Result};
use std::path::Path;
use tract_onnx::prelude::*;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Classifier backed by an ONNX artifact, loaded once at startup.
///
/// The artifact is exported with the class probabilities as its final
/// output, shape [1, 2] with class 0 = bad and class 1 = good. The
/// predicted class is the probability argmax, matching the decision rule
/// the model was trained with.
pub struct OnnxClassifier {
    model: TractModel,
    num_features: usize,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("num_features", &self.num_features)
            .finish_non_exhaustive()
    }
}

impl OnnxClassifier {
    /// Load and optimize the model artifact from disk
    pub fn from_file(path: impl AsRef<Path>, num_features: usize) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read model artifact at {}", path.display()))?;
        Self::from_bytes(&bytes, num_features)
    }

    /// Load and optimize a model from raw ONNX bytes
    pub fn from_bytes(model_bytes: &[u8], num_features: usize) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, num_features]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(Self {
            model,
            num_features,
        })
    }

    fn run_probabilities(&self, features: &[f64]) -> Result<[f64; 2]> {
        if features.len() != self.num_features {
            anyhow::bail!(
                "Feature vector has {} values, model expects {}",
                features.len(),
                self.num_features
            );
        }

        let data: Vec<f32> = features.iter().map(|v| *v as f32).collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, self.num_features), data)
            .context("Failed to shape input tensor")?
            .into();

        let result = self.model.run(tvec!(input.into()))?;
        let output = result.last().context("No output from model")?;
        let view = output.to_array_view::<f32>()?;
        let values: Vec<f32> = view.iter().copied().collect();

        if values.len() < 2 {
            anyhow::bail!(
                "Model output has {} values, expected 2 class probabilities",
                values.len()
            );
        }

        Ok([values[0] as f64, values[1] as f64])
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &[f64]) -> Result<TraderClass> {
        let [p_bad, p_good] = self.run_probabilities(features)?;
        Ok(if p_good > p_bad {
            TraderClass::Good
        } else {
            TraderClass::Bad
        })
    }

    fn predict_probability(&self, features: &[f64]) -> Result<[f64; 2]> {
        self.run_probabilities(features)
    }
}
