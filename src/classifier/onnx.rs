use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use ndarray::{Array2, Array3};
use ort::session::Session;
use ort::value::{Tensor, ValueType};

use super::{Classifier, InputShape};
use crate::error::{Error, Result};
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Adapter around an externally trained ONNX network.
///
/// The session's declared inputs fix the input shape and slot count; every
/// named input receives the same assembled document tensor. Training
/// happens outside this crate, so `fit` is rejected.
pub struct OnnxClassifier {
    model_path: PathBuf,
    session: Session,
    input_names: Vec<String>,
    shape: InputShape,
    output_width: usize,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("model_path", &self.model_path)
            .field("input_names", &self.input_names)
            .field("shape", &self.shape)
            .field("output_width", &self.output_width)
            .finish()
    }
}

fn tensor_dimensions(value_type: &ValueType) -> Result<&[i64]> {
    match value_type {
        ValueType::Tensor { dimensions, .. } => Ok(dimensions),
        other => Err(Error::Model(format!(
            "expected a tensor input/output, found {other:?}"
        ))),
    }
}

fn fixed_dim(dimensions: &[i64], index: usize, what: &str) -> Result<usize> {
    let dim = *dimensions.get(index).ok_or_else(|| {
        Error::Model(format!("model {what} declares only {} dims", dimensions.len()))
    })?;
    usize::try_from(dim)
        .map_err(|_| Error::Model(format!("model {what} dim {index} is dynamic")))
}

impl OnnxClassifier {
    pub fn load(model_path: &Path) -> Result<Self> {
        Self::load_with_config(model_path, &RuntimeConfig::default())
    }

    pub fn load_with_config(model_path: &Path, config: &RuntimeConfig) -> Result<Self> {
        if !model_path.exists() {
            return Err(Error::NotFound(format!(
                "classifier file '{}'",
                model_path.display()
            )));
        }
        let session = create_session_builder(config)?.commit_from_file(model_path)?;

        let inputs = &session.inputs;
        if inputs.is_empty() {
            return Err(Error::Model("model declares no inputs".into()));
        }
        // Each input head expects the same (batch, length, embedding) view.
        let dimensions = tensor_dimensions(&inputs[0].input_type)?;
        let shape = InputShape::new(
            fixed_dim(dimensions, 1, "input")?,
            fixed_dim(dimensions, 2, "input")?,
        );

        let outputs = &session.outputs;
        if outputs.is_empty() {
            return Err(Error::Model("model declares no outputs".into()));
        }
        let output_dims = tensor_dimensions(&outputs[0].output_type)?;
        let output_width = fixed_dim(output_dims, 1, "output")?;

        let input_names: Vec<String> = inputs.iter().map(|i| i.name.clone()).collect();
        info!(
            "loaded onnx classifier from {}: {} input slot(s), shape ({}, {}), {} outputs",
            model_path.display(),
            input_names.len(),
            shape.sample_length,
            shape.embedding_size,
            output_width
        );

        Ok(Self {
            model_path: model_path.to_path_buf(),
            session,
            input_names,
            shape,
            output_width,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn input_shape(&self) -> InputShape {
        self.shape
    }

    fn input_slots(&self) -> usize {
        self.input_names.len()
    }

    fn output_width(&self) -> usize {
        self.output_width
    }

    fn predict(&self, input: &Array3<f32>) -> Result<Array2<f32>> {
        let input_dyn = input.clone().into_dyn();
        let view = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        for name in &self.input_names {
            input_tensors.insert(
                name.as_str(),
                Tensor::from_array(&view)
                    .map_err(|e| Error::Model(format!("failed to create input tensor: {e}")))?,
            );
        }

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| Error::Model(format!("failed to run model: {e}")))?;
        let scores = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Model(format!("failed to extract output tensor: {e}")))?;

        scores
            .to_owned()
            .into_dimensionality::<ndarray::Ix2>()
            .map_err(|e| Error::Model(format!("unexpected output rank: {e}")))
    }

    fn fit(&mut self, _input: &Array3<f32>, _targets: &Array2<f32>) -> Result<()> {
        Err(Error::InvalidArgument(
            "onnx sessions are inference-only; train externally and reload the model file".into(),
        ))
    }

    fn save_weights(&self, path: &Path) -> Result<()> {
        fs::copy(&self.model_path, path)?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}
