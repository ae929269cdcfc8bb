// SPDX-License-Identifier: MPL-2.0
//! ONNX Runtime adapter implementing the [`RestorationModel`] port.

use std::path::{Path, PathBuf};

use ndarray::{ArrayD, IxDyn};
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};

use crate::application::port::{
    ModelError, ModelInputBundle, ModelOutput, RestorationModel, DCP_FEATURES_SLOT,
    HAZY_IMAGE_SLOT,
};
use crate::config::ModelConfig;

/// Restoration model backed by an ONNX Runtime session.
///
/// The graph must take two `f32` inputs. Inputs named `hazy_image` and
/// `dcp_features` are matched by name; otherwise the first graph input gets
/// the image and the second the transmission map.
///
/// # Example
///
/// ```ignore
/// use hazelift::config::ModelConfig;
/// use hazelift::infrastructure::onnx::OnnxRestorationModel;
///
/// let mut model = OnnxRestorationModel::load(&ModelConfig::default())?;
/// assert!(model.is_ready());
/// ```
pub struct OnnxRestorationModel {
    session: Session,
    path: PathBuf,
    name: String,
    hazy_input: String,
    features_input: String,
}

impl std::fmt::Debug for OnnxRestorationModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxRestorationModel")
            .field("path", &self.path)
            .field("hazy_input", &self.hazy_input)
            .field("features_input", &self.features_input)
            .finish_non_exhaustive()
    }
}

impl OnnxRestorationModel {
    /// Loads the model named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::LoadFailed`] if the file is missing, the session
    /// cannot be built, or the graph has fewer than two inputs.
    pub fn load(config: &ModelConfig) -> Result<Self, ModelError> {
        Self::load_from_path(&config.resolved_path(), config.intra_threads)
    }

    /// Loads a model file directly.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_from_path(path: &Path, intra_threads: Option<usize>) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::LoadFailed(format!(
                "model file not found: {}",
                path.display()
            )));
        }

        let mut builder = Session::builder()
            .map_err(|e| ModelError::LoadFailed(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelError::LoadFailed(e.to_string()))?;
        if let Some(threads) = intra_threads {
            builder = builder
                .with_intra_threads(threads)
                .map_err(|e| ModelError::LoadFailed(e.to_string()))?;
        }
        let session = builder
            .commit_from_file(path)
            .map_err(|e| ModelError::LoadFailed(e.to_string()))?;

        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        let (hazy_input, features_input) = resolve_input_names(&input_names)?;

        let name = path
            .file_stem()
            .map_or_else(|| "onnx".to_string(), |s| s.to_string_lossy().into_owned());

        log::info!(
            "loaded restoration model {} (inputs: {hazy_input}, {features_input})",
            path.display()
        );

        Ok(Self {
            session,
            path: path.to_path_buf(),
            name,
            hazy_input,
            features_input,
        })
    }
}

impl RestorationModel for OnnxRestorationModel {
    fn restore(&mut self, inputs: &ModelInputBundle) -> Result<Vec<ModelOutput>, ModelError> {
        let hazy = ort::value::TensorRef::from_array_view(inputs.hazy_image())
            .map_err(|e| ModelError::InferenceFailed(e.to_string()))?;
        let features = ort::value::TensorRef::from_array_view(inputs.dcp_features())
            .map_err(|e| ModelError::InferenceFailed(e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![
                self.hazy_input.as_str() => hazy,
                self.features_input.as_str() => features
            ])
            .map_err(|e| ModelError::InferenceFailed(e.to_string()))?;

        collect_outputs(&outputs)
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn resolve_input_names(names: &[String]) -> Result<(String, String), ModelError> {
    if names.len() < 2 {
        return Err(ModelError::LoadFailed(format!(
            "expected 2 model inputs, found {}",
            names.len()
        )));
    }
    let by_name = |slot: &str| names.iter().find(|n| n.as_str() == slot).cloned();
    match (by_name(HAZY_IMAGE_SLOT), by_name(DCP_FEATURES_SLOT)) {
        (Some(hazy), Some(features)) => Ok((hazy, features)),
        _ => Ok((names[0].clone(), names[1].clone())),
    }
}

#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn collect_outputs(outputs: &SessionOutputs<'_>) -> Result<Vec<ModelOutput>, ModelError> {
    outputs
        .iter()
        .map(|(name, value)| {
            let (shape, data) = value
                .try_extract_tensor::<f32>()
                .map_err(|e: ort::Error| ModelError::MissingOutput(format!("{name}: {e}")))?;
            let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
            ArrayD::from_shape_vec(IxDyn(&dims), data.to_vec())
                .map(ModelOutput::Array)
                .map_err(|e| ModelError::MissingOutput(format!("{name}: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn named_inputs_are_matched_regardless_of_order() {
        let resolved = resolve_input_names(&names(&["dcp_features", "hazy_image"])).unwrap();
        assert_eq!(
            resolved,
            ("hazy_image".to_string(), "dcp_features".to_string())
        );
    }

    #[test]
    fn unnamed_inputs_fall_back_to_position() {
        let resolved = resolve_input_names(&names(&["input.1", "input.2"])).unwrap();
        assert_eq!(resolved, ("input.1".to_string(), "input.2".to_string()));
    }

    #[test]
    fn single_input_graph_is_rejected() {
        assert!(matches!(
            resolve_input_names(&names(&["lq"])),
            Err(ModelError::LoadFailed(_))
        ));
    }

    #[test]
    fn missing_model_file_fails_to_load() {
        let result =
            OnnxRestorationModel::load_from_path(Path::new("/nonexistent/dehaze.onnx"), None);
        assert!(matches!(result, Err(ModelError::LoadFailed(msg)) if msg.contains("not found")));
    }
}
