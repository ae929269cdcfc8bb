// SPDX-License-Identifier: MPL-2.0
//! Shared restoration model doubles for integration tests.
#![allow(dead_code)]

use hazelift::application::port::{ModelError, ModelInputBundle, ModelOutput, RestorationModel};
use ndarray::{ArrayD, Axis, IxDyn};

/// Returns the hazy image as the restored image.
#[derive(Debug, Default)]
pub struct EchoModel {
    pub calls: usize,
}

impl RestorationModel for EchoModel {
    fn restore(&mut self, inputs: &ModelInputBundle) -> Result<Vec<ModelOutput>, ModelError> {
        self.calls += 1;
        Ok(vec![inputs.hazy_image().clone().into_dyn().into()])
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Applies the scattering model inverse `J = (I − A) / t + A` with `A = 1`,
/// emitting an extra auxiliary output after the restored image.
#[derive(Debug, Default)]
pub struct InverseScatterModel;

impl RestorationModel for InverseScatterModel {
    fn restore(&mut self, inputs: &ModelInputBundle) -> Result<Vec<ModelOutput>, ModelError> {
        let hazy = inputs.hazy_image();
        let transmission = inputs.dcp_features().index_axis(Axis(1), 0);
        let mut restored = hazy.clone();
        for mut channel in restored.axis_iter_mut(Axis(1)) {
            let mut channel = channel.index_axis_mut(Axis(0), 0);
            channel.zip_mut_with(&transmission.index_axis(Axis(0), 0), |v, &t| {
                *v = (*v - 1.0) / t.max(0.1) + 1.0;
            });
        }
        let (h, w) = inputs.spatial_dims();
        let aux = ArrayD::<f32>::zeros(IxDyn(&[1, 1, h, w]));
        Ok(vec![restored.into_dyn().into(), aux.into()])
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "inverse-scatter"
    }
}

/// A model that always fails at inference time.
#[derive(Debug, Default)]
pub struct BrokenModel;

impl RestorationModel for BrokenModel {
    fn restore(&mut self, _inputs: &ModelInputBundle) -> Result<Vec<ModelOutput>, ModelError> {
        Err(ModelError::InferenceFailed("device lost".to_string()))
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "broken"
    }
}
