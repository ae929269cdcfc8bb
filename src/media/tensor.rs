// SPDX-License-Identifier: MPL-2.0
//! Conversion between channel-last images and channel-first model tensors.

use crate::application::port::ModelOutput;
use crate::error::{Error, Result};
use ndarray::{Array3, Array4, ArrayViewD, Axis, Ix3, Ix4};

/// Packs an array for the restoration model.
///
/// - `H × W × 3` becomes `1 × 3 × H × W`
/// - `H × W` becomes `1 × 1 × H × W`
///
/// # Errors
///
/// Returns [`Error::Shape`] for any other rank or channel count.
pub fn to_model_tensor(array: ArrayViewD<'_, f32>) -> Result<Array4<f32>> {
    match array.ndim() {
        3 if array.shape()[2] == 3 => {
            let image = array.into_dimensionality::<Ix3>()?;
            Ok(image
                .permuted_axes([2, 0, 1])
                .insert_axis(Axis(0))
                .as_standard_layout()
                .into_owned())
        }
        2 => {
            let (height, width) = (array.shape()[0], array.shape()[1]);
            Ok(array
                .to_owned()
                .into_shape_with_order((1, 1, height, width))?)
        }
        _ => Err(Error::Shape(format!(
            "expected an HxW or HxWx3 array, got shape {:?}",
            array.shape()
        ))),
    }
}

/// Unpacks the restored image from a model output.
///
/// Accepts `1 × 3 × H × W` or `3 × H × W`, returns `H × W × 3`. Samples are
/// clamped to `[0, 1]` and NaN becomes `0`.
///
/// # Errors
///
/// Returns [`Error::Model`] if a tensor handle cannot be extracted and
/// [`Error::Shape`] if the output is not a 3-channel image.
pub fn from_model_tensor(output: ModelOutput) -> Result<Array3<f32>> {
    let array = output.into_array()?;
    let shape = array.shape().to_vec();

    let chw = match shape.as_slice() {
        [1, 3, _, _] => array
            .into_dimensionality::<Ix4>()?
            .index_axis_move(Axis(0), 0),
        [3, _, _] => array.into_dimensionality::<Ix3>()?,
        _ => {
            return Err(Error::Shape(format!(
                "expected model output 1x3xHxW or 3xHxW, got {shape:?}"
            )))
        }
    };

    let mut image = chw.permuted_axes([1, 2, 0]).as_standard_layout().into_owned();
    image.mapv_inplace(|v| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) });
    Ok(image)
}
