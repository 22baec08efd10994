//! Pretrained weight import
//!
//! Loads torchvision ResNet checkpoints (`.pth`) into [`ResNet`]. The only
//! naming difference is the shortcut projection, stored by PyTorch as a
//! `Sequential` (`downsample.0`, `downsample.1`).

use std::path::Path;

use burn::module::Module;
use burn::record::{FullPrecisionSettings, Recorder};
use burn::tensor::backend::Backend;
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use tracing::info;

use crate::model::resnet::{ResNet, ResNetConfig};
use crate::utils::error::{PlantDiseaseError, Result};

/// Load an ImageNet-pretrained ResNet with its original 1000-class head
pub fn load_pretrained<B: Backend>(
    path: &Path,
    config: &ResNetConfig,
    device: &B::Device,
) -> Result<ResNet<B>> {
    if !path.exists() {
        return Err(PlantDiseaseError::PathNotFound(path.to_path_buf()));
    }

    info!("Loading pretrained weights from {:?}", path);

    let load_args = LoadArgs::new(path.to_path_buf())
        .with_key_remap(r"downsample\.0", "downsample.conv")
        .with_key_remap(r"downsample\.1", "downsample.bn");

    let record: <ResNet<B> as Module<B>>::Record =
        PyTorchFileRecorder::<FullPrecisionSettings>::default()
            .load(load_args, device)
            .map_err(|e| {
                PlantDiseaseError::Model(format!(
                    "Failed to load pretrained weights from {:?}: {}",
                    path, e
                ))
            })?;

    let model = config.init::<B>(device).load_record(record);
    info!(
        "Pretrained backbone loaded ({} output classes)",
        model.num_classes()
    );

    Ok(model)
}
