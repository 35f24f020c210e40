use super::{Frame, InferenceModel, InferenceOutput, ModelLoader};
use crate::error::{MulticamError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads model weight artifacts from disk.
///
/// The artifact is read and checked for content and the model validates
/// its input shape. No inference runtime is linked into the supervisor;
/// detection itself happens inside the per-camera pipelines.
#[derive(Debug, Clone)]
pub struct ArtifactModelLoader {
    input_shape: (u32, u32, u32),
}

impl ArtifactModelLoader {
    pub fn new(input_shape: (u32, u32, u32)) -> Self {
        Self { input_shape }
    }
}

#[async_trait]
impl ModelLoader for ArtifactModelLoader {
    async fn load(&self, path: &Path) -> Result<Box<dyn InferenceModel>> {
        let weights = tokio::fs::read(path).await.map_err(|e| {
            MulticamError::unavailable("model", format!("{}: {}", path.display(), e))
        })?;

        if weights.is_empty() {
            return Err(MulticamError::Inference(format!(
                "model artifact {} is empty",
                path.display()
            )));
        }

        debug!("Loaded {} bytes of weights from {}", weights.len(), path.display());

        Ok(Box::new(ArtifactModel {
            path: path.to_path_buf(),
            input_shape: self.input_shape,
            weight_bytes: weights.len(),
        }))
    }
}

struct ArtifactModel {
    path: PathBuf,
    input_shape: (u32, u32, u32),
    weight_bytes: usize,
}

impl InferenceModel for ArtifactModel {
    fn infer(&mut self, frame: &Frame) -> Result<InferenceOutput> {
        if frame.shape() != self.input_shape {
            return Err(MulticamError::Inference(format!(
                "{} expects input {:?}, got {:?}",
                self.path.display(),
                self.input_shape,
                frame.shape()
            )));
        }

        let expected = self.input_shape.0 as usize
            * self.input_shape.1 as usize
            * self.input_shape.2 as usize;
        if frame.data.len() != expected {
            return Err(MulticamError::Inference(format!(
                "frame buffer holds {} bytes, expected {}",
                frame.data.len(),
                expected
            )));
        }

        debug!(
            "Inference pass over {:?} frame with {} byte model",
            frame.shape(),
            self.weight_bytes
        );
        Ok(InferenceOutput::default())
    }
}
