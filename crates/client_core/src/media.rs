use std::path::Path;

use anyhow::{Context, Result};
use mime_guess::mime;

use crate::error::ValidationError;

const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Image content picked by the operator, held in memory until sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read image {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name", path.display()))?;
        Ok(Self { filename, bytes })
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }

    pub fn mime_type(&self) -> mime::Mime {
        mime_guess::from_path(&self.filename).first_or_octet_stream()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bytes.is_empty() {
            return Err(ValidationError::EmptyImage {
                filename: self.filename.clone(),
            });
        }
        let supported = self
            .extension()
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()));
        if !supported || self.mime_type().type_() != mime::IMAGE {
            return Err(ValidationError::UnsupportedImage {
                filename: self.filename.clone(),
            });
        }
        Ok(())
    }
}

/// A labeled batch of images staged for upload into the training dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSelection {
    pub class_label: String,
    pub images: Vec<ImageFile>,
}

impl DatasetSelection {
    pub fn new(class_label: impl Into<String>, images: Vec<ImageFile>) -> Self {
        Self {
            class_label: class_label.into(),
            images,
        }
    }

    /// Returns the trimmed label once the whole selection is acceptable.
    pub fn validate(&self) -> Result<&str, ValidationError> {
        let label = self.class_label.trim();
        if label.is_empty() {
            return Err(ValidationError::EmptyClassLabel);
        }
        if self.images.is_empty() {
            return Err(ValidationError::NoImages);
        }
        for image in &self.images {
            image.validate()?;
        }
        Ok(label)
    }
}
