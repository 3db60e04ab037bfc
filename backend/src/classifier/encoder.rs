//! Barangay label encoder

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{read_json, write_json, ArtifactError};

/// Maps barangay names to dense integer codes.
///
/// Codes are positions in the sorted list of distinct names seen at fit
/// time, so a given training set always produces the same mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit on the names present in the training data
    pub fn fit<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = names.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Code for `name`, or `None` if it was not seen at fit time
    pub fn transform(&self, name: &str) -> Option<u32> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(name))
            .ok()
            .map(|idx| idx as u32)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        write_json(path, self)
    }

    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let encoder: LabelEncoder = read_json(path)?;
        if encoder.classes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ArtifactError::Invalid {
                path: path.display().to_string(),
                reason: "encoder classes must be sorted and unique".to_string(),
            });
        }
        Ok(encoder)
    }
}
