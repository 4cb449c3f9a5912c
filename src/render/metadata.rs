//! Descriptive metadata extraction.

use serde::{Deserialize, Serialize};

use crate::format::dicom::{Dataset, DicomTag};

use super::window::WindowLevel;

/// Window applied when the dataset carries no usable Window Width/Center.
pub const DEFAULT_WINDOW: WindowLevel = WindowLevel {
    width: 256.0,
    center: 127.0,
};

/// Descriptive fields returned alongside every rendered image.
///
/// Each field is defaulted on its own: a missing tag never affects the
/// others, and extraction never fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    #[serde(rename = "PatientName")]
    pub patient_name: String,
    #[serde(rename = "PatientID")]
    pub patient_id: String,
    #[serde(rename = "StudyDate")]
    pub study_date: String,
    #[serde(rename = "Modality")]
    pub modality: String,
    #[serde(rename = "SeriesDescription")]
    pub series_description: String,
    #[serde(rename = "WindowWidth")]
    pub window_width: f64,
    #[serde(rename = "WindowCenter")]
    pub window_center: f64,
}

impl ImageMetadata {
    /// The window stored in the dataset, after defaulting.
    pub fn window(&self) -> WindowLevel {
        WindowLevel {
            width: self.window_width,
            center: self.window_center,
        }
    }
}

impl Default for ImageMetadata {
    fn default() -> Self {
        Self {
            patient_name: String::new(),
            patient_id: String::new(),
            study_date: String::new(),
            modality: String::new(),
            series_description: String::new(),
            window_width: DEFAULT_WINDOW.width,
            window_center: DEFAULT_WINDOW.center,
        }
    }
}

/// Read descriptive metadata from a dataset.
pub fn extract(dataset: &Dataset) -> ImageMetadata {
    let text = |tag| dataset.string(tag).unwrap_or_default();

    ImageMetadata {
        patient_name: text(DicomTag::PatientName),
        patient_id: text(DicomTag::PatientId),
        study_date: text(DicomTag::StudyDate),
        modality: text(DicomTag::Modality),
        series_description: text(DicomTag::SeriesDescription),
        window_width: dataset
            .decimal(DicomTag::WindowWidth)
            .unwrap_or(DEFAULT_WINDOW.width),
        window_center: dataset
            .decimal(DicomTag::WindowCenter)
            .unwrap_or(DEFAULT_WINDOW.center),
    }
}
