//! Fixtures shared by the pipeline and router tests.

use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;

use crate::db::memory::MemoryRecordStore;
use crate::pdf::{CertificateData, CertificateRenderer, RenderError};
use crate::registration::{PhotoUpload, RegistrationForm, RegistrationPipeline};
use crate::storage::LocalAssetStore;

/// Stands in for the genpdf renderer so tests do not depend on installed fonts.
pub struct StubRenderer;

impl CertificateRenderer for StubRenderer {
    fn render(&self, certificate: &CertificateData) -> Result<Vec<u8>, RenderError> {
        Ok(format!("%PDF-stub {}", certificate.record.noc_number).into_bytes())
    }
}

pub struct FailingRenderer;

impl CertificateRenderer for FailingRenderer {
    fn render(&self, _: &CertificateData) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::FontsMissing)
    }
}

pub fn photo_jpeg() -> Vec<u8> {
    let img = RgbImage::from_pixel(24, 32, Rgb([180, 140, 110]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}

pub fn sample_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("fullName", "Jane Doe"),
        ("email", "jane@x.com"),
        ("phone", "555-0100"),
        ("company", "Acme Corp"),
        ("designation", "Engineer"),
        ("purpose", "Site inspection"),
        ("validFrom", "2024-01-01"),
        ("validTo", "2024-06-30"),
        ("idProofType", "aadhar"),
        ("idProofNumber", "1234-5678-9012"),
        ("address", "12 Park Street, Kolkata"),
    ]
}

pub fn sample_form() -> RegistrationForm {
    RegistrationForm {
        fields: sample_fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        photo: Some(PhotoUpload {
            data: photo_jpeg(),
            content_type: "image/jpeg".to_string(),
        }),
    }
}

pub fn test_pipeline() -> (RegistrationPipeline, Arc<MemoryRecordStore>, TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let records = Arc::new(MemoryRecordStore::new());
    let pipeline = RegistrationPipeline::new(
        records.clone(),
        Arc::new(LocalAssetStore::new(tmp.path())),
        Arc::new(StubRenderer),
    );
    (pipeline, records, tmp)
}
