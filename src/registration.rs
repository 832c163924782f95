use chrono::{DateTime, NaiveDate};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::db::{Applicant, DbError, NewNoc, NocRecord, NocUpdate, RecordStore};
use crate::error::AppError;
use crate::identifier::generate_noc_number;
use crate::pdf::{CertificateData, CertificateRenderer, RenderError};
use crate::qr::{self, QrError};
use crate::storage::{AssetCategory, AssetStore, StorageError};

pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

const REQUIRED_FIELDS: [&str; 11] = [
    "fullName",
    "email",
    "phone",
    "company",
    "designation",
    "purpose",
    "validFrom",
    "validTo",
    "idProofType",
    "idProofNumber",
    "address",
];

#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Raw registration form, as collected from the multipart body.
#[derive(Debug, Default)]
pub struct RegistrationForm {
    pub fields: HashMap<String, String>,
    pub photo: Option<PhotoUpload>,
}

/// A registration that passed validation. Nothing has been persisted yet.
#[derive(Debug, Clone)]
pub struct Application {
    pub applicant: Applicant,
    pub photo: PhotoUpload,
}

impl Application {
    pub fn validate(mut form: RegistrationForm) -> Result<Self, AppError> {
        let photo = form
            .photo
            .take()
            .filter(|p| !p.data.is_empty())
            .ok_or_else(|| AppError::BadRequest("Photo is required".to_string()))?;
        if !photo.content_type.starts_with("image/") {
            return Err(AppError::BadRequest("Only image files are allowed!".to_string()));
        }
        if photo.data.len() > MAX_PHOTO_BYTES {
            return Err(AppError::BadRequest("File upload error: File too large".to_string()));
        }

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|name| form.fields.get(*name).map_or(true, |v| v.trim().is_empty()))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        // Text is stored exactly as submitted; only dates are normalized.
        let mut take = |name: &str| form.fields.remove(name).unwrap_or_default();
        let valid_from = parse_date("validFrom", take("validFrom").trim())?;
        let valid_to = parse_date("validTo", take("validTo").trim())?;

        Ok(Self {
            applicant: Applicant {
                full_name: take("fullName"),
                email: take("email"),
                phone: take("phone"),
                company: take("company"),
                designation: take("designation"),
                purpose: take("purpose"),
                valid_from,
                valid_to,
                id_proof_type: take("idProofType"),
                id_proof_number: take("idProofNumber"),
                address: take("address"),
            },
            photo,
        })
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp. Either way only the
/// calendar date is kept, and the listing reports it as `YYYY-MM-DD`.
fn parse_date(field: &str, value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| {
            AppError::BadRequest(format!(
                "Invalid date for {}: {} (expected YYYY-MM-DD or an RFC 3339 timestamp)",
                field, value
            ))
        })
}

/// Pipeline progress. Each variant is reached only after the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    IdentifierAssigned,
    PhotoStored,
    QrGenerated,
    QrStored,
    RecordCreated,
    CertificateRendered,
    CertificateStored,
    RecordFinalized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::IdentifierAssigned => "identifier-assigned",
            Stage::PhotoStored => "photo-stored",
            Stage::QrGenerated => "qr-generated",
            Stage::QrStored => "qr-stored",
            Stage::RecordCreated => "record-created",
            Stage::CertificateRendered => "certificate-rendered",
            Stage::CertificateStored => "certificate-stored",
            Stage::RecordFinalized => "record-finalized",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Qr(#[from] QrError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("render task failed: {0}")]
    RenderTask(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Db(#[from] DbError),
}

/// A registration that stopped before `stage`. Whatever was persisted earlier stays in place.
#[derive(Debug, Error)]
#[error("registration {noc_number} failed before {stage}: {source}")]
pub struct PipelineError {
    pub noc_number: String,
    pub stage: Stage,
    #[source]
    pub source: StageError,
}

fn failed<'a, E: Into<StageError>>(
    noc_number: &'a str,
    stage: Stage,
) -> impl FnOnce(E) -> PipelineError + 'a {
    move |err| PipelineError {
        noc_number: noc_number.to_string(),
        stage,
        source: err.into(),
    }
}

fn reached(noc_number: &str, stage: Stage) {
    tracing::debug!(noc_number, %stage, "registration advanced");
}

/// An application with its certificate number assigned.
#[derive(Debug, Clone)]
pub struct Registration {
    pub noc_number: String,
    /// Scheme and host the QR code should point back to.
    pub verify_base: String,
    pub application: Application,
}

#[derive(Clone)]
pub struct RegistrationPipeline {
    records: Arc<dyn RecordStore>,
    assets: Arc<dyn AssetStore>,
    renderer: Arc<dyn CertificateRenderer>,
}

impl RegistrationPipeline {
    pub fn new(
        records: Arc<dyn RecordStore>,
        assets: Arc<dyn AssetStore>,
        renderer: Arc<dyn CertificateRenderer>,
    ) -> Self {
        Self {
            records,
            assets,
            renderer,
        }
    }

    pub fn assign(&self, application: Application, verify_base: String) -> Registration {
        tracing::debug!(stage = %Stage::Received, "registration received");
        let noc_number = generate_noc_number();
        reached(&noc_number, Stage::IdentifierAssigned);
        Registration {
            noc_number,
            verify_base,
            application,
        }
    }

    /// Assign a number and run every stage before returning.
    pub async fn register(
        &self,
        application: Application,
        verify_base: String,
    ) -> Result<NocRecord, PipelineError> {
        self.run(self.assign(application, verify_base)).await
    }

    /// Run the remaining stages in a detached task. The caller has usually answered the
    /// client already, so the outcome is only logged.
    pub fn spawn(&self, registration: Registration) -> JoinHandle<()> {
        let pipeline = self.clone();
        tokio::spawn(async move {
            if let Err(e) = pipeline.run(registration).await {
                tracing::error!(stage = %e.stage, "Background registration failed: {}", e);
            }
        })
    }

    pub async fn run(&self, registration: Registration) -> Result<NocRecord, PipelineError> {
        let Registration {
            noc_number,
            verify_base,
            application,
        } = registration;
        let number = noc_number.as_str();
        let photo = application.photo;

        let photo_url = self
            .assets
            .store(AssetCategory::Photo, photo.data.clone(), &photo.content_type)
            .await
            .map_err(failed(number, Stage::PhotoStored))?;
        reached(number, Stage::PhotoStored);

        let qr_code = qr::encode_png(&qr::verification_url(&verify_base, number))
            .map_err(failed(number, Stage::QrGenerated))?;
        reached(number, Stage::QrGenerated);

        let qr_code_url = self
            .assets
            .store(AssetCategory::QrCode, qr_code.clone(), "image/png")
            .await
            .map_err(failed(number, Stage::QrStored))?;
        reached(number, Stage::QrStored);

        let record = self
            .records
            .create(NewNoc {
                noc_number: noc_number.clone(),
                applicant: application.applicant,
                photo_url,
                qr_code_url,
            })
            .await
            .map_err(failed(number, Stage::RecordCreated))?;
        reached(number, Stage::RecordCreated);

        let renderer = Arc::clone(&self.renderer);
        let certificate = CertificateData {
            record,
            photo: photo.data,
            qr_code,
        };
        let pdf = tokio::task::spawn_blocking(move || renderer.render(&certificate))
            .await
            .map_err(failed(number, Stage::CertificateRendered))?
            .map_err(failed(number, Stage::CertificateRendered))?;
        reached(number, Stage::CertificateRendered);

        let pdf_url = self
            .assets
            .store(AssetCategory::Pdf, pdf, "application/pdf")
            .await
            .map_err(failed(number, Stage::CertificateStored))?;
        reached(number, Stage::CertificateStored);

        let record = self
            .records
            .update(
                number,
                NocUpdate {
                    pdf_url: Some(pdf_url),
                    ..Default::default()
                },
            )
            .await
            .map_err(failed(number, Stage::RecordFinalized))?;
        reached(number, Stage::RecordFinalized);

        tracing::info!("Issued NOC {}", number);
        Ok(record)
    }
}
