use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NocStatus {
    Pending,
    Active,
    Expired,
    Revoked,
}

impl NocStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NocStatus::Pending => "pending",
            NocStatus::Active => "active",
            NocStatus::Expired => "expired",
            NocStatus::Revoked => "revoked",
        }
    }
}

impl TryFrom<String> for NocStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(NocStatus::Pending),
            "active" => Ok(NocStatus::Active),
            "expired" => Ok(NocStatus::Expired),
            "revoked" => Ok(NocStatus::Revoked),
            _ => Err(format!("unknown NOC status '{}'", value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NocRecord {
    pub id: i32,
    pub noc_number: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub designation: String,
    pub purpose: String,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    pub id_proof_type: String,
    pub id_proof_number: String,
    pub address: String,
    pub photo_url: String,
    pub qr_code_url: String,
    pub pdf_url: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: NocStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Applicant details as submitted on the registration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applicant {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub designation: String,
    pub purpose: String,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    pub id_proof_type: String,
    pub id_proof_number: String,
    pub address: String,
}

/// Row to insert. Photo and QR locations must already exist at this point.
#[derive(Debug, Clone)]
pub struct NewNoc {
    pub noc_number: String,
    pub applicant: Applicant,
    pub photo_url: String,
    pub qr_code_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct NocUpdate {
    pub pdf_url: Option<String>,
    pub status: Option<NocStatus>,
}
