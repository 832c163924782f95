use chrono::{Local, NaiveDate};

use crate::db::NocRecord;

pub const TITLE: &str = "NO OBJECTION CERTIFICATE";
pub const VERIFY_CAPTION: &str = "Scan to verify this certificate:";
pub const FOOTER: [&str; 2] = [
    "This is an electronically generated certificate.",
    "No signature is required.",
];

/// Human label for an ID proof type. Unrecognized types are shown as submitted.
pub fn id_proof_label(kind: &str) -> &str {
    match kind {
        "aadhar" => "Aadhar Card",
        "pan" => "PAN Card",
        "passport" => "Passport",
        "driving" => "Driving License",
        "voter" => "Voter ID",
        other => other,
    }
}

pub fn locale_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// Labeled rows printed between the photo and the QR code, in print order.
pub fn certificate_fields(record: &NocRecord) -> Vec<(&'static str, String)> {
    let issued_on = record.created_at.with_timezone(&Local).date_naive();
    vec![
        ("Full Name", record.full_name.clone()),
        ("Email", record.email.clone()),
        ("Phone", record.phone.clone()),
        ("Company/Organization", record.company.clone()),
        ("Designation", record.designation.clone()),
        ("ID Type", id_proof_label(&record.id_proof_type).to_string()),
        ("ID Number", record.id_proof_number.clone()),
        ("Address", record.address.clone()),
        ("Purpose", record.purpose.clone()),
        ("Valid From", locale_date(record.valid_from)),
        ("Valid To", locale_date(record.valid_to)),
        ("Issued On", locale_date(issued_on)),
    ]
}

/// Field rows as printed, `Label: value`.
pub fn field_lines(record: &NocRecord) -> Vec<String> {
    certificate_fields(record)
        .into_iter()
        .map(|(label, value)| format!("{}: {}", label, value))
        .collect()
}
