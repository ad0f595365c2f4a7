use std::io::Write;

use chrono::{NaiveDate, SecondsFormat};

use super::domain::LeadRecord;

pub const EXPORT_HEADERS: [&str; 14] = [
    "ID",
    "Name",
    "Email",
    "Company",
    "Properties",
    "Status",
    "Date",
    "Source",
    "Device",
    "Notes",
    "URL",
    "UTM Source",
    "UTM Medium",
    "UTM Campaign",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Write the dashboard's CSV layout for `leads`, in the order given.
pub fn export_csv<W: Write>(leads: &[LeadRecord], writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    csv_writer.write_record(EXPORT_HEADERS)?;

    for record in leads {
        let lead = &record.lead;
        let submitted = lead.submitted_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let device = lead.device_type.map_or("unknown", |device| device.label());

        csv_writer.write_record([
            record.id.0.as_str(),
            lead.name.as_str(),
            lead.email.as_str(),
            lead.company.as_str(),
            lead.job_volume.as_str(),
            lead.status.label(),
            submitted.as_str(),
            lead.form_source.as_str(),
            device,
            lead.notes.as_str(),
            lead.url.as_deref().unwrap_or_default(),
            lead.utm_source.as_deref().unwrap_or_default(),
            lead.utm_medium.as_deref().unwrap_or_default(),
            lead.utm_campaign.as_deref().unwrap_or_default(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn export_to_vec(leads: &[LeadRecord]) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    export_csv(leads, &mut buffer)?;
    Ok(buffer)
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("jobvault-leads-{}.csv", date.format("%Y-%m-%d"))
}
