//! CSV projection of the result store.

use crate::error::Result;
use crate::models::ListingRecord;
use csv::{QuoteStyle, WriterBuilder};
use std::path::Path;

const HEADERS: [&str; 10] = [
    "Name",
    "Address",
    "Phone",
    "Additional Phones",
    "Website",
    "Email",
    "Additional Emails",
    "Social Media",
    "Other Contacts",
    "Rating",
];

/// Writes the records as CSV: every field quoted (internal quotes
/// doubled), multi-valued fields flattened with "; ".
pub(crate) fn export_csv(records: &[ListingRecord], output: &Path) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_path(output)?;

    writer.write_record(HEADERS)?;
    for record in records {
        let additional_phones = record.additional_phones.join("; ");
        let additional_emails = record.additional_emails.join("; ");
        let social_media = record.social_media.join("; ");
        let additional_contacts = record.additional_contacts.join("; ");
        writer.write_record([
            record.name.as_str(),
            record.address.as_deref().unwrap_or(""),
            record.phone.as_deref().unwrap_or(""),
            additional_phones.as_str(),
            record.website.as_deref().unwrap_or(""),
            record.email.as_deref().unwrap_or(""),
            additional_emails.as_str(),
            social_media.as_str(),
            additional_contacts.as_str(),
            record.rating.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;

    tracing::info!(
        target: "export",
        "Exported {} records to {}",
        records.len(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;

    #[test]
    fn test_quoting_and_flattening() {
        let record = ListingRecord {
            name: "Joe's \"Famous\" Diner".to_string(),
            address: Some("1 Main St, Springfield".to_string()),
            phone: Some("+1 555 0100".to_string()),
            additional_phones: vec!["+1 555 0101".to_string(), "+1 555 0102".to_string()],
            website: Some("https://joes.example.net".to_string()),
            rating: Some("4.5".to_string()),
            email: Some("info@joes.example.net".to_string()),
            additional_emails: vec!["orders@joes.example.net".to_string()],
            social_media: vec!["https://instagram.example/joes".to_string()],
            additional_contacts: Vec::new(),
            email_source: Some(Provenance::Direct),
        };

        let path = std::env::temp_dir().join(format!(
            "lead-sleuth-export-test-{}.csv",
            std::process::id()
        ));
        export_csv(&[record], &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let mut lines = written.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("\"Name\",\"Address\""));
        let row = lines.next().unwrap();
        // Internal quotes doubled, every field quoted.
        assert!(row.contains("\"Joe's \"\"Famous\"\" Diner\""));
        assert!(row.contains("\"+1 555 0101; +1 555 0102\""));
        assert!(row.contains("\"orders@joes.example.net\""));
        assert!(row.ends_with("\"4.5\""));
    }
}
