//! Alert rendering: subject line, HTML body and plain-text body.

use idguard_core::{FraudAlert, IdentityRecord};
use idguard_logging::mask_id_number;

/// A fraud alert ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedAlert {
    pub subject: String,
    pub html: String,
    pub text: String,
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn record_rows(record: &IdentityRecord) -> Vec<(String, String)> {
    let mut rows = vec![
        ("Identity number".to_string(), record.id_number.clone()),
        ("Full name".to_string(), record.full_name.clone()),
        ("Birth date".to_string(), record.birth_date.format("%Y-%m-%d").to_string()),
    ];
    for (key, value) in &record.attributes {
        rows.push((title_case(key), value.clone()));
    }
    rows
}

/// `"gol_darah"` → `"Gol Darah"`.
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn html_table(title: &str, record: &IdentityRecord) -> String {
    let rows: String = record_rows(record)
        .iter()
        .map(|(k, v)| {
            format!(
                "<tr><th style=\"text-align:left;padding:4px 12px 4px 0\">{}</th><td>{}</td></tr>",
                escape_html(k),
                escape_html(v)
            )
        })
        .collect();
    format!(
        "<h3 style=\"color:#495057;margin-top:20px\">{}</h3>\
         <table style=\"background:#f8f9fa;border:1px solid #dee2e6;padding:12px\">{}</table>",
        escape_html(title),
        rows
    )
}

fn text_block(title: &str, record: &IdentityRecord) -> String {
    let mut out = format!("{title}\n");
    for (k, v) in record_rows(record) {
        out.push_str(&format!("  - {k}: {v}\n"));
    }
    out
}

/// Render an alert for delivery.
pub fn render_alert(alert: &FraudAlert) -> RenderedAlert {
    let subject = format!(
        "FRAUD ALERT: duplicate identity number {}",
        mask_id_number(alert.id_number())
    );
    let detected = alert.detected_at.format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let differing = alert.differing_fields();
    let differing_text = if differing.is_empty() {
        "none (identical submission)".to_string()
    } else {
        differing.join(", ")
    };

    let html = format!(
        "<!DOCTYPE html><html><body>\
         <div style=\"font-family:Arial,sans-serif;max-width:600px;margin:auto;border:1px solid #ddd;padding:20px\">\
         <div style=\"background:#f8d7da;color:#721c24;padding:15px;border-radius:5px;text-align:center\">\
         <h1 style=\"margin:0\">FRAUD DETECTION ALERT</h1></div>\
         <p>An identity document was submitted whose identity number is already on record. Review is required.</p>\
         <p><strong>Reason:</strong> <strong style=\"color:#c00\">{reason}</strong><br>\
         <strong>Detected at:</strong> {detected}<br>\
         <strong>Run:</strong> {run_id}<br>\
         <strong>Fields that differ:</strong> {differing}</p>\
         {submitted}{existing}\
         <p style=\"text-align:center;color:#6c757d;font-size:12px;margin-top:20px\">\
         <em>Automated message from the identity verification service.</em></p>\
         </div></body></html>",
        reason = escape_html(&alert.reason),
        detected = detected,
        run_id = alert.run_id,
        differing = escape_html(&differing_text),
        submitted = html_table("Submitted record", &alert.candidate),
        existing = html_table("Record on file", &alert.matched),
    );

    let text = format!(
        "FRAUD DETECTION ALERT\n\nReason: {}\nDetected at: {}\nRun: {}\nFields that differ: {}\n\n{}\n{}",
        alert.reason,
        detected,
        alert.run_id,
        differing_text,
        text_block("Submitted record", &alert.candidate),
        text_block("Record on file", &alert.matched),
    );

    RenderedAlert { subject, html, text }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn alert() -> FraudAlert {
        let day = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let candidate = IdentityRecord::new("3171234567890001", "Jane <Doe>", day)
            .unwrap()
            .with_attribute("gol_darah", "O");
        let matched = IdentityRecord::new("3171234567890001", "Jane Doe", day).unwrap();
        FraudAlert::duplicate(Uuid::new_v4(), candidate, matched)
    }

    #[test]
    fn subject_masks_identity_number() {
        let rendered = render_alert(&alert());
        assert_eq!(
            rendered.subject,
            "FRAUD ALERT: duplicate identity number ************0001"
        );
    }

    #[test]
    fn bodies_list_both_records() {
        let rendered = render_alert(&alert());
        assert!(rendered.html.contains("Jane &lt;Doe&gt;"));
        assert!(rendered.html.contains("Record on file"));
        assert!(rendered.text.contains("Gol Darah: O"));
        assert!(rendered.text.contains("Fields that differ: full_name"));
    }
}
