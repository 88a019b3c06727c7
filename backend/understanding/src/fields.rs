//! Mapping of extracted card labels onto an `IdentityRecord`.
//!
//! Labels are matched after normalisation (lowercase, alphanumerics only), so
//! `"Tempat/Tgl Lahir"`, `"tempat_tgl_lahir"` and `"TEMPAT TGL LAHIR"` are the
//! same key.

use chrono::NaiveDate;
use idguard_core::{ExtractionError, IdentityRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

const ID_NUMBER_KEYS: &[&str] = &["idnumber", "nik", "documentnumber"];
const FULL_NAME_KEYS: &[&str] = &["fullname", "nama", "name"];
const BIRTH_DATE_KEYS: &[&str] = &["birthdate", "dateofbirth", "tanggallahir", "tgllahir"];
const PLACE_AND_DATE_KEYS: &[&str] = &["tempattgllahir", "tempattanggallahir", "placeanddateofbirth"];

const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d"];

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{1,2}[-/.]\d{1,2}[-/.]\d{4}|\d{4}[-/]\d{1,2}[-/]\d{1,2}").unwrap()
});

/// Parse a birth date in any of the formats seen on documents.
pub fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Split a combined "PLACE, DD-MM-YYYY" value into place and date text.
fn split_place_and_date(raw: &str) -> (Option<String>, Option<String>) {
    match DATE_RE.find(raw) {
        Some(m) => {
            let place = raw[..m.start()]
                .trim()
                .trim_end_matches(',')
                .trim()
                .to_string();
            let place = (!place.is_empty()).then_some(place);
            (place, Some(m.as_str().to_string()))
        }
        None => {
            let place = raw.trim().trim_end_matches(',').trim().to_string();
            ((!place.is_empty()).then_some(place), None)
        }
    }
}

fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// `"Gol. Darah"` → `"gol_darah"`.
fn attribute_key(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            key.push(c.to_ascii_lowercase());
        } else if !key.ends_with('_') {
            key.push('_');
        }
    }
    key.trim_matches('_').to_string()
}

fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Build an `IdentityRecord` from the model's label → value map.
///
/// All three required fields must be present and non-empty; everything else
/// that carries a scalar value is kept as an attribute.
pub fn record_from_fields(fields: &Map<String, Value>) -> Result<IdentityRecord, ExtractionError> {
    let mut id_number = None;
    let mut full_name = None;
    let mut birth_date_text = None;
    let mut birth_place = None;
    let mut attributes = Vec::new();

    for (label, value) in fields {
        let norm = normalize_label(label);
        let Some(text) = value_text(value) else { continue };

        if ID_NUMBER_KEYS.contains(&norm.as_str()) {
            id_number.get_or_insert(text);
        } else if FULL_NAME_KEYS.contains(&norm.as_str()) {
            full_name.get_or_insert(text);
        } else if BIRTH_DATE_KEYS.contains(&norm.as_str()) {
            birth_date_text = Some(text);
        } else if PLACE_AND_DATE_KEYS.contains(&norm.as_str()) {
            let (place, date) = split_place_and_date(&text);
            if birth_place.is_none() {
                birth_place = place;
            }
            if birth_date_text.is_none() {
                birth_date_text = date;
            }
        } else {
            attributes.push((attribute_key(label), text));
        }
    }

    let mut missing = Vec::new();
    if id_number.is_none() {
        missing.push("id_number".to_string());
    }
    if full_name.is_none() {
        missing.push("full_name".to_string());
    }
    if birth_date_text.is_none() {
        missing.push("birth_date".to_string());
    }
    let (Some(id_number), Some(full_name), Some(birth_date_text)) =
        (id_number, full_name, birth_date_text)
    else {
        return Err(ExtractionError::MissingFields(missing));
    };

    let birth_date = parse_birth_date(&birth_date_text).ok_or_else(|| ExtractionError::InvalidField {
        field: "birth_date".to_string(),
        message: format!("unrecognised date `{birth_date_text}`"),
    })?;

    let mut record = IdentityRecord::new(id_number, full_name, birth_date)?;
    if let Some(place) = birth_place {
        record = record.with_attribute("birth_place", place);
    }
    for (key, value) in attributes {
        if !key.is_empty() {
            record = record.with_attribute(key, value);
        }
    }
    Ok(record)
}
