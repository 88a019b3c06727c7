//! Document understanding: turn an ID card image into an `IdentityRecord`.
//!
//! The vision model is asked for a single JSON verdict; `response` parses it,
//! `fields` maps the card labels onto the record, and `extractor` wires both
//! behind the `Extractor` trait.

pub mod extractor;
pub mod fields;
pub mod mime;
pub mod prompt;
pub mod response;
pub mod vision;

pub use extractor::VisionExtractor;
pub use fields::{parse_birth_date, record_from_fields};
pub use mime::sniff_image_mime;
pub use response::{parse_verdict, Verdict};
pub use vision::{describe_image, VisionProvider};
