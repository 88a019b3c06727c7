//! Fraud alert delivery.
//!
//! Every transport implements `idguard_core::Notifier`. Rendering of the
//! alert (subject, HTML and text bodies) is shared in `render`.

pub mod email;
pub mod log;
pub mod render;
pub mod webhook;

pub use email::{EmailRelayConfig, EmailRelayNotifier};
pub use log::LogNotifier;
pub use render::{render_alert, RenderedAlert};
pub use webhook::WebhookNotifier;
