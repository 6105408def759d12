//! Note service: HTTP CRUD surface for notes plus the link publisher.
//!
//! Link state lives entirely on the event side; this service's contribution
//! to the protocol is publishing envelopes when a note is deleted or an
//! explicit link is requested.

pub mod app;
pub mod handlers;

pub use app::{app, AppState};
