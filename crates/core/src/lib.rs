//! Session lifecycle and browser-automation core for game-code submission.
//!
//! This crate centralizes the pieces a calling layer needs to log a user in
//! to the target site, replay the persisted session later to submit a short
//! text code, and turn the site's free-form feedback into a structured
//! verdict. Each operation drives one disposable automation surface and
//! releases it on every exit path.

/// Feedback extraction and success-verdict classification.
pub mod classify;
/// Login/submit/logout orchestration over a driven surface.
pub mod controller;
/// Error taxonomy shared across the crate.
pub mod error;
/// Target-site URLs, selectors, and timing profile.
pub mod site;
/// Durable session-record storage with expiry.
pub mod store;
/// Browser automation surface trait and the Chromium-backed implementation.
pub mod surface;

/// Feedback classification types and the classifier itself.
pub use classify::{FeedbackClasses, FeedbackMessage, MessageKind, RawFeedback, SubmissionOutcome, classify};
/// Operation orchestrator.
pub use controller::Controller;
/// Crate error and result types.
pub use error::{Error, Result};
/// Target-site profile.
pub use site::Site;
/// Session persistence types.
pub use store::{SessionCookie, SessionRecord, SessionStore};
/// Surface capability seam and Chromium implementation.
pub use surface::{ChromiumProvider, ChromiumSurface, Surface, SurfaceProvider};
