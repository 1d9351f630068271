//! Error taxonomy for the automation core.
//!
//! Surface faults during an operation are caught at the operation boundary
//! and folded into a boolean or outcome; only surface acquisition failure
//! before any user action propagates to the caller.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// Browser process could not be launched; fatal to the invocation.
	#[error("failed to launch automation surface: {0}")]
	SurfaceInit(String),

	/// The surface was used after its resources were released.
	#[error("automation surface already released")]
	SurfaceClosed,

	/// An expected page element did not appear within the timeout.
	#[error("timed out after {timeout_ms}ms waiting for `{selector}`")]
	ElementTimeout { selector: String, timeout_ms: u64 },

	/// Every candidate action for a step failed.
	#[error("all candidate actions failed for {action}")]
	ActionFallbackExhausted { action: String },

	/// Requested session is missing or expired; the caller should prompt
	/// re-authentication rather than treat this as a generic failure.
	#[error("session is missing or expired")]
	SessionInvalid,

	/// Failure while releasing surface resources; logged, never propagated
	/// past `close`.
	#[error("cleanup failure: {0}")]
	Cleanup(String),

	#[error("browser driver error: {0}")]
	Driver(#[from] chromiumoxide::error::CdpError),

	#[error("session store I/O: {0}")]
	StoreIo(#[from] std::io::Error),

	#[error("malformed page payload: {0}")]
	Payload(#[from] serde_json::Error),
}
