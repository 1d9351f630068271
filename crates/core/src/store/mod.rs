//! File-backed session store with a 24h expiry policy.
//!
//! The store owns every persisted [`SessionRecord`]; all access goes through
//! `get`/`put`/`delete`. Each mutation rewrites the whole backing file before
//! returning. Concurrent processes racing on the file are last-writer-wins by
//! design; within one process the table lock is held across mutation and
//! persist.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[cfg(test)]
mod tests;

/// Records expire 24 hours after creation.
const SESSION_TTL_MS: u64 = 24 * 60 * 60 * 1000;

/// One cookie captured verbatim from the authenticated browsing context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
	pub name: String,
	pub value: String,
	pub domain: String,
	pub path: String,
	/// Expiry in epoch seconds; absent for session cookies.
	#[serde(default)]
	pub expires: Option<f64>,
	pub secure: bool,
	pub http_only: bool,
	#[serde(default)]
	pub same_site: Option<String>,
}

/// Persisted authentication snapshot keyed by an opaque session identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
	#[serde(default)]
	pub cookies: Vec<SessionCookie>,
	#[serde(default)]
	pub local_storage: HashMap<String, String>,
	/// Creation time in epoch milliseconds; never refreshed on read.
	pub timestamp: u64,
}

impl SessionRecord {
	/// Builds a record stamped with the current time.
	pub fn new(cookies: Vec<SessionCookie>, local_storage: HashMap<String, String>) -> Self {
		Self {
			cookies,
			local_storage,
			timestamp: now_ms(),
		}
	}
}

/// Process-wide session table mirrored to a single JSON file.
#[derive(Debug)]
pub struct SessionStore {
	path: PathBuf,
	table: Mutex<HashMap<String, SessionRecord>>,
}

impl SessionStore {
	/// Loads the backing file if present. A missing, unreadable, or corrupt
	/// file degrades to an empty store; nobody is logged in, nothing crashes.
	pub fn load(path: PathBuf) -> Self {
		let table = match fs::read_to_string(&path) {
			Ok(content) => match serde_json::from_str::<HashMap<String, SessionRecord>>(&content) {
				Ok(table) => {
					debug!(target = "gamecode.store", count = table.len(), "loaded sessions from file");
					table
				}
				Err(err) => {
					warn!(target = "gamecode.store", path = %path.display(), error = %err, "session file corrupt; starting empty");
					HashMap::new()
				}
			},
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
			Err(err) => {
				warn!(target = "gamecode.store", path = %path.display(), error = %err, "session file unreadable; starting empty");
				HashMap::new()
			}
		};
		Self {
			path,
			table: Mutex::new(table),
		}
	}

	/// Returns the record for `session_id` if it is still fresh. An expired
	/// record is evicted (removed and the removal persisted) and never
	/// returned.
	pub fn get(&self, session_id: &str) -> Option<SessionRecord> {
		self.get_at(session_id, now_ms())
	}

	fn get_at(&self, session_id: &str, now: u64) -> Option<SessionRecord> {
		let mut table = self.table.lock();
		let timestamp = table.get(session_id)?.timestamp;
		if now.saturating_sub(timestamp) >= SESSION_TTL_MS {
			debug!(target = "gamecode.store", session_id, "session expired; evicting");
			table.remove(session_id);
			self.persist(&table);
			return None;
		}
		table.get(session_id).cloned()
	}

	/// Inserts or replaces a record, then rewrites the backing file before
	/// returning. A failed write is logged; memory stays the source of truth
	/// until the next successful save.
	pub fn put(&self, session_id: &str, record: SessionRecord) {
		let mut table = self.table.lock();
		table.insert(session_id.to_string(), record);
		self.persist(&table);
	}

	/// Removes a record if present and persists. A no-op on absent keys.
	pub fn delete(&self, session_id: &str) {
		let mut table = self.table.lock();
		if table.remove(session_id).is_some() {
			self.persist(&table);
		}
	}

	fn persist(&self, table: &HashMap<String, SessionRecord>) {
		let json = match serde_json::to_string(table) {
			Ok(json) => json,
			Err(err) => {
				warn!(target = "gamecode.store", error = %err, "failed to serialize session table");
				return;
			}
		};
		if let Err(err) = fs::write(&self.path, json) {
			warn!(target = "gamecode.store", path = %self.path.display(), error = %err, "failed to persist session table");
		}
	}
}

fn now_ms() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_millis() as u64
}
