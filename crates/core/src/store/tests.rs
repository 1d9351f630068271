use std::collections::HashMap;

use tempfile::TempDir;

use super::*;

fn store_in(dir: &TempDir) -> SessionStore {
	SessionStore::load(dir.path().join("sessions.json"))
}

fn record_at(timestamp: u64) -> SessionRecord {
	SessionRecord {
		cookies: vec![SessionCookie {
			name: "SSESS".to_string(),
			value: "abc123".to_string(),
			domain: ".example.org".to_string(),
			path: "/".to_string(),
			expires: Some(1_900_000_000.0),
			secure: true,
			http_only: true,
			same_site: Some("Lax".to_string()),
		}],
		local_storage: HashMap::from([("theme".to_string(), "dark".to_string())]),
		timestamp,
	}
}

#[test]
fn put_then_get_round_trips_before_expiry() {
	let dir = TempDir::new().unwrap();
	let store = store_in(&dir);
	let record = record_at(1_000);

	store.put("sess-1", record.clone());
	let loaded = store.get_at("sess-1", 1_000 + SESSION_TTL_MS - 1).unwrap();

	assert_eq!(loaded.cookies, record.cookies);
	assert_eq!(loaded.local_storage, record.local_storage);
}

#[test]
fn get_past_ttl_evicts_and_returns_none() {
	let dir = TempDir::new().unwrap();
	let store = store_in(&dir);
	store.put("sess-1", record_at(1_000));

	assert!(store.get_at("sess-1", 1_000 + SESSION_TTL_MS + 1).is_none());
	// The eviction removed the key, not just hid it.
	assert!(store.table.lock().get("sess-1").is_none());
}

#[test]
fn eviction_persists_the_removal() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("sessions.json");
	let store = SessionStore::load(path.clone());
	store.put("sess-1", record_at(1_000));
	let _ = store.get_at("sess-1", 1_000 + SESSION_TTL_MS + 1);

	let reloaded = SessionStore::load(path);
	assert!(reloaded.get_at("sess-1", 2_000).is_none());
}

#[test]
fn expiry_is_never_refreshed_by_reads() {
	let dir = TempDir::new().unwrap();
	let store = store_in(&dir);
	store.put("sess-1", record_at(1_000));

	assert!(store.get_at("sess-1", 1_000 + SESSION_TTL_MS / 2).is_some());
	assert!(store.get_at("sess-1", 1_000 + SESSION_TTL_MS + 1).is_none());
}

#[test]
fn delete_on_absent_key_is_a_noop() {
	let dir = TempDir::new().unwrap();
	let store = store_in(&dir);
	store.delete("never-existed");
	assert!(store.get("never-existed").is_none());
}

#[test]
fn put_persists_across_reload() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("sessions.json");
	let record = record_at(1_000);
	SessionStore::load(path.clone()).put("sess-1", record.clone());

	let reloaded = SessionStore::load(path);
	assert_eq!(reloaded.get_at("sess-1", 2_000), Some(record));
}

#[test]
fn put_replaces_existing_record() {
	let dir = TempDir::new().unwrap();
	let store = store_in(&dir);
	store.put("sess-1", record_at(1_000));
	store.put("sess-1", record_at(5_000));

	assert_eq!(store.get_at("sess-1", 6_000).unwrap().timestamp, 5_000);
}

#[test]
fn corrupt_file_degrades_to_empty_store() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("sessions.json");
	std::fs::write(&path, "{not json").unwrap();

	let store = SessionStore::load(path);
	assert!(store.get("anything").is_none());
}

#[test]
fn wire_format_uses_camel_case_keys() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("sessions.json");
	SessionStore::load(path.clone()).put("sess-1", record_at(1_000));

	let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
	let entry = &raw["sess-1"];
	assert!(entry["localStorage"].is_object());
	assert!(entry["cookies"][0]["httpOnly"].is_boolean());
	assert_eq!(entry["cookies"][0]["expires"], 1_900_000_000.0);
	assert_eq!(entry["timestamp"], 1_000);
}
