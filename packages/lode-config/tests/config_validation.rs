use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use lode_config::Config;

const SAMPLE_CONFIG_TOML: &str = include_str!("../../../lode.example.toml");

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("lode_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

#[test]
fn lode_example_toml_is_valid() {
	let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

	path.push("../../lode.example.toml");

	lode_config::load(&path).expect("Expected lode.example.toml to be a valid config.");
}

#[test]
fn blank_auth_tokens_normalize_to_none() {
	let path = write_temp_config(SAMPLE_CONFIG_TOML.to_string());
	let cfg = lode_config::load(&path).expect("Expected sample config to load.");

	fs::remove_file(&path).expect("Failed to remove test config.");

	assert!(cfg.security.api_auth_token.is_none());
	assert!(cfg.security.admin_auth_token.is_none());
}

#[test]
fn generation_api_key_must_be_non_empty() {
	let mut cfg = base_config();

	cfg.providers.generation.api_key = "   ".to_string();

	let err = lode_config::validate(&cfg).expect_err("Expected api_key validation error.");

	assert!(
		err.to_string().contains("Provider generation api_key must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn session_ttl_must_be_positive() {
	let mut cfg = base_config();

	cfg.session.index_ttl_minutes = 0;

	let err = lode_config::validate(&cfg).expect_err("Expected TTL validation error.");

	assert!(
		err.to_string().contains("session.index_ttl_minutes must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn indexing_poll_must_be_shorter_than_timeout() {
	let mut cfg = base_config();

	cfg.session.indexing_poll_ms = cfg.session.indexing_timeout_ms;

	let err = lode_config::validate(&cfg).expect_err("Expected polling validation error.");

	assert!(
		err.to_string()
			.contains("session.indexing_poll_ms must be less than session.indexing_timeout_ms."),
		"Unexpected error: {err}"
	);
}

#[test]
fn limits_must_be_positive() {
	let mut cfg = base_config();

	cfg.limits.max_files = 0;

	assert!(lode_config::validate(&cfg).is_err());

	cfg = base_config();
	cfg.limits.max_file_bytes = 0;

	assert!(lode_config::validate(&cfg).is_err());

	cfg = base_config();
	cfg.limits.max_question_chars = 0;

	assert!(lode_config::validate(&cfg).is_err());
}

#[test]
fn generation_temperature_must_be_in_range() {
	let mut cfg = base_config();

	cfg.providers.generation.temperature = 2.5;

	let err = lode_config::validate(&cfg).expect_err("Expected temperature validation error.");

	assert!(
		err.to_string().contains("providers.generation.temperature must be in the range 0.0-2.0."),
		"Unexpected error: {err}"
	);
}
