use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub library: Library,
	pub session: Session,
	pub limits: Limits,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub generation: GenerationProviderConfig,
	pub registry: ProviderConfig,
	pub vector_index: ProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct GenerationProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Library {
	/// Curated shared indexes, read-only to the assistant.
	pub index_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Session {
	pub index_ttl_minutes: i64,
	/// Provider-side auto-expiry hint for abandoned session indexes.
	pub index_ttl_hint_days: Option<u32>,
	pub indexing_timeout_ms: u64,
	pub indexing_poll_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Limits {
	pub max_files: u32,
	pub max_file_bytes: u64,
	pub max_question_chars: u32,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	pub api_auth_token: Option<String>,
	pub admin_auth_token: Option<String>,
}
