mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, GenerationProviderConfig, Library, Limits, Postgres, ProviderConfig, Providers,
	Security, Service, Session, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.admin_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.admin_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	for (label, key) in [
		("generation", &cfg.providers.generation.api_key),
		("registry", &cfg.providers.registry.api_key),
		("vector_index", &cfg.providers.vector_index.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if cfg.providers.generation.model.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.generation.model must be non-empty.".to_string(),
		});
	}
	if !cfg.providers.generation.temperature.is_finite() {
		return Err(Error::Validation {
			message: "providers.generation.temperature must be a finite number.".to_string(),
		});
	}
	if !(0.0..=2.0).contains(&cfg.providers.generation.temperature) {
		return Err(Error::Validation {
			message: "providers.generation.temperature must be in the range 0.0-2.0.".to_string(),
		});
	}

	for index_id in &cfg.library.index_ids {
		if index_id.trim().is_empty() {
			return Err(Error::Validation {
				message: "library.index_ids entries must be non-empty.".to_string(),
			});
		}
	}

	if cfg.session.index_ttl_minutes <= 0 {
		return Err(Error::Validation {
			message: "session.index_ttl_minutes must be greater than zero.".to_string(),
		});
	}
	if cfg.session.indexing_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "session.indexing_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.session.indexing_poll_ms == 0 {
		return Err(Error::Validation {
			message: "session.indexing_poll_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.session.indexing_poll_ms >= cfg.session.indexing_timeout_ms {
		return Err(Error::Validation {
			message: "session.indexing_poll_ms must be less than session.indexing_timeout_ms."
				.to_string(),
		});
	}

	if cfg.limits.max_files == 0 {
		return Err(Error::Validation {
			message: "limits.max_files must be greater than zero.".to_string(),
		});
	}
	if cfg.limits.max_file_bytes == 0 {
		return Err(Error::Validation {
			message: "limits.max_file_bytes must be greater than zero.".to_string(),
		});
	}
	if cfg.limits.max_question_chars == 0 {
		return Err(Error::Validation {
			message: "limits.max_question_chars must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.security.api_auth_token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false)
	{
		cfg.security.api_auth_token = None;
	}
	if cfg
		.security
		.admin_auth_token
		.as_deref()
		.map(|token| token.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.security.admin_auth_token = None;
	}

	cfg.library.index_ids = cfg
		.library
		.index_ids
		.iter()
		.map(|id| id.trim().to_string())
		.filter(|id| !id.is_empty())
		.collect();
}
