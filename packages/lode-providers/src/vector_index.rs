use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexItem {
	pub external_id: String,
	pub status: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachOutcome {
	Attached,
	AlreadyAttached,
}

/// Create a fresh index. `ttl_hint_days` asks the provider to expire the
/// index on its side as a cleanup backstop; abandoned indexes are never
/// deleted by the caller.
pub async fn create_index(
	cfg: &lode_config::ProviderConfig,
	name: &str,
	ttl_hint_days: Option<u32>,
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut body = serde_json::json!({ "name": name });

	if let Some(days) = ttl_hint_days {
		body["expires_after"] = serde_json::json!({ "anchor": "last_active_at", "days": days });
	}

	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json = crate::read_json(res).await?;

	json.get("id").and_then(|v| v.as_str()).map(str::to_string).ok_or_else(|| {
		Error::InvalidResponse { message: "Index creation response is missing an id.".to_string() }
	})
}

pub async fn list_items(
	cfg: &lode_config::ProviderConfig,
	index_id: &str,
) -> Result<Vec<IndexItem>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}/{index_id}/files?limit=100", cfg.api_base, cfg.path);
	let res = client
		.get(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.send()
		.await?;
	let json = crate::read_json(res).await?;

	parse_item_list(json)
}

/// Attach one content id. A provider-side "already attached" response is a
/// success, not a failure.
pub async fn attach_item(
	cfg: &lode_config::ProviderConfig,
	index_id: &str,
	external_id: &str,
) -> Result<AttachOutcome> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}/{index_id}/files", cfg.api_base, cfg.path);
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&serde_json::json!({ "file_id": external_id }))
		.send()
		.await?;
	let status = res.status();

	if status.is_success() {
		return Ok(AttachOutcome::Attached);
	}

	let body = res.text().await.unwrap_or_default();

	if is_already_attached(&body) {
		return Ok(AttachOutcome::AlreadyAttached);
	}

	Err(crate::status_error(status, body))
}

fn is_already_attached(body: &str) -> bool {
	let lowered = body.to_lowercase();

	lowered.contains("already attached") || lowered.contains("already exists")
}

fn parse_item_list(json: Value) -> Result<Vec<IndexItem>> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse {
			message: "Index listing response is missing data array.".to_string(),
		}
	})?;
	let mut items = Vec::with_capacity(data.len());

	for item in data {
		let Some(external_id) = item.get("id").and_then(|v| v.as_str()) else {
			continue;
		};
		let status = item.get("status").and_then(|v| v.as_str()).unwrap_or("unknown");

		items.push(IndexItem { external_id: external_id.to_string(), status: status.to_string() });
	}

	Ok(items)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_item_statuses() {
		let json = serde_json::json!({
			"data": [
				{ "id": "file_1", "status": "completed" },
				{ "id": "file_2", "status": "in_progress" },
				{ "id": "file_3" }
			]
		});
		let items = parse_item_list(json).expect("parse failed");

		assert_eq!(items.len(), 3);
		assert_eq!(items[0].status, "completed");
		assert_eq!(items[2].status, "unknown");
	}

	#[test]
	fn recognizes_already_attached_responses() {
		assert!(is_already_attached("File already attached to vector store."));
		assert!(is_already_attached("The file ALREADY EXISTS in this store."));
		assert!(!is_already_attached("quota exceeded"));
	}
}
