use std::time::Duration;

use reqwest::{Client, multipart};
use serde_json::Value;

use crate::{Error, Result};

const MAX_LIST_PAGES: usize = 50;

#[derive(Clone, Debug)]
pub struct RegistryFile {
	pub external_id: String,
	pub name: String,
}

/// Upload content under its stable name; returns the provider's id.
pub async fn upload(
	cfg: &lode_config::ProviderConfig,
	bytes: Vec<u8>,
	stable_name: &str,
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let part = multipart::Part::bytes(bytes).file_name(stable_name.to_string());
	let form = multipart::Form::new().text("purpose", "assistants").part("file", part);
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.multipart(form)
		.send()
		.await?;
	let json = crate::read_json(res).await?;

	parse_upload_response(json)
}

/// Authoritative listing of everything registered with the provider.
/// Pages through the listing; bounded so a misbehaving provider cannot
/// loop forever.
pub async fn list_all(cfg: &lode_config::ProviderConfig) -> Result<Vec<RegistryFile>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let mut out = Vec::new();
	let mut after: Option<String> = None;

	for _ in 0..MAX_LIST_PAGES {
		let mut url = format!("{}{}", cfg.api_base, cfg.path);

		if let Some(after) = after.as_deref() {
			url = format!("{url}?after={after}");
		}

		let res = client
			.get(url)
			.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.send()
			.await?;
		let json = crate::read_json(res).await?;
		let (files, has_more) = parse_list_page(json)?;

		after = files.last().map(|file| file.external_id.clone());

		out.extend(files);

		if !has_more || after.is_none() {
			break;
		}
	}

	Ok(out)
}

fn parse_upload_response(json: Value) -> Result<String> {
	json.get("id")
		.and_then(|v| v.as_str())
		.map(str::to_string)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Upload response is missing an id.".to_string(),
		})
}

fn parse_list_page(json: Value) -> Result<(Vec<RegistryFile>, bool)> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Listing response is missing data array.".to_string() }
	})?;
	let mut files = Vec::with_capacity(data.len());

	for item in data {
		let Some(external_id) = item.get("id").and_then(|v| v.as_str()) else {
			continue;
		};
		let name = item
			.get("filename")
			.or_else(|| item.get("name"))
			.and_then(|v| v.as_str())
			.unwrap_or_default();

		files.push(RegistryFile { external_id: external_id.to_string(), name: name.to_string() });
	}

	let has_more = json.get("has_more").and_then(|v| v.as_bool()).unwrap_or(false);

	Ok((files, has_more))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_upload_id() {
		let json = serde_json::json!({ "id": "file_abc", "filename": "hash-manual.pdf" });

		assert_eq!(parse_upload_response(json).expect("parse failed"), "file_abc");
	}

	#[test]
	fn upload_without_id_is_an_error() {
		assert!(parse_upload_response(serde_json::json!({ "filename": "x" })).is_err());
	}

	#[test]
	fn parses_list_page_with_name_fallback() {
		let json = serde_json::json!({
			"data": [
				{ "id": "file_1", "filename": "a.pdf" },
				{ "id": "file_2", "name": "b.pdf" }
			],
			"has_more": true
		});
		let (files, has_more) = parse_list_page(json).expect("parse failed");

		assert_eq!(files.len(), 2);
		assert_eq!(files[1].name, "b.pdf");
		assert!(has_more);
	}

	#[test]
	fn list_page_without_data_is_an_error() {
		assert!(parse_list_page(serde_json::json!({ "has_more": false })).is_err());
	}
}
