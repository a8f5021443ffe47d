use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Run one generation attempt against the configured scope.
///
/// `index_ids` are attached as retrieval handles; `force_retrieval` makes
/// the provider invoke retrieval instead of answering unaided.
pub async fn generate(
	cfg: &lode_config::GenerationProviderConfig,
	system_prompt: &str,
	user_prompt: &str,
	index_ids: &[String],
	force_retrieval: bool,
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"input": [
			{ "role": "system", "content": system_prompt },
			{ "role": "user", "content": user_prompt },
		],
	});

	if !index_ids.is_empty() {
		body["tools"] = serde_json::json!([
			{ "type": "file_search", "vector_store_ids": index_ids }
		]);
		body["tool_choice"] =
			Value::String(if force_retrieval { "required" } else { "auto" }.to_string());
	}

	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json = crate::read_json(res).await?;

	parse_generation_response(json)
}

/// The single place the provider's native response shape is normalized.
fn parse_generation_response(json: Value) -> Result<String> {
	if let Some(text) = json.get("output_text").and_then(|v| v.as_str())
		&& !text.trim().is_empty()
	{
		return Ok(text.to_string());
	}

	let Some(output) = json.get("output").and_then(|v| v.as_array()) else {
		return Err(Error::InvalidResponse {
			message: "Generation response is missing output.".to_string(),
		});
	};

	let mut texts = Vec::new();

	for item in output {
		let Some(parts) = item.get("content").and_then(|v| v.as_array()) else {
			continue;
		};

		for part in parts {
			let kind = part.get("type").and_then(|v| v.as_str()).unwrap_or_default();

			if matches!(kind, "output_text" | "text")
				&& let Some(text) = part.get("text").and_then(|v| v.as_str())
			{
				texts.push(text.to_string());
			}
		}
	}

	if texts.is_empty() {
		return Err(Error::InvalidResponse {
			message: "Generation response contains no text parts.".to_string(),
		});
	}

	Ok(texts.join("\n"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn prefers_output_text_helper() {
		let json = serde_json::json!({ "output_text": "answer" });

		assert_eq!(parse_generation_response(json).expect("parse failed"), "answer");
	}

	#[test]
	fn joins_output_content_parts() {
		let json = serde_json::json!({
			"output": [
				{ "content": [{ "type": "output_text", "text": "first" }] },
				{ "content": [{ "type": "text", "text": "second" }] }
			]
		});

		assert_eq!(parse_generation_response(json).expect("parse failed"), "first\nsecond");
	}

	#[test]
	fn blank_output_text_falls_back_to_output_array() {
		let json = serde_json::json!({
			"output_text": "  ",
			"output": [
				{ "content": [{ "type": "output_text", "text": "fallback" }] }
			]
		});

		assert_eq!(parse_generation_response(json).expect("parse failed"), "fallback");
	}

	#[test]
	fn missing_output_is_an_error() {
		let json = serde_json::json!({ "id": "resp_1" });

		assert!(parse_generation_response(json).is_err());
	}

	#[test]
	fn non_text_parts_are_an_error() {
		let json = serde_json::json!({
			"output": [
				{ "content": [{ "type": "tool_call", "name": "file_search" }] }
			]
		});

		assert!(parse_generation_response(json).is_err());
	}
}
