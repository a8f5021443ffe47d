pub mod generation;
pub mod registry;
pub mod vector_index;

mod error;

pub use error::{Error, Result};

use reqwest::{
	Response, StatusCode,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

const MAX_ERROR_BODY_CHARS: usize = 512;

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

pub(crate) async fn read_json(res: Response) -> Result<Value> {
	let status = res.status();

	if !status.is_success() {
		return Err(status_error(status, res.text().await.unwrap_or_default()));
	}

	Ok(res.json().await?)
}

pub(crate) fn status_error(status: StatusCode, body: String) -> Error {
	let mut message = body.trim().to_string();

	if message.chars().count() > MAX_ERROR_BODY_CHARS {
		message = message.chars().take(MAX_ERROR_BODY_CHARS).collect();
		message.push_str("...");
	}

	Error::Status { status: status.as_u16(), message }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builds_bearer_and_default_headers() {
		let mut defaults = Map::new();

		defaults.insert("x-extra".to_string(), Value::String("on".to_string()));

		let headers = auth_headers("key", &defaults).expect("headers failed");

		assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer key");
		assert_eq!(headers.get("x-extra").unwrap(), "on");
	}

	#[test]
	fn rejects_non_string_default_headers() {
		let mut defaults = Map::new();

		defaults.insert("x-extra".to_string(), Value::Bool(true));

		assert!(auth_headers("key", &defaults).is_err());
	}

	#[test]
	fn server_errors_classify_as_transient() {
		let err = status_error(StatusCode::BAD_GATEWAY, "upstream down".to_string());

		assert!(err.is_transient());
	}

	#[test]
	fn client_errors_classify_as_permanent() {
		let err = status_error(StatusCode::UNSUPPORTED_MEDIA_TYPE, "bad file type".to_string());

		assert!(!err.is_transient());
	}
}
