use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, LodeService, Result};
use lode_domain::{
	guardrail::{self, Verdict},
	scope::{self, RetrievalScope, ScopeLabel},
};
use lode_storage::models::DocumentHandle;

const TRANSIENT_RETRY_BACKOFF_MS: u64 = 500;

const SYSTEM_PROMPT: &str = "\
You are a trade documentation assistant. Begin your reply with exactly one \
tag line: `SOURCE: MANUAL` when the answer comes from the attached \
documents, `SOURCE: GENERAL` otherwise. When citing a manual, reference the \
numbered context block or document name and page, e.g. [1] or \
[manual.pdf, p.12]. Never state a technical value (torque, voltage, \
clearance, rating, duration) that you cannot cite. If a key fact is not \
present in the documents, say you are unsure and suggest how to verify \
safely.";

pub const REFUSAL_TEXT: &str = "\
I can't verify that value from the available documents, so I won't guess. \
Please upload the relevant manual or data sheet, or name the exact model, \
and I'll answer with a citation.";

const VERIFY_NUDGE: &str =
	"\n\nPlease verify this against the cited manual pages before relying on it.";

#[derive(Clone, Debug)]
pub struct UploadedFile {
	pub name: String,
	pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct AnswerRequest {
	pub scope_key: String,
	pub question: String,
	pub trade: Option<String>,
	pub brand: Option<String>,
	pub files: Vec<UploadedFile>,
	pub share_with_library: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
	UploadsOnly,
	UploadsPlusLibrary,
	LibraryOnly,
	Refused,
}
impl AnswerMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::UploadsOnly => "uploads_only",
			Self::UploadsPlusLibrary => "uploads_plus_library",
			Self::LibraryOnly => "library_only",
			Self::Refused => "refused",
		}
	}

	fn from_scope(label: ScopeLabel) -> Self {
		match label {
			ScopeLabel::UploadsOnly => Self::UploadsOnly,
			ScopeLabel::UploadsPlusLibrary => Self::UploadsPlusLibrary,
			ScopeLabel::LibraryOnly => Self::LibraryOnly,
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct AnswerResponse {
	pub text: String,
	pub mode: AnswerMode,
}

impl LodeService {
	/// Answer one question, escalating from uploads-only to blended
	/// retrieval, and refusing rather than emitting an unverified numeric
	/// answer.
	pub async fn answer(&self, req: AnswerRequest) -> Result<AnswerResponse> {
		let req = validate_request(req, &self.cfg.limits)?;
		let now = OffsetDateTime::now_utc();
		let mut handles: Vec<DocumentHandle> = Vec::with_capacity(req.files.len());

		for file in &req.files {
			let (handle, _) = self.register_or_reuse(&file.bytes, &file.name, now).await?;

			handles.push(handle);
		}

		let has_uploads = !handles.is_empty();
		let session_index_id = if has_uploads {
			let index_id = self.ensure_index_for(&req.scope_key, now).await?;
			let attachment = self.attach(&req.scope_key, &index_id, &handles, now).await?;

			if attachment.indexed_ids.len() < handles.len() {
				tracing::warn!(
					scope_key = %req.scope_key,
					indexed = attachment.indexed_ids.len(),
					uploaded = handles.len(),
					"Some uploads are not indexed; grounding is best-effort."
				);
			}

			Some(attachment.index_id)
		} else {
			None
		};

		if req.share_with_library {
			self.share_with_library(&req.scope_key, &handles).await?;
		}

		let allowed_sources: Option<Vec<String>> = has_uploads
			.then(|| req.files.iter().map(|file| file.name.clone()).collect());
		let scopes = scope::build_scopes(
			session_index_id.as_deref(),
			&self.cfg.library.index_ids,
			has_uploads,
		);
		let user_prompt = build_user_prompt(&req);

		for retrieval_scope in &scopes {
			let raw_text = self.generate_once(retrieval_scope, &user_prompt).await?;
			let inspection = guardrail::inspect(&raw_text, allowed_sources.as_deref());

			match inspection.verdict {
				Verdict::Accepted => {
					let mut text = inspection.body;

					if inspection.needs_verify_nudge {
						text.push_str(VERIFY_NUDGE);
					}

					tracing::info!(
						scope = retrieval_scope.label.as_str(),
						has_citation = inspection.has_citation,
						"Answer accepted."
					);

					return Ok(AnswerResponse {
						text,
						mode: AnswerMode::from_scope(retrieval_scope.label),
					});
				},
				Verdict::Rejected => {
					tracing::info!(
						scope = retrieval_scope.label.as_str(),
						"Answer rejected by the grounding guardrail; escalating scope."
					);
				},
			}
		}

		// Refusal is a terminal outcome, not an error: every scope produced
		// an ungrounded numeric claim.
		tracing::info!(scope_key = %req.scope_key, "All scopes rejected; refusing.");

		Ok(AnswerResponse { text: REFUSAL_TEXT.to_string(), mode: AnswerMode::Refused })
	}

	/// One generation attempt for a scope, with a single bounded retry on
	/// transient provider failure. Grounding rejections never retry the
	/// same scope; they escalate instead.
	async fn generate_once(
		&self,
		retrieval_scope: &RetrievalScope,
		user_prompt: &str,
	) -> Result<String> {
		let mut retried = false;

		loop {
			let result = self
				.providers
				.generation
				.generate(
					&self.cfg.providers.generation,
					SYSTEM_PROMPT,
					user_prompt,
					&retrieval_scope.index_ids,
					retrieval_scope.require_grounding && !retrieval_scope.index_ids.is_empty(),
				)
				.await;

			match result {
				Ok(text) => return Ok(text),
				Err(err) => {
					let err = Error::from(err);

					if err.is_transient() && !retried {
						tracing::warn!(
							error = %err,
							scope = retrieval_scope.label.as_str(),
							"Generation failed; retrying once."
						);
						tokio::time::sleep(Duration::from_millis(TRANSIENT_RETRY_BACKOFF_MS))
							.await;

						retried = true;

						continue;
					}

					return Err(err);
				},
			}
		}
	}
}

fn validate_request(req: AnswerRequest, limits: &lode_config::Limits) -> Result<AnswerRequest> {
	let question = req.question.trim().to_string();

	if req.scope_key.trim().is_empty() {
		return Err(Error::InvalidRequest { message: "scope_key is required.".to_string() });
	}
	if question.is_empty() {
		return Err(Error::InvalidRequest { message: "question is required.".to_string() });
	}
	if question.chars().count() as u32 > limits.max_question_chars {
		return Err(Error::InvalidRequest {
			message: format!("question exceeds {} characters.", limits.max_question_chars),
		});
	}
	if req.files.len() as u32 > limits.max_files {
		return Err(Error::InvalidRequest {
			message: format!("At most {} files may be uploaded per question.", limits.max_files),
		});
	}

	for file in &req.files {
		if file.bytes.is_empty() {
			return Err(Error::InvalidRequest {
				message: format!("File {} is empty.", file.name),
			});
		}
		if file.bytes.len() as u64 > limits.max_file_bytes {
			return Err(Error::InvalidRequest {
				message: format!("File {} exceeds {} bytes.", file.name, limits.max_file_bytes),
			});
		}
	}

	Ok(AnswerRequest { question, ..req })
}

fn build_user_prompt(req: &AnswerRequest) -> String {
	let mut lines = Vec::new();

	if let Some(trade) = req.trade.as_deref().filter(|value| !value.trim().is_empty()) {
		lines.push(format!("Trade: {}", trade.trim()));
	}
	if let Some(brand) = req.brand.as_deref().filter(|value| !value.trim().is_empty()) {
		lines.push(format!("Brand: {}", brand.trim()));
	}

	lines.push(format!("Question: {}", req.question));

	lines.join("\n")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn limits() -> lode_config::Limits {
		lode_config::Limits { max_files: 2, max_file_bytes: 16, max_question_chars: 40 }
	}

	fn request() -> AnswerRequest {
		AnswerRequest {
			scope_key: "user-1".to_string(),
			question: "What's the torque spec?".to_string(),
			trade: None,
			brand: None,
			files: Vec::new(),
			share_with_library: false,
		}
	}

	#[test]
	fn missing_question_is_rejected() {
		let req = AnswerRequest { question: "   ".to_string(), ..request() };

		assert!(matches!(
			validate_request(req, &limits()),
			Err(Error::InvalidRequest { .. })
		));
	}

	#[test]
	fn too_many_files_are_rejected() {
		let file = UploadedFile { name: "a.pdf".to_string(), bytes: vec![1] };
		let req = AnswerRequest { files: vec![file.clone(), file.clone(), file], ..request() };

		assert!(matches!(
			validate_request(req, &limits()),
			Err(Error::InvalidRequest { .. })
		));
	}

	#[test]
	fn oversized_file_is_rejected() {
		let file = UploadedFile { name: "a.pdf".to_string(), bytes: vec![0; 17] };
		let req = AnswerRequest { files: vec![file], ..request() };

		assert!(matches!(
			validate_request(req, &limits()),
			Err(Error::InvalidRequest { .. })
		));
	}

	#[test]
	fn user_prompt_folds_in_trade_and_brand() {
		let req = AnswerRequest {
			trade: Some("electrician".to_string()),
			brand: Some("Acme".to_string()),
			..request()
		};

		assert_eq!(
			build_user_prompt(&req),
			"Trade: electrician\nBrand: Acme\nQuestion: What's the torque spec?"
		);
	}
}
