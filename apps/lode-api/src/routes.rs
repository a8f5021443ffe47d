use axum::{
	Json, Router,
	extract::{DefaultBodyLimit, Multipart, State},
	http::{HeaderMap, StatusCode, header::AUTHORIZATION},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use time::OffsetDateTime;

use crate::state::AppState;
use lode_service::{
	AnswerRequest, AnswerResponse, Error as ServiceError, LibraryFileReport, LibraryIndexListing,
	UploadedFile,
};

const USER_HEADER: &str = "x-user-id";
const BODY_LIMIT_SLACK_BYTES: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
	let limits = &state.service.cfg.limits;
	let body_limit =
		(limits.max_file_bytes as usize) * (limits.max_files as usize) + BODY_LIMIT_SLACK_BYTES;

	Router::new()
		.route("/health", get(health))
		.route("/v1/assistant/ask", post(ask))
		.layer(DefaultBodyLimit::max(body_limit))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	let limits = &state.service.cfg.limits;
	let body_limit =
		(limits.max_file_bytes as usize) * (limits.max_files as usize) + BODY_LIMIT_SLACK_BYTES;

	Router::new()
		.route("/v1/admin/library/ingest", post(library_ingest))
		.route("/v1/admin/library/list", get(library_list))
		.layer(DefaultBodyLimit::max(body_limit))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn ask(
	State(state): State<AppState>,
	headers: HeaderMap,
	multipart: Multipart,
) -> Result<Json<AnswerResponse>, ApiError> {
	require_token(&headers, state.service.cfg.security.api_auth_token.as_deref())?;

	let scope_key = require_user(&headers)?;
	let form = read_ask_form(multipart).await?;
	let request = AnswerRequest {
		scope_key,
		question: form.question,
		trade: form.trade,
		brand: form.brand,
		files: form.files,
		share_with_library: form.share_with_library,
	};
	let response = state.service.answer(request).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct IngestResponse {
	results: Vec<LibraryFileReport>,
}

async fn library_ingest(
	State(state): State<AppState>,
	headers: HeaderMap,
	multipart: Multipart,
) -> Result<Json<IngestResponse>, ApiError> {
	require_token(&headers, state.service.cfg.security.admin_auth_token.as_deref())?;

	let form = read_ask_form(multipart).await?;
	let results =
		state.service.library_ingest(form.files, OffsetDateTime::now_utc()).await?;

	Ok(Json(IngestResponse { results }))
}

#[derive(Debug, Serialize)]
struct LibraryListResponse {
	indexes: Vec<LibraryIndexListing>,
}

async fn library_list(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<LibraryListResponse>, ApiError> {
	require_token(&headers, state.service.cfg.security.admin_auth_token.as_deref())?;

	let indexes = state.service.library_list().await?;

	Ok(Json(LibraryListResponse { indexes }))
}

#[derive(Debug, Default)]
struct AskForm {
	question: String,
	trade: Option<String>,
	brand: Option<String>,
	share_with_library: bool,
	files: Vec<UploadedFile>,
}

async fn read_ask_form(mut multipart: Multipart) -> Result<AskForm, ApiError> {
	let mut form = AskForm::default();

	while let Some(field) = multipart.next_field().await.map_err(|err| {
		json_error(StatusCode::BAD_REQUEST, "invalid_request", err.to_string(), None)
	})? {
		let name = field.name().unwrap_or_default().to_string();

		match name.as_str() {
			"question" => form.question = read_text(field).await?,
			"trade" => form.trade = Some(read_text(field).await?),
			"brand" => form.brand = Some(read_text(field).await?),
			"share_with_library" => {
				form.share_with_library = read_text(field).await?.trim() == "true";
			},
			"files" | "files[]" => {
				let file_name =
					field.file_name().unwrap_or("upload").to_string();
				let bytes = field.bytes().await.map_err(|err| {
					json_error(StatusCode::BAD_REQUEST, "invalid_request", err.to_string(), None)
				})?;

				form.files.push(UploadedFile { name: file_name, bytes: bytes.to_vec() });
			},
			_ => {},
		}
	}

	Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
	field.text().await.map_err(|err| {
		json_error(StatusCode::BAD_REQUEST, "invalid_request", err.to_string(), None)
	})
}

fn require_token(headers: &HeaderMap, expected: Option<&str>) -> Result<(), ApiError> {
	let Some(expected) = expected else {
		return Ok(());
	};
	let presented = headers
		.get(AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.strip_prefix("Bearer "));

	if presented == Some(expected) {
		Ok(())
	} else {
		Err(json_error(
			StatusCode::UNAUTHORIZED,
			"unauthorized",
			"Missing or invalid bearer token.",
			None,
		))
	}
}

fn require_user(headers: &HeaderMap) -> Result<String, ApiError> {
	headers
		.get(USER_HEADER)
		.and_then(|value| value.to_str().ok())
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.map(str::to_string)
		.ok_or_else(|| {
			json_error(
				StatusCode::BAD_REQUEST,
				"invalid_request",
				format!("{USER_HEADER} header is required."),
				Some(vec![USER_HEADER.to_string()]),
			)
		})
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		// User-visible failures never carry raw provider payloads.
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message, None),
			ServiceError::ProviderPermanent { message } => {
				tracing::error!(error = %message, "Provider rejected the request.");

				json_error(
					StatusCode::UNPROCESSABLE_ENTITY,
					"unprocessable",
					"The request could not be processed by the document provider.",
					None,
				)
			},
			ServiceError::ProviderTransient { message } => {
				tracing::error!(error = %message, "Provider temporarily unavailable.");

				json_error(
					StatusCode::SERVICE_UNAVAILABLE,
					"service_unavailable",
					"Service unavailable, please try again.",
					None,
				)
			},
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage failure.");

				json_error(
					StatusCode::SERVICE_UNAVAILABLE,
					"service_unavailable",
					"Service unavailable, please try again.",
					None,
				)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error_code: self.error_code,
			message: self.message,
			fields: self.fields,
		};

		(self.status, Json(body)).into_response()
	}
}
