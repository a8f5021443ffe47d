pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider temporarily unavailable: {message}")]
	ProviderTransient { message: String },
	#[error("Provider error: {message}")]
	ProviderPermanent { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::ProviderTransient { .. })
	}
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
impl From<lode_storage::Error> for Error {
	fn from(err: lode_storage::Error) -> Self {
		match err {
			lode_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			lode_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
		}
	}
}
impl From<lode_providers::Error> for Error {
	fn from(err: lode_providers::Error) -> Self {
		if err.is_transient() {
			Self::ProviderTransient { message: err.to_string() }
		} else {
			Self::ProviderPermanent { message: err.to_string() }
		}
	}
}
