pub mod answer;
pub mod content;
pub mod library;
pub mod session;

mod error;

pub use answer::{AnswerMode, AnswerRequest, AnswerResponse, REFUSAL_TEXT, UploadedFile};
pub use content::RegisterAction;
pub use error::{Error, Result};
pub use library::{LibraryFileReport, LibraryIndexListing};

use std::{future::Future, pin::Pin, sync::Arc};

use lode_config::{Config, GenerationProviderConfig, ProviderConfig};
use lode_providers::{
	generation, registry,
	registry::RegistryFile,
	vector_index,
	vector_index::{AttachOutcome, IndexItem},
};
use lode_storage::MetadataStore;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		system_prompt: &'a str,
		user_prompt: &'a str,
		index_ids: &'a [String],
		force_retrieval: bool,
	) -> BoxFuture<'a, lode_providers::Result<String>>;
}

pub trait VectorIndexProvider
where
	Self: Send + Sync,
{
	fn create_index<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		name: &'a str,
		ttl_hint_days: Option<u32>,
	) -> BoxFuture<'a, lode_providers::Result<String>>;

	fn list_items<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		index_id: &'a str,
	) -> BoxFuture<'a, lode_providers::Result<Vec<IndexItem>>>;

	fn attach_item<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		index_id: &'a str,
		external_id: &'a str,
	) -> BoxFuture<'a, lode_providers::Result<AttachOutcome>>;
}

pub trait ContentRegistryProvider
where
	Self: Send + Sync,
{
	fn upload<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		bytes: &'a [u8],
		stable_name: &'a str,
	) -> BoxFuture<'a, lode_providers::Result<String>>;

	fn list_all<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
	) -> BoxFuture<'a, lode_providers::Result<Vec<RegistryFile>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub generation: Arc<dyn GenerationProvider>,
	pub vector_index: Arc<dyn VectorIndexProvider>,
	pub registry: Arc<dyn ContentRegistryProvider>,
}
impl Providers {
	pub fn new(
		generation: Arc<dyn GenerationProvider>,
		vector_index: Arc<dyn VectorIndexProvider>,
		registry: Arc<dyn ContentRegistryProvider>,
	) -> Self {
		Self { generation, vector_index, registry }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { generation: provider.clone(), vector_index: provider.clone(), registry: provider }
	}
}

pub struct LodeService {
	pub cfg: Config,
	pub store: Arc<dyn MetadataStore>,
	pub providers: Providers,
}
impl LodeService {
	pub fn new(cfg: Config, store: Arc<dyn MetadataStore>) -> Self {
		Self { cfg, store, providers: Providers::default() }
	}

	pub fn with_providers(
		cfg: Config,
		store: Arc<dyn MetadataStore>,
		providers: Providers,
	) -> Self {
		Self { cfg, store, providers }
	}
}

struct DefaultProviders;

impl GenerationProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		system_prompt: &'a str,
		user_prompt: &'a str,
		index_ids: &'a [String],
		force_retrieval: bool,
	) -> BoxFuture<'a, lode_providers::Result<String>> {
		Box::pin(generation::generate(cfg, system_prompt, user_prompt, index_ids, force_retrieval))
	}
}

impl VectorIndexProvider for DefaultProviders {
	fn create_index<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		name: &'a str,
		ttl_hint_days: Option<u32>,
	) -> BoxFuture<'a, lode_providers::Result<String>> {
		Box::pin(vector_index::create_index(cfg, name, ttl_hint_days))
	}

	fn list_items<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		index_id: &'a str,
	) -> BoxFuture<'a, lode_providers::Result<Vec<IndexItem>>> {
		Box::pin(vector_index::list_items(cfg, index_id))
	}

	fn attach_item<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		index_id: &'a str,
		external_id: &'a str,
	) -> BoxFuture<'a, lode_providers::Result<AttachOutcome>> {
		Box::pin(vector_index::attach_item(cfg, index_id, external_id))
	}
}

impl ContentRegistryProvider for DefaultProviders {
	fn upload<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		bytes: &'a [u8],
		stable_name: &'a str,
	) -> BoxFuture<'a, lode_providers::Result<String>> {
		Box::pin(registry::upload(cfg, bytes.to_vec(), stable_name))
	}

	fn list_all<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
	) -> BoxFuture<'a, lode_providers::Result<Vec<RegistryFile>>> {
		Box::pin(registry::list_all(cfg))
	}
}
