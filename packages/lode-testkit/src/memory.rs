use std::{collections::HashMap, sync::Mutex};

use lode_storage::{
	BoxFuture, MetadataStore,
	models::{DocumentHandle, SessionIndex},
};

/// In-memory metadata store so service tests run without Postgres. Same
/// upsert/read-by-key contract as the production store.
#[derive(Default)]
pub struct MemoryStore {
	documents: Mutex<HashMap<String, DocumentHandle>>,
	sessions: Mutex<HashMap<String, SessionIndex>>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}
impl MetadataStore for MemoryStore {
	fn document<'a>(
		&'a self,
		content_hash: &'a str,
	) -> BoxFuture<'a, lode_storage::Result<Option<DocumentHandle>>> {
		let handle = self
			.documents
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.get(content_hash)
			.cloned();

		Box::pin(async move { Ok(handle) })
	}

	fn upsert_document<'a>(
		&'a self,
		handle: &'a DocumentHandle,
	) -> BoxFuture<'a, lode_storage::Result<()>> {
		self.documents
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.insert(handle.content_hash.clone(), handle.clone());

		Box::pin(async move { Ok(()) })
	}

	fn session<'a>(
		&'a self,
		scope_key: &'a str,
	) -> BoxFuture<'a, lode_storage::Result<Option<SessionIndex>>> {
		let session =
			self.sessions.lock().unwrap_or_else(|err| err.into_inner()).get(scope_key).cloned();

		Box::pin(async move { Ok(session) })
	}

	fn upsert_session<'a>(
		&'a self,
		session: &'a SessionIndex,
	) -> BoxFuture<'a, lode_storage::Result<()>> {
		self.sessions
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.insert(session.scope_key.clone(), session.clone());

		Box::pin(async move { Ok(()) })
	}
}
