use crate::{
	BoxFuture, Result,
	db::Db,
	models::{DocumentHandle, SessionIndex},
};

/// Key-value view over the dedup cache and the session pointers.
///
/// Every write is an upsert and every read is by key, so any consistent
/// store satisfies the contract without cross-request locking; concurrent
/// writers are last-writer-wins by design.
pub trait MetadataStore
where
	Self: Send + Sync,
{
	fn document<'a>(
		&'a self,
		content_hash: &'a str,
	) -> BoxFuture<'a, Result<Option<DocumentHandle>>>;

	fn upsert_document<'a>(&'a self, handle: &'a DocumentHandle) -> BoxFuture<'a, Result<()>>;

	fn session<'a>(&'a self, scope_key: &'a str) -> BoxFuture<'a, Result<Option<SessionIndex>>>;

	fn upsert_session<'a>(&'a self, session: &'a SessionIndex) -> BoxFuture<'a, Result<()>>;
}

pub struct PgStore {
	pub db: Db,
}
impl PgStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}
impl MetadataStore for PgStore {
	fn document<'a>(
		&'a self,
		content_hash: &'a str,
	) -> BoxFuture<'a, Result<Option<DocumentHandle>>> {
		Box::pin(async move {
			let handle = sqlx::query_as::<_, DocumentHandle>(
				"\
SELECT content_hash, external_id, original_name, size_bytes, registered_at
FROM document_handles
WHERE content_hash = $1",
			)
			.bind(content_hash)
			.fetch_optional(&self.db.pool)
			.await?;

			Ok(handle)
		})
	}

	fn upsert_document<'a>(&'a self, handle: &'a DocumentHandle) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			sqlx::query(
				"\
INSERT INTO document_handles (content_hash, external_id, original_name, size_bytes, registered_at)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (content_hash) DO UPDATE
SET external_id = EXCLUDED.external_id,
	original_name = EXCLUDED.original_name,
	size_bytes = EXCLUDED.size_bytes,
	registered_at = EXCLUDED.registered_at",
			)
			.bind(&handle.content_hash)
			.bind(&handle.external_id)
			.bind(&handle.original_name)
			.bind(handle.size_bytes)
			.bind(handle.registered_at)
			.execute(&self.db.pool)
			.await?;

			Ok(())
		})
	}

	fn session<'a>(&'a self, scope_key: &'a str) -> BoxFuture<'a, Result<Option<SessionIndex>>> {
		Box::pin(async move {
			let session = sqlx::query_as::<_, SessionIndex>(
				"\
SELECT scope_key, index_id, created_at, last_used_at
FROM session_indexes
WHERE scope_key = $1",
			)
			.bind(scope_key)
			.fetch_optional(&self.db.pool)
			.await?;

			Ok(session)
		})
	}

	fn upsert_session<'a>(&'a self, session: &'a SessionIndex) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			sqlx::query(
				"\
INSERT INTO session_indexes (scope_key, index_id, created_at, last_used_at)
VALUES ($1, $2, $3, $4)
ON CONFLICT (scope_key) DO UPDATE
SET index_id = EXCLUDED.index_id,
	created_at = EXCLUDED.created_at,
	last_used_at = EXCLUDED.last_used_at",
			)
			.bind(&session.scope_key)
			.bind(&session.index_id)
			.bind(session.created_at)
			.bind(session.last_used_at)
			.execute(&self.db.pool)
			.await?;

			Ok(())
		})
	}
}
