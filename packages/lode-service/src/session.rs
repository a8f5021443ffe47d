use std::{
	collections::HashSet,
	time::{Duration as StdDuration, Instant},
};

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, LodeService, Result};
use lode_providers::vector_index::AttachOutcome;
use lode_storage::models::{DocumentHandle, SessionIndex};

const INDEXED_STATUS: &str = "completed";
const TERMINAL_FAILURE_STATUSES: [&str; 2] = ["failed", "cancelled"];

/// Result of attaching a batch to a session index. The index id may differ
/// from the one requested when the index had to be recreated mid-request.
#[derive(Clone, Debug)]
pub struct Attachment {
	pub index_id: String,
	pub indexed_ids: Vec<String>,
}

impl LodeService {
	/// Return the live session index for `scope_key`, creating one when the
	/// stored pointer is missing or older than the configured TTL.
	pub async fn ensure_index_for(
		&self,
		scope_key: &str,
		now: OffsetDateTime,
	) -> Result<String> {
		let ttl = Duration::minutes(self.cfg.session.index_ttl_minutes);

		if let Some(session) = self.store.session(scope_key).await?
			&& now - session.last_used_at < ttl
		{
			self.store
				.upsert_session(&SessionIndex { last_used_at: now, ..session.clone() })
				.await?;

			return Ok(session.index_id);
		}

		self.create_session_index(scope_key, now).await
	}

	/// Attach registered documents to the session index and wait (bounded)
	/// until they are indexed. Items that miss the deadline are excluded
	/// from the returned set rather than failing the request.
	///
	/// If the provider rejects the listing or attachment outright (for
	/// example because the index expired out-of-band), the index is
	/// recreated and the attachment retried exactly once.
	pub async fn attach(
		&self,
		scope_key: &str,
		index_id: &str,
		handles: &[DocumentHandle],
		now: OffsetDateTime,
	) -> Result<Attachment> {
		match self.attach_once(index_id, handles).await {
			Ok(indexed_ids) => {
				self.touch_session(scope_key, index_id, now).await?;

				Ok(Attachment { index_id: index_id.to_string(), indexed_ids })
			},
			Err(err @ (Error::ProviderTransient { .. } | Error::ProviderPermanent { .. })) => {
				tracing::warn!(
					error = %err,
					index_id = %index_id,
					"Attach failed; recreating session index and retrying once."
				);

				let index_id = self.create_session_index(scope_key, now).await?;
				let indexed_ids = self.attach_once(&index_id, handles).await?;

				Ok(Attachment { index_id, indexed_ids })
			},
			Err(err) => Err(err),
		}
	}

	async fn create_session_index(
		&self,
		scope_key: &str,
		now: OffsetDateTime,
	) -> Result<String> {
		let name = format!("session-{scope_key}-{}", Uuid::new_v4().simple());
		let index_id = self
			.providers
			.vector_index
			.create_index(
				&self.cfg.providers.vector_index,
				&name,
				self.cfg.session.index_ttl_hint_days,
			)
			.await?;

		// Last writer wins: a concurrent request may overwrite this pointer,
		// but each caller keeps using the index id it resolved locally.
		self.store
			.upsert_session(&SessionIndex {
				scope_key: scope_key.to_string(),
				index_id: index_id.clone(),
				created_at: now,
				last_used_at: now,
			})
			.await?;

		tracing::info!(scope_key = %scope_key, index_id = %index_id, "Session index created.");

		Ok(index_id)
	}

	async fn touch_session(
		&self,
		scope_key: &str,
		index_id: &str,
		now: OffsetDateTime,
	) -> Result<()> {
		if let Some(session) = self.store.session(scope_key).await?
			&& session.index_id == index_id
		{
			self.store
				.upsert_session(&SessionIndex { last_used_at: now, ..session.clone() })
				.await?;
		}

		Ok(())
	}

	async fn attach_once(
		&self,
		index_id: &str,
		handles: &[DocumentHandle],
	) -> Result<Vec<String>> {
		let cfg = &self.cfg.providers.vector_index;
		let items = self.providers.vector_index.list_items(cfg, index_id).await?;
		let attached: HashSet<&str> = items.iter().map(|item| item.external_id.as_str()).collect();

		for handle in handles {
			if attached.contains(handle.external_id.as_str()) {
				continue;
			}

			match self
				.providers
				.vector_index
				.attach_item(cfg, index_id, &handle.external_id)
				.await?
			{
				AttachOutcome::Attached => {},
				AttachOutcome::AlreadyAttached => {
					tracing::debug!(
						index_id = %index_id,
						external_id = %handle.external_id,
						"Item was already attached."
					);
				},
			}
		}

		let expected: Vec<String> =
			handles.iter().map(|handle| handle.external_id.clone()).collect();

		Ok(self.wait_for_indexing(index_id, &expected).await)
	}

	/// Poll until every expected item reports a terminal indexed status,
	/// bounded by the configured ceiling. Returns the ids that made it;
	/// stragglers are logged and left out so the request can degrade to
	/// best-effort grounding instead of failing on indexing latency.
	pub(crate) async fn wait_for_indexing(
		&self,
		index_id: &str,
		expected: &[String],
	) -> Vec<String> {
		let cfg = &self.cfg.providers.vector_index;
		let poll = StdDuration::from_millis(self.cfg.session.indexing_poll_ms);
		let deadline =
			Instant::now() + StdDuration::from_millis(self.cfg.session.indexing_timeout_ms);
		let mut completed: HashSet<String> = HashSet::new();
		let mut failed: HashSet<String> = HashSet::new();

		loop {
			match self.providers.vector_index.list_items(cfg, index_id).await {
				Ok(items) =>
					for item in items {
						if !expected.contains(&item.external_id) {
							continue;
						}
						if item.status == INDEXED_STATUS {
							completed.insert(item.external_id);
						} else if TERMINAL_FAILURE_STATUSES.contains(&item.status.as_str())
							&& failed.insert(item.external_id.clone())
						{
							tracing::warn!(
								index_id = %index_id,
								external_id = %item.external_id,
								status = %item.status,
								"Item failed to index; excluding it from the scope."
							);
						}
					},
				Err(err) => {
					tracing::warn!(error = %err, index_id = %index_id, "Index status poll failed.");
				},
			}

			let pending: Vec<&String> = expected
				.iter()
				.filter(|id| !completed.contains(*id) && !failed.contains(*id))
				.collect();

			if pending.is_empty() {
				break;
			}
			if Instant::now() >= deadline {
				for id in pending {
					tracing::warn!(
						index_id = %index_id,
						external_id = %id,
						"Item did not index before the deadline; excluding it from the scope."
					);
				}

				break;
			}

			tokio::time::sleep(poll).await;
		}

		expected.iter().filter(|id| completed.contains(*id)).cloned().collect()
	}
}
