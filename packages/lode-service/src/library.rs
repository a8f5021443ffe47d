use serde::Serialize;
use time::OffsetDateTime;

use crate::{Error, LodeService, RegisterAction, Result, UploadedFile};
use lode_providers::vector_index::AttachOutcome;
use lode_storage::models::DocumentHandle;

#[derive(Clone, Debug, Serialize)]
pub struct LibraryFileReport {
	pub name: String,
	pub external_id: String,
	pub action: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct LibraryIndexListing {
	pub index_id: String,
	pub items: Vec<LibraryItem>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LibraryItem {
	pub external_id: String,
	pub status: String,
}

impl LodeService {
	/// Explicit, audited opt-in: attach a user's registered documents to
	/// every configured library index. Never called unless the request set
	/// the sharing flag.
	pub async fn share_with_library(
		&self,
		scope_key: &str,
		handles: &[DocumentHandle],
	) -> Result<()> {
		if handles.is_empty() || self.cfg.library.index_ids.is_empty() {
			return Ok(());
		}

		for index_id in &self.cfg.library.index_ids {
			self.attach_to_library_index(index_id, handles).await?;

			for handle in handles {
				tracing::info!(
					scope_key = %scope_key,
					index_id = %index_id,
					stable_name = %handle.stable_name(),
					external_id = %handle.external_id,
					"Document shared into the library by user opt-in."
				);
			}
		}

		Ok(())
	}

	/// Admin ingestion: register each document and attach it to every
	/// configured library index, waiting best-effort for indexing.
	pub async fn library_ingest(
		&self,
		files: Vec<UploadedFile>,
		now: OffsetDateTime,
	) -> Result<Vec<LibraryFileReport>> {
		if files.is_empty() {
			return Err(Error::InvalidRequest { message: "No files provided.".to_string() });
		}
		if self.cfg.library.index_ids.is_empty() {
			return Err(Error::InvalidRequest {
				message: "No library indexes are configured.".to_string(),
			});
		}

		let mut reports = Vec::with_capacity(files.len());

		for file in files {
			let (handle, action) = self.register_or_reuse(&file.bytes, &file.name, now).await?;

			for index_id in &self.cfg.library.index_ids {
				self.attach_to_library_index(index_id, std::slice::from_ref(&handle)).await?;
			}

			if action == RegisterAction::Uploaded {
				tracing::info!(
					external_id = %handle.external_id,
					stable_name = %handle.stable_name(),
					"Document ingested into the library."
				);
			}

			reports.push(LibraryFileReport {
				name: file.name,
				external_id: handle.external_id.clone(),
				action: action.as_str().to_string(),
			});
		}

		Ok(reports)
	}

	pub async fn library_list(&self) -> Result<Vec<LibraryIndexListing>> {
		let cfg = &self.cfg.providers.vector_index;
		let mut listings = Vec::with_capacity(self.cfg.library.index_ids.len());

		for index_id in &self.cfg.library.index_ids {
			let items = self.providers.vector_index.list_items(cfg, index_id).await?;

			listings.push(LibraryIndexListing {
				index_id: index_id.clone(),
				items: items
					.into_iter()
					.map(|item| LibraryItem { external_id: item.external_id, status: item.status })
					.collect(),
			});
		}

		Ok(listings)
	}

	async fn attach_to_library_index(
		&self,
		index_id: &str,
		handles: &[DocumentHandle],
	) -> Result<()> {
		let cfg = &self.cfg.providers.vector_index;

		for handle in handles {
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
						"Item was already in the library index."
					);
				},
			}
		}

		let expected: Vec<String> =
			handles.iter().map(|handle| handle.external_id.clone()).collect();
		let indexed = self.wait_for_indexing(index_id, &expected).await;

		if indexed.len() < expected.len() {
			tracing::warn!(
				index_id = %index_id,
				indexed = indexed.len(),
				expected = expected.len(),
				"Library indexing is still in progress for some items."
			);
		}

		Ok(())
	}
}
