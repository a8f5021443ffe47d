use time::OffsetDateTime;

use crate::{LodeService, Result};
use lode_storage::models::{DocumentHandle, stable_name};

const HASH_CHUNK_BYTES: usize = 64 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterAction {
	Uploaded,
	Reused,
}
impl RegisterAction {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Uploaded => "uploaded",
			Self::Reused => "reused",
		}
	}
}

impl LodeService {
	/// Register document content with the external registry, or reuse the
	/// previously minted handle for byte-identical content.
	///
	/// Lookup order: dedup cache by content hash, then the authoritative
	/// provider listing, then upload. The cache row is only written after a
	/// confirmed external id.
	pub async fn register_or_reuse(
		&self,
		bytes: &[u8],
		display_name: &str,
		now: OffsetDateTime,
	) -> Result<(DocumentHandle, RegisterAction)> {
		let content_hash = content_hash(bytes);

		if let Some(handle) = self.store.document(&content_hash).await? {
			tracing::debug!(content_hash = %content_hash, "Document handle reused from cache.");

			return Ok((handle, RegisterAction::Reused));
		}

		let stable = stable_name(&content_hash, display_name);
		let listed = self.providers.registry.list_all(&self.cfg.providers.registry).await?;
		// Identical bytes under a different display name still dedup on the
		// hash prefix of the listed stable name.
		let existing = listed
			.into_iter()
			.find(|file| file.name.starts_with(&content_hash) || file.name == stable);

		let (external_id, action) = match existing {
			Some(file) => {
				tracing::debug!(
					content_hash = %content_hash,
					external_id = %file.external_id,
					"Document handle reused from provider listing."
				);

				(file.external_id, RegisterAction::Reused)
			},
			None => {
				let external_id = self
					.providers
					.registry
					.upload(&self.cfg.providers.registry, bytes, &stable)
					.await?;

				tracing::info!(
					content_hash = %content_hash,
					external_id = %external_id,
					size_bytes = bytes.len(),
					"Document registered with content registry."
				);

				(external_id, RegisterAction::Uploaded)
			},
		};
		let handle = DocumentHandle {
			content_hash,
			external_id,
			original_name: display_name.to_string(),
			size_bytes: bytes.len() as i64,
			registered_at: now,
		};

		self.store.upsert_document(&handle).await?;

		Ok((handle, action))
	}
}

/// Streaming-safe content hash: feed the hasher bounded chunks instead of
/// requiring one contiguous pass.
pub fn content_hash(bytes: &[u8]) -> String {
	let mut hasher = blake3::Hasher::new();

	for chunk in bytes.chunks(HASH_CHUNK_BYTES) {
		hasher.update(chunk);
	}

	hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hash_is_stable_across_chunking() {
		let small = content_hash(b"hello");
		let large_input = vec![7_u8; HASH_CHUNK_BYTES * 3 + 11];
		let large = content_hash(&large_input);

		assert_eq!(small, content_hash(b"hello"));
		assert_eq!(large, content_hash(&large_input));
		assert_ne!(small, large);
	}

	#[test]
	fn stable_name_combines_hash_and_display_name() {
		let hash = content_hash(b"hello");

		assert_eq!(stable_name(&hash, "manual.pdf"), format!("{hash}-manual.pdf"));
	}
}
