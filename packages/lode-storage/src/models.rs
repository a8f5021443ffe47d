use time::OffsetDateTime;

/// A content-addressed pointer into the external registry. Immutable once
/// created; never deleted by this subsystem.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct DocumentHandle {
	pub content_hash: String,
	pub external_id: String,
	pub original_name: String,
	pub size_bytes: i64,
	pub registered_at: OffsetDateTime,
}
impl DocumentHandle {
	/// Human-readable provider-side filename; dedup still keys on the hash.
	pub fn stable_name(&self) -> String {
		stable_name(&self.content_hash, &self.original_name)
	}
}

pub fn stable_name(content_hash: &str, original_name: &str) -> String {
	format!("{content_hash}-{original_name}")
}

/// Per-scope pointer to the live ephemeral index. Overwritten in place;
/// abandoned indexes are left to the provider-side expiry backstop.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct SessionIndex {
	pub scope_key: String,
	pub index_id: String,
	pub created_at: OffsetDateTime,
	pub last_used_at: OffsetDateTime,
}
