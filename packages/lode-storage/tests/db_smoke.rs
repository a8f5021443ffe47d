use time::OffsetDateTime;

use lode_config::Postgres;
use lode_storage::{
	MetadataStore, PgStore,
	db::Db,
	models::{DocumentHandle, SessionIndex},
};
use lode_testkit::TestDatabase;

#[tokio::test]
#[ignore = "Requires external Postgres. Set LODE_PG_DSN to run."]
async fn schema_bootstraps_and_upserts_round_trip() {
	let Some(base_dsn) = lode_testkit::env_dsn() else {
		eprintln!("Skipping schema_bootstraps_and_upserts_round_trip; set LODE_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");
	// Running the bootstrap twice must be a no-op.
	db.ensure_schema().await.expect("Failed to re-run schema bootstrap.");

	let store = PgStore::new(db);
	let now = OffsetDateTime::now_utc();
	let handle = DocumentHandle {
		content_hash: "abc123".to_string(),
		external_id: "file_1".to_string(),
		original_name: "manual.pdf".to_string(),
		size_bytes: 42,
		registered_at: now,
	};

	assert!(store.document("abc123").await.expect("Document read failed.").is_none());

	store.upsert_document(&handle).await.expect("Document upsert failed.");

	let fetched = store
		.document("abc123")
		.await
		.expect("Document read failed.")
		.expect("Expected a document handle.");

	assert_eq!(fetched.external_id, "file_1");
	assert_eq!(fetched.stable_name(), "abc123-manual.pdf");

	// Upserts are idempotent: repeating the write must not conflict.
	store.upsert_document(&handle).await.expect("Repeated document upsert failed.");

	let session = SessionIndex {
		scope_key: "user-1".to_string(),
		index_id: "vs_1".to_string(),
		created_at: now,
		last_used_at: now,
	};

	store.upsert_session(&session).await.expect("Session upsert failed.");

	let replacement = SessionIndex { index_id: "vs_2".to_string(), ..session.clone() };

	store.upsert_session(&replacement).await.expect("Session overwrite failed.");

	let fetched = store
		.session("user-1")
		.await
		.expect("Session read failed.")
		.expect("Expected a session pointer.");

	assert_eq!(fetched.index_id, "vs_2");

	test_db.cleanup().await.expect("Failed to clean up test database.");
}
