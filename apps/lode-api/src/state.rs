use std::sync::Arc;

use lode_service::LodeService;
use lode_storage::{PgStore, db::Db};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<LodeService>,
}
impl AppState {
	pub async fn new(config: lode_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let store = Arc::new(PgStore::new(db));
		let service = LodeService::new(config, store);

		Ok(Self { service: Arc::new(service) })
	}
}
