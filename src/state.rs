use crate::config::Config;
use crate::db::RecordStore;
use crate::registration::RegistrationPipeline;
use crate::storage::AssetStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub records: Arc<dyn RecordStore>,
    pub assets: Arc<dyn AssetStore>,
    pub pipeline: RegistrationPipeline,
}
