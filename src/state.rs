use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::device::DeviceStore;
use crate::journal::repository::DynPostRepository;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub repo: DynPostRepository,
    pub device: Arc<dyn DeviceStore>,
}
