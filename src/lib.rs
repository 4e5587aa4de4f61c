// Library exports for Hatake
// This allows integration tests and external code to use Hatake modules

pub mod config;
pub mod db;
pub mod device;
pub mod error;
pub mod journal;
pub mod routes;
pub mod state;
pub mod storage;
