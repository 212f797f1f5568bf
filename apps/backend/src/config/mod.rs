pub mod db;
pub mod engine;

pub use db::{db_url, DbKind};
pub use engine::EngineConfig;
