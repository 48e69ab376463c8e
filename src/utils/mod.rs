pub mod config_cache;
pub mod proof;
