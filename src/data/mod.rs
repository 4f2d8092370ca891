pub mod column_store;
pub mod export;
pub mod loader;
