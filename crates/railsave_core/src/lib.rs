pub mod container;
pub mod core_api;
pub mod error;
pub mod header;
pub mod layout;
pub mod locator;
pub mod property;
pub mod reader;
pub mod types;
pub mod walker;
