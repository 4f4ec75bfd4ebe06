pub mod blob;
pub mod code;
pub mod content_type;
pub mod cursor;
pub mod error;
pub mod fields;
pub mod images;
pub mod repo;
pub mod service;
pub mod update_plan;

#[cfg(test)]
mod service_test;
