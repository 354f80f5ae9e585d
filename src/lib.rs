pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod ingest;
pub mod output;
pub mod service;
pub mod store;
