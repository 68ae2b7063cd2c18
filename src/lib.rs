//! # Tally
//!
//! A multi-tenant expense and income tracker, usable both as a standalone
//! binary and as a library.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use tally::server::{AppState, cors_layer, create_router};
//! use tally::store::SqliteStore;
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/tally.db")).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store)));
//! let router = create_router(state, cors_layer(&["http://localhost:5173".to_string()]));
//! // Serve with axum...
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
