/*!
 * Database module for durable client state.
 *
 * This module provides a SQLite-backed key-value store used for:
 * - Persisted translation caches, one document per language and context store
 * - The available language list
 * - The selected interface language
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

// Re-export main types
pub use connection::DatabaseConnection;
pub use models::{StoreLimits, StoreStats};
pub use repository::Repository;
