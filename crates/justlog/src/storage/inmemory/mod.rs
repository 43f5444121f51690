//! In-memory storage backend.
//!
//! Stores every record kind in one ordered map keyed by `(uid, sk)`, wrapped
//! in `Arc<RwLock<_>>`. Multi-item commits check every condition before
//! applying any write, under a single write lock, which gives the same
//! all-or-nothing behavior as a DynamoDB transaction.
//!
//! # Example
//!
//! ```rust,ignore
//! use justlog::storage::InMemoryRepository;
//!
//! let repo = InMemoryRepository::new();
//! let key = repo.issue_api_key("u1").await?;
//! ```

mod repository;

pub use repository::{InMemoryRepository, Record};
