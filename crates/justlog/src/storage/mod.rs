//! Storage backend implementations.
//!
//! This module provides concrete implementations of the repository traits
//! defined in `justlog_core::storage`. Both backends share one key layout
//! (see `justlog_core::storage::keys`) and the credential write plans from
//! `justlog_core::credential`.
//!
//! # Feature Flags
//!
//! - `dynamodb` (default): AWS DynamoDB backend using `aws-sdk-dynamodb`
//!
//! The in-memory backend is always available. It emulates the table's
//! conditional and transactional writes and is what the tests run against.

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbRepository;

pub use inmemory::InMemoryRepository;
