#![doc = include_str!("../README.md")]

mod common;
mod config;
mod error;
mod node;
mod store;

pub use crate::common::{Contact, Id, KBucket, RoutingTable, DEFAULT_K, ID_BITS, ID_SIZE};
pub use config::{Config, DEFAULT_VALUE_LOOKUP_COOLDOWN};
pub use error::Error;
pub use node::Node;
pub use store::{Store, StoredValue};

/// Alias for `Result<T, xorkad::Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;
