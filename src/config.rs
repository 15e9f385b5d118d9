use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::{DEFAULT_K, ID_BITS};
use crate::{Error, Result};

/// Default time a value lookup stays suppressed at a node after it returned.
pub const DEFAULT_VALUE_LOOKUP_COOLDOWN: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Node Configurations
pub struct Config {
    /// K (as in k-bucket) is the maximum number of contacts in a bucket,
    /// and the number of contacts returned by a nearest neighbours query.
    ///
    /// Defaults to [DEFAULT_K]
    pub k: usize,
    /// Number of proximity buckets in the routing table.
    ///
    /// Must be within `1..=160`. Tables with fewer buckets fold every
    /// further shell into their last bucket.
    ///
    /// Defaults to [ID_BITS]
    pub bucket_count: usize,
    /// How long a key stays marked as "in find" at a node after a
    /// value lookup for it returned there.
    ///
    /// Identical lookups arriving within this window are answered with
    /// not found, which is what stops lookups from looping over cycles
    /// of contacts. A window too large to be represented as a point in time
    /// keeps the key suppressed for the lifetime of the node.
    ///
    /// Defaults to [DEFAULT_VALUE_LOOKUP_COOLDOWN]
    pub value_lookup_cooldown: Duration,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::InvalidConfig("k must be at least 1"));
        }
        if self.bucket_count == 0 || self.bucket_count > ID_BITS {
            return Err(Error::InvalidConfig("bucket_count must be within 1..=160"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            bucket_count: ID_BITS,
            value_lookup_cooldown: DEFAULT_VALUE_LOOKUP_COOLDOWN,
        }
    }
}
