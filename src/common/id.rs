//! Kademlia node Id or a lookup target
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha1_smol::Sha1;
use std::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

use crate::{Error, Result};

/// The size of node IDs in bytes.
pub const ID_SIZE: usize = 20;
/// The size of node IDs in bits, which is also the number of proximity buckets.
pub const ID_BITS: usize = ID_SIZE * 8;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
/// Kademlia node Id or a lookup target.
///
/// Stored big-endian, so comparing two Ids compares their numeric values.
pub struct Id([u8; ID_SIZE]);

impl Id {
    /// Derive an Id from an arbitrary name, as the SHA-1 digest of its bytes.
    pub fn from_name(name: &str) -> Id {
        let mut hasher = Sha1::new();
        hasher.update(name.as_bytes());

        Id(hasher.digest().bytes())
    }

    pub fn random() -> Id {
        let mut rng = rand::thread_rng();
        let random_bytes: [u8; ID_SIZE] = rng.gen();

        Id(random_bytes)
    }

    /// Create a new Id from some bytes. Returns Err if `bytes` is not of length
    /// [ID_SIZE].
    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Id> {
        let bytes = bytes.as_ref();
        if bytes.len() != ID_SIZE {
            return Err(Error::InvalidIdSize(bytes.len()));
        }

        let mut tmp: [u8; ID_SIZE] = [0_u8; ID_SIZE];
        tmp.copy_from_slice(bytes);

        Ok(Id(tmp))
    }

    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }

    /// XOR distance between this Id and `other`, as another Id.
    ///
    /// Distances are only ever compared, so the returned Id is ordered
    /// like the unsigned 160 bits integer it represents.
    pub fn xor(&self, other: &Id) -> Id {
        let mut result = [0_u8; ID_SIZE];

        for (i, (a, b)) in self.0.iter().zip(other.0.iter()).enumerate() {
            result[i] = a ^ b;
        }

        Id(result)
    }

    /// Position of the most significant set bit of the distance to `other`.
    ///
    /// Distance to self is 0
    /// Distance to an Id differing in the first bit is 159
    /// Distance to an Id differing only in the last bit is 0 as well
    pub fn bucket_index(&self, other: &Id) -> usize {
        for i in 0..ID_SIZE {
            let x = self.0[i] ^ other.0[i];

            if x != 0 {
                // leading zeros so far + leading zeros of this byte
                let leading_zeros = i * 8 + x.leading_zeros() as usize;

                return ID_BITS - 1 - leading_zeros;
            }
        }

        0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Debug for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self)
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Id> {
        let bytes = hex::decode(s).map_err(|_| Error::InvalidIdEncoding(s.to_string()))?;

        Id::from_bytes(bytes).map_err(|_| Error::InvalidIdEncoding(s.to_string()))
    }
}

impl From<[u8; ID_SIZE]> for Id {
    fn from(bytes: [u8; ID_SIZE]) -> Id {
        Id(bytes)
    }
}
