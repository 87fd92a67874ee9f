//! Chord identifiers and the circular identifier space they live in.
use rand::Rng;
use std::fmt::{self, Debug, Display, Formatter};

use crate::{Error, Result};

/// The size of an encoded [Id] in bytes.
pub const ID_SIZE: usize = 8;
/// The widest identifier space supported, `2^64`.
pub const MAX_ID_BITS: u8 = 64;

#[derive(Clone, Copy, PartialEq, Ord, PartialOrd, Eq, Hash)]
/// Position of a node or a key on the ring.
pub struct Id(pub u64);

impl Id {
    /// Random id within the given identifier space.
    pub fn random(space: &IdSpace) -> Id {
        let mut rng = rand::thread_rng();

        Id(rng.gen::<u64>() & space.mask())
    }

    /// Create a new Id from its big-endian encoding. Returns Err if `bytes` is not of length
    /// [ID_SIZE](crate::common::ID_SIZE).
    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Id> {
        let bytes = bytes.as_ref();
        if bytes.len() != ID_SIZE {
            return Err(Error::InvalidIdSize(bytes.len()));
        }

        let mut tmp: [u8; ID_SIZE] = [0; ID_SIZE];
        tmp.copy_from_slice(bytes);

        Ok(Id(u64::from_be_bytes(tmp)))
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_be_bytes().to_vec()
    }
}

impl Debug for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.0)
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Id(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Identifier space of `2^bits` positions arranged in a circle.
pub struct IdSpace {
    bits: u8,
}

impl IdSpace {
    /// Returns Err if `bits` is outside `1..=64`.
    pub fn new(bits: u8) -> Result<Self> {
        if bits == 0 || bits > MAX_ID_BITS {
            return Err(Error::InvalidIdBits(bits));
        }

        Ok(IdSpace { bits })
    }

    /// Number of bits `m`, which is also the number of finger table entries.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Whether `id` fits in this space.
    pub fn contains(&self, id: Id) -> bool {
        id.0 & !self.mask() == 0
    }

    fn mask(&self) -> u64 {
        if self.bits == MAX_ID_BITS {
            u64::MAX
        } else {
            (1 << self.bits) - 1
        }
    }

    /// Hash arbitrary bytes onto the ring.
    ///
    /// The first 8 bytes of the SHA-1 digest, read big-endian, truncated to `bits`.
    pub fn hash<T: AsRef<[u8]>>(&self, value: T) -> Id {
        let digest = sha1_smol::Sha1::from(value.as_ref()).digest().bytes();

        let mut head = [0; ID_SIZE];
        head.copy_from_slice(&digest[..ID_SIZE]);

        Id(u64::from_be_bytes(head) & self.mask())
    }

    /// Start of the `i`-th finger of `id`: `(id + 2^i) mod 2^bits`.
    pub fn finger_start(&self, id: Id, i: u8) -> Id {
        Id(id.0.wrapping_add(1 << i) & self.mask())
    }

    /// Whether `id` is in `(low, high]` walking clockwise.
    ///
    /// When `low == high` the range spans the whole ring.
    pub fn is_in_range(&self, id: Id, low: Id, high: Id) -> bool {
        if low < high {
            id > low && id <= high
        } else {
            id > low || id <= high
        }
    }

    /// Whether `id` is strictly between `low` and `high` walking clockwise.
    ///
    /// When `low == high` the range spans the whole ring except `low` itself.
    pub fn is_between(&self, id: Id, low: Id, high: Id) -> bool {
        if low < high {
            id > low && id < high
        } else if low > high {
            id > low || id < high
        } else {
            id != low
        }
    }
}

impl Default for IdSpace {
    fn default() -> Self {
        IdSpace { bits: MAX_ID_BITS }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn space() -> IdSpace {
        IdSpace::new(6).unwrap()
    }

    #[test]
    fn rejects_invalid_bits() {
        assert!(IdSpace::new(0).is_err());
        assert!(IdSpace::new(65).is_err());
        assert_eq!(IdSpace::new(64).unwrap().bits(), 64);
    }

    #[test]
    fn hash_fits_space() {
        let space = space();

        for value in ["a", "b", "hello", "127.0.0.1:6881"] {
            assert!(space.hash(value).0 < 64);
        }

        assert_eq!(space.hash("hello"), space.hash("hello"));
    }

    #[test]
    fn finger_start_wraps() {
        let space = space();

        assert_eq!(space.finger_start(Id(10), 0), Id(11));
        assert_eq!(space.finger_start(Id(10), 5), Id(42));
        assert_eq!(space.finger_start(Id(50), 4), Id(2));

        let wide = IdSpace::default();
        assert_eq!(wide.finger_start(Id(u64::MAX), 0), Id(0));
        assert_eq!(wide.finger_start(Id(1), 63), Id((1 << 63) + 1));
    }

    #[test]
    fn in_range_half_open() {
        let space = space();

        assert!(space.is_in_range(Id(25), Id(10), Id(30)));
        assert!(space.is_in_range(Id(30), Id(10), Id(30)));
        assert!(!space.is_in_range(Id(10), Id(10), Id(30)));
        assert!(!space.is_in_range(Id(40), Id(10), Id(30)));

        // Wrapping around zero.
        assert!(space.is_in_range(Id(60), Id(50), Id(10)));
        assert!(space.is_in_range(Id(5), Id(50), Id(10)));
        assert!(space.is_in_range(Id(10), Id(50), Id(10)));
        assert!(!space.is_in_range(Id(30), Id(50), Id(10)));

        // Singleton ring owns everything.
        assert!(space.is_in_range(Id(10), Id(10), Id(10)));
        assert!(space.is_in_range(Id(33), Id(10), Id(10)));
    }

    #[test]
    fn between_is_exclusive() {
        let space = space();

        assert!(space.is_between(Id(20), Id(10), Id(30)));
        assert!(!space.is_between(Id(30), Id(10), Id(30)));
        assert!(!space.is_between(Id(10), Id(10), Id(30)));

        assert!(space.is_between(Id(55), Id(50), Id(10)));
        assert!(space.is_between(Id(0), Id(50), Id(10)));
        assert!(!space.is_between(Id(10), Id(50), Id(10)));

        assert!(space.is_between(Id(30), Id(10), Id(10)));
        assert!(!space.is_between(Id(10), Id(10), Id(10)));
    }

    #[test]
    fn bytes_encoding() {
        let id = Id(0x0102_0304_0506_0708);

        assert_eq!(id.to_vec(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(Id::from_bytes(id.to_vec()).unwrap(), id);
        assert!(Id::from_bytes([1, 2, 3]).is_err());
    }
}
