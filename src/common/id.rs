//! Kademlia node Id or a lookup target
use rand::Rng;
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use crate::{Error, Result};

/// The size of node IDs in bytes.
pub const ID_SIZE: usize = 20;
/// The width of node IDs in bits, and the maximum value of [Id::distance].
pub const MAX_DISTANCE: u8 = ID_SIZE as u8 * 8;

#[derive(Clone, Copy, PartialEq, Ord, PartialOrd, Eq, Hash)]
/// Kademlia node Id or a lookup target
pub struct Id(pub [u8; ID_SIZE]);

impl Id {
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

        let mut tmp: [u8; ID_SIZE] = [0; ID_SIZE];
        tmp[..ID_SIZE].clone_from_slice(&bytes[..ID_SIZE]);

        Ok(Id(tmp))
    }

    /// Simplified XOR distance between this Id and a target Id, used as the
    /// bucket index the target falls into.
    ///
    /// Distance to self is 0
    /// Distance to the furthest Id is 160
    /// Distance to an Id with 5 leading matching bits is 155
    ///
    /// Zero never selects a bucket; callers short-circuit on it before
    /// routing.
    pub fn distance(&self, other: &Id) -> u8 {
        self.xor(other).partition()
    }

    /// Full XOR metric between this Id and a target Id.
    ///
    /// Unlike [Id::distance] this keeps every bit of the XOR result, so two
    /// ids falling in the same bucket can still be ordered by closeness to a
    /// target.
    pub fn xor(&self, other: &Id) -> Distance {
        let mut xor = [0u8; ID_SIZE];

        for (i, byte) in xor.iter_mut().enumerate() {
            *byte = self.0[i] ^ other.0[i];
        }

        Distance(xor)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Id> {
        if s.len() != ID_SIZE * 2 {
            return Err(Error::InvalidIdSize(s.len() / 2));
        }

        let hex = s.as_bytes();
        let mut bytes = [0u8; ID_SIZE];

        for (i, byte) in bytes.iter_mut().enumerate() {
            let high = hex_digit(hex[i * 2], s)?;
            let low = hex_digit(hex[i * 2 + 1], s)?;

            *byte = (high << 4) | low;
        }

        Ok(Id(bytes))
    }
}

fn hex_digit(digit: u8, s: &str) -> Result<u8> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        _ => Err(Error::InvalidIdEncoding(s.to_string())),
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }

        Ok(())
    }
}

impl Debug for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self)
    }
}

/// XOR of two [Id]s, comparable as a big-endian integer; smaller is closer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Distance([u8; ID_SIZE]);

impl Distance {
    /// Returns `true` for the distance of an id to itself.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|byte| *byte == 0)
    }

    /// The bucket index this distance maps to: the index of the most
    /// significant set bit, counted from the least significant end, plus one.
    ///
    /// The zero distance maps to 0, which never selects a bucket.
    pub fn partition(&self) -> u8 {
        for (i, byte) in self.0.iter().enumerate() {
            if *byte != 0 {
                // leading zeros so far + leading zeros of this byte
                let leading_zeros = (i as u32 * 8 + byte.leading_zeros()) as u8;

                return MAX_DISTANCE - leading_zeros;
            }
        }

        0
    }
}

impl Debug for Distance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Distance({:x?})", &self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn id_with_low_byte(byte: u8) -> Id {
        let mut bytes = [0u8; ID_SIZE];
        bytes[ID_SIZE - 1] = byte;
        Id(bytes)
    }

    #[test]
    fn distance_to_self_is_zero() {
        let id = Id::random();

        assert_eq!(id.distance(&id), 0);
        assert!(id.xor(&id).is_zero());
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Id::random();
        let b = Id::random();

        assert_eq!(a.distance(&b), b.distance(&a));
    }

    #[test]
    fn distance_is_the_index_of_the_first_differing_bit() {
        let zero = id_with_low_byte(0);

        assert_eq!(zero.distance(&id_with_low_byte(0b0000_0001)), 1);
        assert_eq!(zero.distance(&id_with_low_byte(0b0000_0010)), 2);
        assert_eq!(zero.distance(&id_with_low_byte(0b1000_0000)), 8);

        let mut high = [0u8; ID_SIZE];
        high[0] = 0x80;
        assert_eq!(zero.distance(&Id(high)), MAX_DISTANCE);

        high[0] = 0x01;
        assert_eq!(zero.distance(&Id(high)), MAX_DISTANCE - 7);
    }

    #[test]
    fn distance_is_always_within_the_id_width() {
        for _ in 0..100 {
            let a = Id::random();
            let b = Id::random();

            assert!(a.distance(&b) <= MAX_DISTANCE);
            assert_eq!(a.distance(&b), a.xor(&b).partition());
        }
    }

    #[test]
    fn xor_orders_by_closeness() {
        let target = id_with_low_byte(0b0000_0011);

        let close = id_with_low_byte(0b0000_0010);
        let far = id_with_low_byte(0b0100_0000);

        assert!(close.xor(&target) < far.xor(&target));
    }

    #[test]
    fn from_bytes_rejects_wrong_width() {
        assert!(matches!(
            Id::from_bytes([0u8; 19]),
            Err(Error::InvalidIdSize(19))
        ));
        assert!(matches!(
            Id::from_bytes([0u8; 21]),
            Err(Error::InvalidIdSize(21))
        ));
        assert!(Id::from_bytes([0u8; 20]).is_ok());
    }

    #[test]
    fn hex_roundtrip() {
        let id = Id::random();
        let parsed = Id::from_str(&id.to_string()).unwrap();

        assert_eq!(parsed, id);
    }

    #[test]
    fn from_str_rejects_bad_input() {
        assert!(matches!(Id::from_str("abcd"), Err(Error::InvalidIdSize(2))));
        assert!(matches!(
            Id::from_str("zz3ce9c14e7a08645677bbd1cfe7d8f956d53256"),
            Err(Error::InvalidIdEncoding(_))
        ));
        assert!(Id::from_str("5a3ce9c14e7a08645677bbd1cfe7d8f956d53256").is_ok());
    }
}
