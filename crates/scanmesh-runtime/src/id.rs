use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Stable identifier of one scanned surface region across add/update/remove.
///
/// Printed as two 16-digit upper-hex halves joined by `-`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackableId {
    sub_id1: u64,
    sub_id2: u64,
}

/// The classification provider's key for a mesh.
///
/// Same 16-byte layout as [`TrackableId`] (two native-endian `u64` halves in
/// order); the two types differ only in meaning, so converting between them
/// is a byte copy and never changes the value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LegacyMeshId {
    sub_id1: u64,
    sub_id2: u64,
}

macro_rules! id_layout {
    ($ty:ident) => {
        impl $ty {
            #[inline]
            pub const fn new(sub_id1: u64, sub_id2: u64) -> Self {
                Self { sub_id1, sub_id2 }
            }

            #[inline]
            pub const fn sub_id1(self) -> u64 {
                self.sub_id1
            }

            #[inline]
            pub const fn sub_id2(self) -> u64 {
                self.sub_id2
            }

            pub fn to_bytes(self) -> [u8; 16] {
                let mut out = [0u8; 16];
                out[..8].copy_from_slice(&self.sub_id1.to_ne_bytes());
                out[8..].copy_from_slice(&self.sub_id2.to_ne_bytes());
                out
            }

            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                let mut lo = [0u8; 8];
                let mut hi = [0u8; 8];
                lo.copy_from_slice(&bytes[..8]);
                hi.copy_from_slice(&bytes[8..]);
                Self {
                    sub_id1: u64::from_ne_bytes(lo),
                    sub_id2: u64::from_ne_bytes(hi),
                }
            }
        }
    };
}

id_layout!(TrackableId);
id_layout!(LegacyMeshId);

impl From<TrackableId> for LegacyMeshId {
    #[inline]
    fn from(id: TrackableId) -> Self {
        LegacyMeshId::from_bytes(id.to_bytes())
    }
}

impl From<LegacyMeshId> for TrackableId {
    #[inline]
    fn from(id: LegacyMeshId) -> Self {
        TrackableId::from_bytes(id.to_bytes())
    }
}

impl fmt::Display for TrackableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}-{:016X}", self.sub_id1, self.sub_id2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid trackable id `{0}`; expected two hex halves separated by `-`")]
pub struct ParseIdError(pub String);

impl FromStr for TrackableId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseIdError(s.to_string());
        let (a, b) = s.trim().split_once('-').ok_or_else(err)?;
        let half = |h: &str| {
            if h.is_empty() || h.len() > 16 {
                return Err(err());
            }
            u64::from_str_radix(h, 16).map_err(|_| err())
        };
        Ok(TrackableId::new(half(a)?, half(b)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn display_is_fixed_width_upper_hex() {
        let id = TrackableId::new(0xAB, 0x1234_5678_9ABC_DEF0);
        assert_eq!(id.to_string(), "00000000000000AB-123456789ABCDEF0");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!("".parse::<TrackableId>().is_err());
        assert!("1234".parse::<TrackableId>().is_err());
        assert!("-1".parse::<TrackableId>().is_err());
        assert!("xyz-1".parse::<TrackableId>().is_err());
        assert!("00000000000000001-1".parse::<TrackableId>().is_err());
        assert_eq!("a-b".parse::<TrackableId>(), Ok(TrackableId::new(10, 11)));
    }

    proptest! {
        // Legacy conversion keeps every bit of both halves
        #[test]
        fn legacy_roundtrip(a in any::<u64>(), b in any::<u64>()) {
            let id = TrackableId::new(a, b);
            let legacy = LegacyMeshId::from(id);
            prop_assert_eq!(legacy.to_bytes(), id.to_bytes());
            prop_assert_eq!(legacy.sub_id1(), a);
            prop_assert_eq!(legacy.sub_id2(), b);
            prop_assert_eq!(TrackableId::from(legacy), id);
        }

        #[test]
        fn display_parse_roundtrip(a in any::<u64>(), b in any::<u64>()) {
            let id = TrackableId::new(a, b);
            prop_assert_eq!(id.to_string().parse::<TrackableId>(), Ok(id));
        }
    }
}
