use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Length of the canonical dashed form.
pub const DEBUG_ID_LEN: usize = 36;

/// Byte offsets of the dashes in the canonical form.
const DASHES: [usize; 4] = [8, 13, 18, 23];

/// Content-derived identifier that ties a chunk to its source map.
///
/// The canonical form is 36 characters of lowercase hex in 8-4-4-4-12 groups.
/// Debug IDs produced by shipmap always carry version nibble `4` and a variant
/// nibble from `{8, 9, a, b}`, but any well-formed id is accepted on parse so
/// that chunks marked by other tools still round-trip.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DebugId([u8; 16]);

impl DebugId {
    /// Create a `DebugId` from raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// The raw 16 bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Parse the canonical dashed form. Hex digits may be upper or lower case.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.len() != DEBUG_ID_LEN || !s.is_ascii() {
            return Err(TypeError::InvalidDebugId(s.to_string()));
        }
        let raw = s.as_bytes();
        if DASHES.iter().any(|&i| raw[i] != b'-') {
            return Err(TypeError::InvalidDebugId(s.to_string()));
        }
        let digits: String = s.chars().filter(|c| *c != '-').collect();
        if digits.len() != 32 {
            return Err(TypeError::InvalidDebugId(s.to_string()));
        }
        let bytes = hex::decode(&digits).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let mut arr = [0u8; 16];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The version nibble (third group, first digit).
    pub fn version(&self) -> u8 {
        self.0[6] >> 4
    }

    /// The variant nibble (fourth group, first digit).
    pub fn variant(&self) -> u8 {
        self.0[8] >> 4
    }
}

impl fmt::Display for DebugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = hex::encode(self.0);
        write!(
            f,
            "{}-{}-{}-{}-{}",
            &h[0..8],
            &h[8..12],
            &h[12..16],
            &h[16..20],
            &h[20..32]
        )
    }
}

impl fmt::Debug for DebugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DebugId({self})")
    }
}

impl FromStr for DebugId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DebugId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DebugId> for String {
    fn from(id: DebugId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SAMPLE: &str = "c315b2d7-ef4b-4a2b-8e78-3c2d43264d99";

    #[test]
    fn parse_and_display_round_trip() {
        let id = DebugId::parse(SAMPLE).unwrap();
        assert_eq!(id.to_string(), SAMPLE);
        assert_eq!(id.to_string().len(), DEBUG_ID_LEN);
    }

    #[test]
    fn parse_normalizes_uppercase() {
        let id = DebugId::parse(&SAMPLE.to_uppercase()).unwrap();
        assert_eq!(id.to_string(), SAMPLE);
    }

    #[test]
    fn version_and_variant_nibbles() {
        let id = DebugId::parse(SAMPLE).unwrap();
        assert_eq!(id.version(), 4);
        assert_eq!(id.variant(), 8);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(DebugId::parse("c315b2d7-ef4b-4a2b-8e78").is_err());
        assert!(DebugId::parse("").is_err());
    }

    #[test]
    fn rejects_misplaced_dashes() {
        assert!(DebugId::parse("c315b2d7e-f4b-4a2b-8e78-3c2d43264d99").is_err());
        assert!(DebugId::parse("c315b2d7-ef4b-4a2b-8e783c2d43264d99-").is_err());
    }

    #[test]
    fn rejects_non_hex() {
        let err = DebugId::parse("g315b2d7-ef4b-4a2b-8e78-3c2d43264d99").unwrap_err();
        assert!(matches!(err, TypeError::InvalidHex(_)));
    }

    #[test]
    fn serde_uses_canonical_string() {
        let id = DebugId::parse(SAMPLE).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{SAMPLE}\""));
        let back: DebugId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<DebugId>("\"nope\"").is_err());
    }

    proptest! {
        #[test]
        fn any_bytes_format_to_parseable_form(bytes in any::<[u8; 16]>()) {
            let id = DebugId::from_bytes(bytes);
            let text = id.to_string();
            prop_assert_eq!(text.len(), DEBUG_ID_LEN);
            prop_assert_eq!(DebugId::parse(&text).unwrap(), id);
        }
    }
}
