use sha2::{Digest, Sha256};
use shipmap_types::DebugId;

/// Variant nibbles a generated debug ID may carry.
const VARIANTS: [u8; 4] = [0x8, 0x9, 0xa, 0xb];

/// Version nibble forced into every generated debug ID.
const VERSION: u8 = 0x4;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Derives debug IDs from chunk content.
///
/// The first 128 bits of the SHA-256 digest are kept. The version nibble is
/// forced to `4`, and the variant nibble is chosen from [`VARIANTS`] by the
/// ASCII code of the digest's 17th hex digit modulo four.
pub struct DebugIdHasher;

impl DebugIdHasher {
    /// Compute the debug ID for a piece of content.
    pub fn debug_id(content: impl AsRef<[u8]>) -> DebugId {
        let digest = Self::raw_digest(content.as_ref());

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);

        // 13th hex digit.
        bytes[6] = (VERSION << 4) | (digest[6] & 0x0f);

        // 17th hex digit, selected by its own ASCII code.
        let digit = HEX_DIGITS[usize::from(digest[8] >> 4)];
        let variant = VARIANTS[usize::from(digit % 4)];
        bytes[8] = (variant << 4) | (digest[8] & 0x0f);

        DebugId::from_bytes(bytes)
    }

    /// Verify that `content` hashes to `expected`.
    pub fn verify(content: impl AsRef<[u8]>, expected: &DebugId) -> bool {
        Self::debug_id(content) == *expected
    }

    /// Raw SHA-256 digest.
    pub fn raw_digest(data: &[u8]) -> [u8; 32] {
        Sha256::digest(data).into()
    }
}
