//! Checksums as used by TFRecords: CRC-32C (Castagnoli), with the result
//! permuted by TensorFlow's masking function.

/// A CRC-32C (Castagnoli) checksum after a masking permutation, as stored in
/// TFRecord headers and footers.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct MaskedCrc(pub u32);

// Implementation mirrors `tensorflow/tsl/lib/hash/crc32c.h`.
const CRC_MASK_DELTA: u32 = 0xa282ead8;

impl MaskedCrc {
    /// Computes the masked CRC of the given bytes.
    pub fn compute(bytes: &[u8]) -> Self {
        MaskedCrc(mask(crc::crc32::checksum_castagnoli(bytes)))
    }
}

fn mask(crc: u32) -> u32 {
    crc.rotate_right(15).wrapping_add(CRC_MASK_DELTA)
}

impl std::fmt::Debug for MaskedCrc {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "MaskedCrc({:#010x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_uses_castagnoli() {
        // CRC-32C("123456789") is the well-known check value 0xe3069283.
        assert_eq!(MaskedCrc::compute(b"123456789"), MaskedCrc(mask(0xe3069283)));
    }

    #[test]
    fn test_mask_rotates_and_offsets() {
        assert_eq!(mask(0), CRC_MASK_DELTA);
        assert_eq!(mask(1), (1u32 << 17).wrapping_add(CRC_MASK_DELTA));
    }

    #[test]
    fn test_distinct_payloads_distinct_crcs() {
        assert_ne!(MaskedCrc::compute(b"adam"), MaskedCrc::compute(b"sgd"));
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", MaskedCrc(0xc0ffee)), "MaskedCrc(0x00c0ffee)");
    }
}
