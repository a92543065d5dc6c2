//! Outer-frame checksum: the byte that makes the full frame's bytes sum to
//! zero mod 256 (negative sum, two's complement style).

/// Computes the checksum byte for `bytes` (header + payload, excluding the checksum slot itself).
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |cs, &b| cs.wrapping_sub(b))
}

/// `true` if `bytes` (header + payload + trailing checksum byte) sums to zero mod 256.
pub fn validate(bytes_with_checksum: &[u8]) -> bool {
    bytes_with_checksum
        .iter()
        .fold(0u8, |sum, &b| sum.wrapping_add(b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_roundtrip_scenario_checksum() {
        // AC, id=1, protocol=0, type=0x41, empty payload; SYNC = LEN^APPLIANCE.
        let frame = [0xAAu8, 0x0A, 0xAC, 0xA6, 0x00, 0x00, 0x01, 0x00, 0x00, 0x41];
        assert_eq!(checksum(&frame), 0xB8);
    }

    #[test]
    fn resync_scenario_checksum_validates() {
        let frame = [
            0xAAu8, 0x0A, 0xAC, 0xA6, 0x00, 0x00, 0x02, 0x00, 0x00, 0x41, 0xB7,
        ];
        assert!(validate(&frame));
    }

    #[test]
    fn checksum_and_validate_agree() {
        let header = [0xAAu8, 0x0A, 0xAC, 0xA6, 0x00, 0x00, 0x05, 0x00, 0x00, 0x41];
        let c = checksum(&header);
        let mut full = header.to_vec();
        full.push(c);
        assert!(validate(&full));
    }
}
