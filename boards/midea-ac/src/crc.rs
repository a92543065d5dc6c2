//! CRC-8/MAXIM (polynomial `0x31`, reflected, init `0`) over the inner Midea payload.

const POLY: u8 = 0x8C; // 0x31 reflected

fn update(mut crc: u8, byte: u8) -> u8 {
    crc ^= byte;
    for _ in 0..8 {
        crc = if crc & 1 != 0 { (crc >> 1) ^ POLY } else { crc >> 1 };
    }
    crc
}

/// Computes CRC-8/MAXIM over `bytes`.
pub fn crc8_maxim(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |crc, &b| update(crc, b))
}

/// `true` if the trailing byte of `payload` is the correct CRC-8/MAXIM over
/// the rest of it.
pub fn validate(payload: &[u8]) -> bool {
    match payload.split_last() {
        Some((&stored, rest)) => crc8_maxim(rest) == stored,
        None => false,
    }
}

/// Writes the CRC-8/MAXIM of `payload[..len-1]` into `payload[len-1]`.
pub fn finalize(payload: &mut [u8]) {
    if let Some((last, rest)) = payload.split_last_mut() {
        *last = crc8_maxim(rest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_crc_scenario_validates() {
        let body: [u8; 26] = [
            0xC0, 0x00, 0x00, 0x42, 0x7F, 0x7F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x35, 0x35,
            0x19, 0x00, 0x00, 0x00, 0x26, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let crc = crc8_maxim(&body);
        let mut with_crc = body.to_vec();
        with_crc.push(crc);
        assert!(validate(&with_crc));

        for i in 0..with_crc.len() {
            let mut corrupted = with_crc.clone();
            corrupted[i] ^= 0x01;
            assert!(!validate(&corrupted), "flipping byte {i} should invalidate CRC");
        }
    }

    #[test]
    fn finalize_matches_validate() {
        let mut payload = vec![0x41u8, 0x00, 0x00];
        finalize(&mut payload);
        assert!(validate(&payload));
    }
}
