//! Construction and validation of inner Midea payloads.
//!
//! The outer [`midea_dongle_core::FrameCodec`] only ever sees these as opaque
//! bytes; this module is what gives them meaning for the air conditioner
//! appliance family.

use crate::crc;

/// Inner Midea type ids relevant to the air conditioner core.
pub mod type_id {
    pub const SET_STATUS: u8 = 0x40;
    pub const GET_STATUS: u8 = 0x41;
    pub const STATUS_A0: u8 = 0xA0;
    pub const STATUS_A1: u8 = 0xA1;
    pub const STATUS_C0: u8 = 0xC0;
    pub const STATUS_C1: u8 = 0xC1;
    pub const PROPERTY_SET: u8 = 0xB0;
    pub const PROPERTY_GET: u8 = 0xB1;
    pub const CAPABILITY_REPORT: u8 = 0xB5;
}

/// The one-byte protocol version tag appended to a status query.
const STATUS_QUERY_VERSION: u8 = 0x03;

/// `true` if the trailing byte of `payload` is the correct CRC-8/MAXIM over
/// the rest of it. An empty payload never validates.
pub fn validate(payload: &[u8]) -> bool {
    !payload.is_empty() && crc::validate(payload)
}

/// Writes the CRC-8/MAXIM trailer into the last byte of `payload`.
pub fn finalize(payload: &mut [u8]) {
    crc::finalize(payload)
}

fn framed(type_id: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + body.len() + 1);
    out.push(type_id);
    out.extend_from_slice(body);
    out.push(0);
    finalize(&mut out);
    out
}

/// `0x41` status query, carrying the one-byte protocol version tag the
/// scheduler's outer envelope also reports.
pub fn status_query() -> Vec<u8> {
    framed(type_id::GET_STATUS, &[STATUS_QUERY_VERSION])
}

/// Power-usage query. Reuses the status query's envelope; the appliance
/// replies with the same `0xC1` report either way.
pub fn power_query() -> Vec<u8> {
    framed(type_id::GET_STATUS, &[STATUS_QUERY_VERSION])
}

/// `0xB5` capability query. `continuation` is the non-zero follow-up id
/// reported by a previous capability reply, or `None` for the initial query.
pub fn capability_query(continuation: Option<u8>) -> Vec<u8> {
    match continuation {
        Some(id) => framed(type_id::CAPABILITY_REPORT, &[id]),
        None => framed(type_id::CAPABILITY_REPORT, &[]),
    }
}

/// `0xB1` query for the subset of properties not covered by the fixed-layout
/// status reports (self-clean, silky-cool, breeze-away, ...).
pub fn property_query(uuids: &[u16]) -> Vec<u8> {
    let mut body = Vec::with_capacity(1 + uuids.len() * 2);
    body.push(uuids.len() as u8);
    for uuid in uuids {
        body.extend_from_slice(&uuid.to_le_bytes());
    }
    framed(type_id::PROPERTY_GET, &body)
}

/// Toggles the display LED. `on` selects the requested state.
pub fn light_toggle(on: bool) -> Vec<u8> {
    const UUID_LIGHT: u16 = 0x0224;
    let mut body = Vec::with_capacity(1 + 2 + 1);
    body.push(1);
    body.extend_from_slice(&UUID_LIGHT.to_le_bytes());
    body.push(u8::from(on));
    framed(type_id::PROPERTY_SET, &body)
}

/// Wraps an already-assembled `0x40` set-command body (see
/// [`crate::control::build_set_command`]) with its type byte and CRC.
pub fn set_command(body: &[u8]) -> Vec<u8> {
    framed(type_id::SET_STATUS, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_query_validates() {
        let bytes = status_query();
        assert_eq!(bytes[0], type_id::GET_STATUS);
        assert!(validate(&bytes));
    }

    #[test]
    fn capability_query_without_continuation_has_no_body() {
        let bytes = capability_query(None);
        assert_eq!(bytes.len(), 2); // type + crc
        assert!(validate(&bytes));
    }

    #[test]
    fn capability_query_with_continuation_carries_id() {
        let bytes = capability_query(Some(0x02));
        assert_eq!(bytes[1], 0x02);
        assert!(validate(&bytes));
    }

    #[test]
    fn light_toggle_sets_uuid_and_flag() {
        let bytes = light_toggle(true);
        assert_eq!(bytes[0], type_id::PROPERTY_SET);
        assert_eq!(&bytes[2..4], &0x0224u16.to_le_bytes());
        assert_eq!(bytes[4], 1);
        assert!(validate(&bytes));
    }

    #[test]
    fn empty_payload_never_validates() {
        assert!(!validate(&[]));
    }
}
