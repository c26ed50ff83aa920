// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

use minicbor::decode::{self, Decoder};
use minicbor::encode::{self, Encoder, Write};
use minicbor::{CborLen, Decode, Encode};

/// Largest encoded status record the transport will carry.
pub const MAX_PAYLOAD_SIZE: usize = 256;

const FIELD_COUNT: u64 = 5;

const KEY_NODE: &str = "n";
const KEY_TANK_NUM: &str = "t";
const KEY_TANK_TYPE: &str = "tT";
const KEY_PERCENT_FULL: &str = "pF";
const KEY_ALARM_FLAGS: &str = "aF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerializationError {
    /// The encoded record does not fit in [`MAX_PAYLOAD_SIZE`], value is the encoded length
    TooLarge(usize),
}

/// One status report, encoded as a CBOR map keyed by the short field names
/// `n`, `t`, `tT`, `pF` and `aF`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusMessage<'a> {
    pub node: &'a str,
    pub tank_num: u16,
    pub tank_type: &'a str,
    pub percent_full: f32,
    pub alarm_flags: u8,
}

impl<C> Encode<C> for StatusMessage<'_> {
    fn encode<W: Write>(
        &self,
        e: &mut Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), encode::Error<W::Error>> {
        e.map(FIELD_COUNT)?
            .str(KEY_NODE)?
            .str(self.node)?
            .str(KEY_TANK_NUM)?
            .u16(self.tank_num)?
            .str(KEY_TANK_TYPE)?
            .str(self.tank_type)?
            .str(KEY_PERCENT_FULL)?
            .f32(self.percent_full)?
            .str(KEY_ALARM_FLAGS)?
            .u8(self.alarm_flags)?;
        Ok(())
    }
}

impl<C> CborLen<C> for StatusMessage<'_> {
    fn cbor_len(&self, ctx: &mut C) -> usize {
        FIELD_COUNT.cbor_len(ctx)
            + KEY_NODE.cbor_len(ctx)
            + self.node.cbor_len(ctx)
            + KEY_TANK_NUM.cbor_len(ctx)
            + self.tank_num.cbor_len(ctx)
            + KEY_TANK_TYPE.cbor_len(ctx)
            + self.tank_type.cbor_len(ctx)
            + KEY_PERCENT_FULL.cbor_len(ctx)
            + self.percent_full.cbor_len(ctx)
            + KEY_ALARM_FLAGS.cbor_len(ctx)
            + self.alarm_flags.cbor_len(ctx)
    }
}

impl<'b, C> Decode<'b, C> for StatusMessage<'b> {
    fn decode(d: &mut Decoder<'b>, _ctx: &mut C) -> Result<Self, decode::Error> {
        let entries = d
            .map()?
            .ok_or_else(|| decode::Error::message("status map must have a definite length"))?;

        let mut node = None;
        let mut tank_num = None;
        let mut tank_type = None;
        let mut percent_full = None;
        let mut alarm_flags = None;

        for _ in 0..entries {
            match d.str()? {
                KEY_NODE => node = Some(d.str()?),
                KEY_TANK_NUM => tank_num = Some(d.u16()?),
                KEY_TANK_TYPE => tank_type = Some(d.str()?),
                KEY_PERCENT_FULL => percent_full = Some(d.f32()?),
                KEY_ALARM_FLAGS => alarm_flags = Some(d.u8()?),
                // newer senders may add fields
                _ => d.skip()?,
            }
        }

        Ok(StatusMessage {
            node: node.ok_or_else(|| decode::Error::message("missing node name"))?,
            tank_num: tank_num.ok_or_else(|| decode::Error::message("missing tank number"))?,
            tank_type: tank_type.ok_or_else(|| decode::Error::message("missing tank type"))?,
            percent_full: percent_full
                .ok_or_else(|| decode::Error::message("missing percent full"))?,
            alarm_flags: alarm_flags.ok_or_else(|| decode::Error::message("missing alarm flags"))?,
        })
    }
}

/// Encoded status record held in a fixed buffer of [`MAX_PAYLOAD_SIZE`] bytes.
#[derive(Debug, Clone)]
pub struct StatusPayload {
    bytes: [u8; MAX_PAYLOAD_SIZE],
    len: usize,
}

impl StatusPayload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Encode a status record for publication.
///
/// # Errors
///
/// - `TooLarge`: the record would need more than [`MAX_PAYLOAD_SIZE`] bytes. Nothing is
///   truncated, the caller decides what to do with an oversized identity.
pub fn build_message(
    site_name: &str,
    tank_num: u16,
    tank_type: &str,
    percent_full: f32,
    alarm_flags: u8,
) -> Result<StatusPayload, SerializationError> {
    let message = StatusMessage {
        node: site_name,
        tank_num,
        tank_type,
        percent_full,
        alarm_flags,
    };

    let encoded_len = minicbor::len(&message);
    if encoded_len > MAX_PAYLOAD_SIZE {
        return Err(SerializationError::TooLarge(encoded_len));
    }

    let mut bytes = [0u8; MAX_PAYLOAD_SIZE];
    minicbor::encode(&message, &mut bytes[..])
        .map_err(|_| SerializationError::TooLarge(encoded_len))?;

    Ok(StatusPayload {
        bytes,
        len: encoded_len,
    })
}

pub fn decode_status_message(bytes: &[u8]) -> Result<StatusMessage<'_>, decode::Error> {
    minicbor::decode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_survives_encode_and_decode() {
        let payload = build_message("cabin", 4, "P", 13.36, 0b010).unwrap();
        let decoded = decode_status_message(payload.as_bytes()).unwrap();

        assert_eq!(
            decoded,
            StatusMessage {
                node: "cabin",
                tank_num: 4,
                tank_type: "P",
                percent_full: 13.36,
                alarm_flags: 0b010,
            }
        );
    }

    #[test]
    fn payload_length_matches_predicted_length() {
        let message = StatusMessage {
            node: "garage",
            tank_num: 300,
            tank_type: "P",
            percent_full: 99.5,
            alarm_flags: 0,
        };
        let payload = build_message("garage", 300, "P", 99.5, 0).unwrap();

        assert_eq!(payload.len(), minicbor::len(&message));
        assert!(!payload.is_empty());
    }

    #[test]
    fn largest_site_name_that_fits_is_accepted() {
        // 23 bytes of fixed overhead plus a two byte string header for the name
        let name = "s".repeat(MAX_PAYLOAD_SIZE - 25);
        let payload = build_message(&name, 4, "P", 50.0, 0).unwrap();
        assert_eq!(payload.len(), MAX_PAYLOAD_SIZE);
    }

    #[test]
    fn oversized_site_name_is_rejected() {
        let name = "s".repeat(MAX_PAYLOAD_SIZE - 24);
        assert_eq!(
            build_message(&name, 4, "P", 50.0, 0).unwrap_err(),
            SerializationError::TooLarge(MAX_PAYLOAD_SIZE + 1)
        );

        let name = "s".repeat(400);
        assert!(matches!(
            build_message(&name, 4, "P", 50.0, 0),
            Err(SerializationError::TooLarge(len)) if len > MAX_PAYLOAD_SIZE
        ));
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let mut buffer = [0u8; 64];
        let mut encoder = Encoder::new(&mut buffer[..]);
        encoder
            .map(6)
            .unwrap()
            .str("v")
            .unwrap()
            .u8(2)
            .unwrap()
            .str(KEY_NODE)
            .unwrap()
            .str("shed")
            .unwrap()
            .str(KEY_TANK_NUM)
            .unwrap()
            .u16(1)
            .unwrap()
            .str(KEY_TANK_TYPE)
            .unwrap()
            .str("P")
            .unwrap()
            .str(KEY_PERCENT_FULL)
            .unwrap()
            .f32(0.0)
            .unwrap()
            .str(KEY_ALARM_FLAGS)
            .unwrap()
            .u8(0b110)
            .unwrap();

        let decoded = decode_status_message(&buffer).unwrap();
        assert_eq!(decoded.node, "shed");
        assert_eq!(decoded.alarm_flags, 0b110);
    }

    #[test]
    fn missing_field_is_rejected() {
        let mut buffer = [0u8; 32];
        let mut encoder = Encoder::new(&mut buffer[..]);
        encoder
            .map(1)
            .unwrap()
            .str(KEY_NODE)
            .unwrap()
            .str("shed")
            .unwrap();

        assert!(decode_status_message(&buffer).is_err());
    }
}
