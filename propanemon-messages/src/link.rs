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

use minicbor::{CborLen, Decode, Encode};

const PREFIX_BYTE_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// The buffer is too small to hold the length prefix plus the publication, value is the
    /// number of bytes needed
    BufferTooSmall(usize),
    /// The CBOR encoding failed, or the publication is longer than the prefix can express
    EncodingError,
    DecodingError,
}

/// A status payload addressed to a transport topic, as handed to the gateway.
///
/// Encoded as the two item array `[topic, payload]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, CborLen)]
#[cbor(array)]
pub struct Publication<'a> {
    #[b(0)]
    pub topic: &'a str,
    #[b(1)]
    #[cbor(with = "minicbor::bytes")]
    pub payload: &'a [u8],
}

/// Frame a publication for the gateway link: a big-endian u16 length followed by the CBOR
/// encoded `[topic, payload]` pair.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// - `BufferTooSmall`: `buffer` cannot hold the prefix plus the encoded publication
/// - `EncodingError`: the encoding failed or exceeds `u16::MAX` bytes
pub fn frame_publication(
    topic: &str,
    payload: &[u8],
    buffer: &mut [u8],
) -> Result<usize, FrameError> {
    let publication = Publication { topic, payload };
    let encoded_len = minicbor::len(&publication);
    let prefix = u16::try_from(encoded_len).map_err(|_| FrameError::EncodingError)?;

    let frame_len = PREFIX_BYTE_COUNT + encoded_len;
    if buffer.len() < frame_len {
        return Err(FrameError::BufferTooSmall(frame_len));
    }

    buffer[..PREFIX_BYTE_COUNT].copy_from_slice(&prefix.to_be_bytes());
    minicbor::encode(&publication, &mut buffer[PREFIX_BYTE_COUNT..frame_len])
        .map_err(|_| FrameError::EncodingError)?;

    Ok(frame_len)
}

/// Decode one framed publication from the front of `buffer`.
///
/// Returns the number of bytes consumed along with the publication, which borrows from
/// `buffer`. `BufferTooSmall` means more bytes must arrive before the frame is complete.
pub fn decode_framed_publication(buffer: &[u8]) -> Result<(usize, Publication<'_>), FrameError> {
    let Some(prefix) = buffer.get(..PREFIX_BYTE_COUNT) else {
        return Err(FrameError::BufferTooSmall(PREFIX_BYTE_COUNT));
    };
    let encoded_len = u16::from_be_bytes([prefix[0], prefix[1]]) as usize;

    let frame_len = PREFIX_BYTE_COUNT + encoded_len;
    let Some(body) = buffer.get(PREFIX_BYTE_COUNT..frame_len) else {
        return Err(FrameError::BufferTooSmall(frame_len));
    };

    let publication = minicbor::decode(body).map_err(|_| FrameError::DecodingError)?;
    Ok((frame_len, publication))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPIC: &str = "propanemon/data";

    #[test]
    fn framed_publication_decodes_to_same_topic_and_payload() {
        let payload = [0xa5u8, 0x61, 0x6e, 0x00, 0xff];
        let mut buffer = [0u8; 64];

        let written = frame_publication(TOPIC, &payload, &mut buffer).unwrap();
        let (consumed, publication) = decode_framed_publication(&buffer[..written]).unwrap();

        assert_eq!(consumed, written);
        assert_eq!(publication.topic, TOPIC);
        assert_eq!(publication.payload, &payload);
    }

    #[test]
    fn prefix_holds_encoded_length() {
        let mut buffer = [0u8; 64];
        let written = frame_publication(TOPIC, &[1, 2, 3], &mut buffer).unwrap();

        let prefix = u16::from_be_bytes([buffer[0], buffer[1]]) as usize;
        assert_eq!(prefix + PREFIX_BYTE_COUNT, written);
    }

    #[test]
    fn small_buffer_reports_needed_size() {
        let payload = [0u8; 40];
        let mut roomy = [0u8; 128];
        let needed = frame_publication(TOPIC, &payload, &mut roomy).unwrap();

        let mut cramped = [0u8; 16];
        assert_eq!(
            frame_publication(TOPIC, &payload, &mut cramped),
            Err(FrameError::BufferTooSmall(needed))
        );
    }

    #[test]
    fn partial_frame_waits_for_more_bytes() {
        let mut buffer = [0u8; 64];
        let written = frame_publication(TOPIC, &[9; 10], &mut buffer).unwrap();

        assert_eq!(
            decode_framed_publication(&buffer[..1]),
            Err(FrameError::BufferTooSmall(PREFIX_BYTE_COUNT))
        );
        assert_eq!(
            decode_framed_publication(&buffer[..written - 1]),
            Err(FrameError::BufferTooSmall(written))
        );
    }

    #[test]
    fn back_to_back_frames_are_consumed_in_order() {
        let mut buffer = [0u8; 128];
        let first = frame_publication("a", &[1], &mut buffer).unwrap();
        let second = frame_publication("b", &[2, 2], &mut buffer[first..]).unwrap();

        let (consumed, publication) = decode_framed_publication(&buffer).unwrap();
        assert_eq!(consumed, first);
        assert_eq!(publication.topic, "a");

        let (consumed, publication) = decode_framed_publication(&buffer[first..]).unwrap();
        assert_eq!(consumed, second);
        assert_eq!(publication.payload, &[2u8, 2]);
    }

    #[test]
    fn frame_is_prefix_then_topic_and_bytes_array() {
        let mut buffer = [0u8; 16];
        let written = frame_publication("a", &[1], &mut buffer).unwrap();

        // length 5, array(2), text "a", bytes [0x01]
        assert_eq!(&buffer[..written], &[0x00, 0x05, 0x82, 0x61, b'a', 0x41, 0x01]);
    }

    #[test]
    fn garbage_body_is_a_decoding_error() {
        let buffer = [0x00, 0x02, 0xff, 0xff];
        assert_eq!(
            decode_framed_publication(&buffer),
            Err(FrameError::DecodingError)
        );
    }
}
