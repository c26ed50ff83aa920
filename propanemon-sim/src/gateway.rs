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

use crate::util::hex;
use propanemon_core::StatusTransport;
use propanemon_messages::{decode_framed_publication, decode_status_message, frame_publication};
use std::io::Write;

const FRAME_BUFFER_SIZE: usize = 512;

/// Writes each publication to `sink` framed exactly as the firmware sends it to the
/// gateway, one hex encoded frame per line.
pub struct GatewayTransport<W: Write> {
    sink: W,
    frames_sent: usize,
}

impl<W: Write> GatewayTransport<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            frames_sent: 0,
        }
    }

    pub fn frames_sent(&self) -> usize {
        self.frames_sent
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn log_frame(frame: &[u8]) {
        let Ok((_, publication)) = decode_framed_publication(frame) else {
            log::warn!("Frame does not decode as a publication");
            return;
        };
        match decode_status_message(publication.payload) {
            Ok(message) => log::info!(
                "[{}] node {} tank {}{} at {:.1}% alarm flags {:#04x}",
                publication.topic,
                message.node,
                message.tank_type,
                message.tank_num,
                message.percent_full,
                message.alarm_flags
            ),
            Err(e) => log::warn!("Payload is not a status message: {}", e),
        }
    }
}

impl<W: Write> StatusTransport for GatewayTransport<W> {
    async fn publish(&mut self, topic: &str, payload: &[u8], alarm_raised: bool) {
        let mut buffer = [0u8; FRAME_BUFFER_SIZE];
        let frame_len = match frame_publication(topic, payload, &mut buffer) {
            Ok(len) => len,
            Err(e) => {
                log::error!("Unable to frame publication for {}: {:?}", topic, e);
                return;
            }
        };
        let frame = &buffer[..frame_len];

        if alarm_raised {
            log::warn!("Publishing with alarm raised");
        }
        Self::log_frame(frame);

        if let Err(e) = writeln!(self.sink, "{}", hex(frame)) {
            log::error!("Unable to write frame: {}", e);
            return;
        }
        self.frames_sent += 1;
    }
}
