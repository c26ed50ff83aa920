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

use defmt::{Debug2Format, trace, warn};
use embedded_hal::digital::OutputPin;
use embedded_io_async::Write;
use propanemon_core::StatusTransport;
use propanemon_messages::{MAX_PAYLOAD_SIZE, frame_publication};

/// Room for the length prefix, the topic and a full status payload
const FRAME_BUFFER_SIZE: usize = MAX_PAYLOAD_SIZE + 128;

/// Sends status publications to the radio gateway over a serial link.
///
/// The alert line is driven high for a publication that carries an alarm so the gateway
/// can forward it without waiting for its own schedule.
pub struct UartGateway<TX, ALERT> {
    tx: TX,
    alert: ALERT,
}

impl<TX, ALERT> UartGateway<TX, ALERT>
where
    TX: Write,
    ALERT: OutputPin,
{
    pub fn new(tx: TX, alert: ALERT) -> Self {
        Self { tx, alert }
    }

    async fn send_frame(&mut self, frame: &[u8]) -> Result<(), TX::Error> {
        self.tx.write_all(frame).await?;
        self.tx.flush().await
    }
}

impl<TX, ALERT> StatusTransport for UartGateway<TX, ALERT>
where
    TX: Write,
    ALERT: OutputPin,
{
    async fn publish(&mut self, topic: &str, payload: &[u8], alarm_raised: bool) {
        let mut buffer = [0u8; FRAME_BUFFER_SIZE];
        let frame_len = match frame_publication(topic, payload, &mut buffer) {
            Ok(len) => len,
            Err(e) => {
                warn!("Unable to frame publication: {}", e);
                return;
            }
        };

        if self.alert.set_state(alarm_raised.into()).is_err() {
            warn!("Unable to drive gateway alert line");
        }

        trace!("Sending {} byte frame to gateway", frame_len);
        if let Err(e) = self.send_frame(&buffer[..frame_len]).await {
            warn!("Gateway write failed: {}", Debug2Format(&e));
        }
    }
}
