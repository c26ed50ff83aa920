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

use core::fmt::Debug;

/// Persistent storage holding the configuration document.
#[allow(async_fn_in_trait)]
pub trait ConfigSource {
    type Error: Debug;

    /// Make the storage ready for reading.
    async fn mount(&mut self) -> Result<(), Self::Error>;

    /// Size of the stored document in bytes, `None` if no document is stored.
    async fn document_size(&mut self) -> Result<Option<usize>, Self::Error>;

    /// Read the document into `buffer`, which is sized from [`Self::document_size`].
    /// Returns the number of bytes read.
    async fn read_document(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error>;
}

/// The load cell ADC, in raw counts.
#[allow(async_fn_in_trait)]
pub trait RawReadingSource {
    type Error: Debug;

    /// Take this cycle's reading. If the driver averages internally the average is still
    /// treated as one sample.
    async fn read_raw(&mut self) -> Result<f32, Self::Error>;

    /// Whether the driver saw a depth or overload fault while reading.
    fn max_depth_fault(&self) -> bool {
        false
    }
}

/// Outbound link for status records.
///
/// Publishing is fire and forget, delivery problems are the transport's to log.
#[allow(async_fn_in_trait)]
pub trait StatusTransport {
    /// `alarm_raised` is set whenever any alarm bit is set in the payload, a transport may
    /// use it to pick a more urgent delivery.
    async fn publish(&mut self, topic: &str, payload: &[u8], alarm_raised: bool);
}
