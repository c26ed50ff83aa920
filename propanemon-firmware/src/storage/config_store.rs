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

use defmt::{debug, trace, warn};
use embedded_storage_async::nor_flash::ReadNorFlash;
use propanemon_core::{
    CONFIG_HEADER_SIZE, ConfigImageError, ConfigSource, read_config_header,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum StoreError {
    FlashReadError,
    BadImage(ConfigImageError),
    NotMounted,
}

/// Configuration image held in a dedicated flash region, see [`propanemon_core::image`].
pub struct FlashConfigStore<F>
where
    F: ReadNorFlash,
{
    flash: F,
    document_len: Option<Option<usize>>,
}

impl<F> FlashConfigStore<F>
where
    F: ReadNorFlash,
{
    pub const fn new(flash: F) -> Self {
        Self {
            flash,
            document_len: None,
        }
    }
}

impl<F> ConfigSource for FlashConfigStore<F>
where
    F: ReadNorFlash,
{
    type Error = StoreError;

    async fn mount(&mut self) -> Result<(), Self::Error> {
        let mut header = [0u8; CONFIG_HEADER_SIZE];
        self.flash.read(0, &mut header).await.map_err(|_| {
            warn!("Unable to read configuration header");
            StoreError::FlashReadError
        })?;

        let document_len = read_config_header(&header).map_err(|e| {
            warn!("Configuration region holds no image: {}", e);
            StoreError::BadImage(e)
        })?;
        debug!(
            "Configuration region mounted, capacity {} bytes, document {} bytes",
            self.flash.capacity(),
            document_len.unwrap_or(0)
        );
        self.document_len = Some(document_len);
        Ok(())
    }

    async fn document_size(&mut self) -> Result<Option<usize>, Self::Error> {
        self.document_len.ok_or(StoreError::NotMounted)
    }

    async fn read_document(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        let document_len = self
            .document_len
            .ok_or(StoreError::NotMounted)?
            .unwrap_or(0)
            .min(buffer.len());

        trace!("Reading {} byte configuration document", document_len);
        self.flash
            .read(CONFIG_HEADER_SIZE as u32, &mut buffer[..document_len])
            .await
            .map_err(|_| StoreError::FlashReadError)?;
        Ok(document_len)
    }
}
