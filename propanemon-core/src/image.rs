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

//! Layout of the configuration document as stored on the device flash.
//!
//! ```text
//! | "PMCF" | length (u16 BE) | JSON document ... |
//! ```
//!
//! A length of `0xFFFF` is erased flash and 0 an intentionally empty slot, both read as
//! no document.

use crate::config::MAX_CONFIG_DOCUMENT_SIZE;

pub const CONFIG_IMAGE_MAGIC: [u8; 4] = *b"PMCF";
pub const CONFIG_HEADER_SIZE: usize = CONFIG_IMAGE_MAGIC.len() + 2;

const ERASED_LENGTH: u16 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigImageError {
    /// Header does not start with [`CONFIG_IMAGE_MAGIC`]
    BadMagic,
    /// Document longer than [`MAX_CONFIG_DOCUMENT_SIZE`]
    TooLarge(usize),
    /// Output buffer cannot hold the image, value is the size needed
    BufferTooSmall(usize),
}

/// Parse an image header, returning the document length if one is stored.
pub fn read_config_header(
    header: &[u8; CONFIG_HEADER_SIZE],
) -> Result<Option<usize>, ConfigImageError> {
    if header[..CONFIG_IMAGE_MAGIC.len()] != CONFIG_IMAGE_MAGIC {
        return Err(ConfigImageError::BadMagic);
    }
    match u16::from_be_bytes([header[4], header[5]]) {
        0 | ERASED_LENGTH => Ok(None),
        len => Ok(Some(len as usize)),
    }
}

/// Write header and `document` into `buffer`, returning the image length.
pub fn write_config_image(document: &[u8], buffer: &mut [u8]) -> Result<usize, ConfigImageError> {
    if document.len() > MAX_CONFIG_DOCUMENT_SIZE {
        return Err(ConfigImageError::TooLarge(document.len()));
    }
    let image_len = CONFIG_HEADER_SIZE + document.len();
    if buffer.len() < image_len {
        return Err(ConfigImageError::BufferTooSmall(image_len));
    }

    buffer[..CONFIG_IMAGE_MAGIC.len()].copy_from_slice(&CONFIG_IMAGE_MAGIC);
    buffer[CONFIG_IMAGE_MAGIC.len()..CONFIG_HEADER_SIZE]
        .copy_from_slice(&(document.len() as u16).to_be_bytes());
    buffer[CONFIG_HEADER_SIZE..image_len].copy_from_slice(document);
    Ok(image_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_configuration;

    fn header(image: &[u8]) -> [u8; CONFIG_HEADER_SIZE] {
        image[..CONFIG_HEADER_SIZE].try_into().unwrap()
    }

    #[test]
    fn image_holds_document_after_header() {
        let document = br#"{"site": {"sitename": "cabin"}}"#;
        let mut buffer = [0xFFu8; 64];
        let len = write_config_image(document, &mut buffer).unwrap();

        assert_eq!(len, CONFIG_HEADER_SIZE + document.len());
        assert_eq!(&buffer[..4], b"PMCF");
        assert_eq!(read_config_header(&header(&buffer)), Ok(Some(document.len())));

        let config = parse_configuration(&buffer[CONFIG_HEADER_SIZE..len]).unwrap();
        assert_eq!(config.site.site_name.as_str(), "cabin");
    }

    #[test]
    fn erased_or_empty_slot_has_no_document() {
        assert_eq!(read_config_header(b"PMCF\xFF\xFF"), Ok(None));
        assert_eq!(read_config_header(b"PMCF\x00\x00"), Ok(None));
    }

    #[test]
    fn foreign_data_is_rejected() {
        assert_eq!(
            read_config_header(&[0xFF; CONFIG_HEADER_SIZE]),
            Err(ConfigImageError::BadMagic)
        );
        assert_eq!(read_config_header(b"PMCX\x00\x10"), Err(ConfigImageError::BadMagic));
    }

    #[test]
    fn oversized_document_is_refused() {
        let document = [b' '; MAX_CONFIG_DOCUMENT_SIZE + 1];
        let mut buffer = [0u8; 1024];
        assert_eq!(
            write_config_image(&document, &mut buffer),
            Err(ConfigImageError::TooLarge(MAX_CONFIG_DOCUMENT_SIZE + 1))
        );
    }

    #[test]
    fn short_buffer_reports_needed_size() {
        let mut buffer = [0u8; 8];
        assert_eq!(
            write_config_image(b"{\"site\":{}}", &mut buffer),
            Err(ConfigImageError::BufferTooSmall(CONFIG_HEADER_SIZE + 11))
        );
    }
}
