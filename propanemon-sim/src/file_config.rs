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

use propanemon_core::ConfigSource;
use std::fs;
use std::io::{Error as IoError, ErrorKind, Read, Result as IoResult};
use std::path::PathBuf;

/// Configuration document kept in a file on the host, standing in for the device's
/// flash filesystem.
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigSource for FileConfigSource {
    type Error = IoError;

    async fn mount(&mut self) -> IoResult<()> {
        // the containing directory plays the part of the mounted volume
        let volume = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if volume.is_dir() {
            Ok(())
        } else {
            Err(IoError::new(
                ErrorKind::NotFound,
                format!("{} is not a directory", volume.display()),
            ))
        }
    }

    async fn document_size(&mut self) -> IoResult<Option<usize>> {
        match fs::metadata(&self.path) {
            Ok(metadata) if metadata.is_file() => Ok(Some(metadata.len() as usize)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn read_document(&mut self, buffer: &mut [u8]) -> IoResult<usize> {
        let mut file = fs::File::open(&self.path)?;
        let mut count = 0;
        while count < buffer.len() {
            match file.read(&mut buffer[count..])? {
                0 => break,
                n => count += n,
            }
        }
        Ok(count)
    }
}
