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

//! In-memory collaborators for exercising the pipeline on the host.

use crate::interface::{ConfigSource, RawReadingSource, StatusTransport};

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFault {
    Mount,
    Read,
}

pub struct MemoryConfigSource {
    document: Option<Vec<u8>>,
    fault: Option<StorageFault>,
    reads: usize,
}

impl MemoryConfigSource {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: Some(document.into().into_bytes()),
            fault: None,
            reads: 0,
        }
    }

    pub fn empty() -> Self {
        Self {
            document: None,
            fault: None,
            reads: 0,
        }
    }

    pub fn with_fault(mut self, fault: StorageFault) -> Self {
        self.fault = Some(fault);
        self
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl ConfigSource for MemoryConfigSource {
    type Error = StorageFault;

    async fn mount(&mut self) -> Result<(), Self::Error> {
        match self.fault {
            Some(StorageFault::Mount) => Err(StorageFault::Mount),
            _ => Ok(()),
        }
    }

    async fn document_size(&mut self) -> Result<Option<usize>, Self::Error> {
        Ok(self.document.as_ref().map(Vec::len))
    }

    async fn read_document(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        self.reads += 1;
        if self.fault == Some(StorageFault::Read) {
            return Err(StorageFault::Read);
        }
        let document = self.document.as_deref().unwrap_or_default();
        let count = document.len().min(buffer.len());
        buffer[..count].copy_from_slice(&document[..count]);
        Ok(count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcTimeout;

pub struct FixedScale {
    reading: Result<f32, AdcTimeout>,
    depth_fault: bool,
}

impl FixedScale {
    pub fn new(raw_reading: f32) -> Self {
        Self {
            reading: Ok(raw_reading),
            depth_fault: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            reading: Err(AdcTimeout),
            depth_fault: false,
        }
    }

    pub fn with_depth_fault(mut self) -> Self {
        self.depth_fault = true;
        self
    }
}

impl RawReadingSource for FixedScale {
    type Error = AdcTimeout;

    async fn read_raw(&mut self) -> Result<f32, Self::Error> {
        self.reading
    }

    fn max_depth_fault(&self) -> bool {
        self.depth_fault
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
    pub alarm_raised: bool,
}

#[derive(Default)]
pub struct RecordingTransport {
    pub published: Vec<Published>,
}

impl StatusTransport for RecordingTransport {
    async fn publish(&mut self, topic: &str, payload: &[u8], alarm_raised: bool) {
        self.published.push(Published {
            topic: topic.into(),
            payload: payload.to_vec(),
            alarm_raised,
        });
    }
}
