#![cfg_attr(not(test), no_std)]
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

//! Wire formats shared by the tank monitor firmware and host tools.
//!
//! [`status`] holds the compact per-cycle status record, [`link`] the length
//! prefixed framing used to hand a publication to the network gateway.

pub mod link;
pub mod status;

pub use link::{FrameError, Publication, decode_framed_publication, frame_publication};
pub use status::{
    MAX_PAYLOAD_SIZE, SerializationError, StatusMessage, StatusPayload, build_message,
    decode_status_message,
};
