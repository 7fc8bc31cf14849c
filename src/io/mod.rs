// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations: ffmpeg decoding, frame rate probing and exports.

pub mod media;
pub mod probe;
pub mod serialization;
