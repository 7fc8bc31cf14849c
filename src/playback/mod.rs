// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame timing, frame rate resolution and navigation.

pub mod clock;
pub mod fps;
pub mod navigation;
pub mod presentation;
pub mod source;
