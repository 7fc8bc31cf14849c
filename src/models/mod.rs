// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models for boxes, logged entries and project snapshots.

pub mod annotation;
pub mod entry_log;
pub mod project;
