// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! git-fat observability
//!
//! Structured logging for the `git-fat` binary and library crates.
//!
//! - **Multiple Output Formats**: Pretty, JSON, and compact output formats
//! - **Environment-based Filtering**: `RUST_LOG` style directives
//! - **Stderr by default**: stdout belongs to the clean/smudge filters
//!
//! # Example
//!
//! ```ignore
//! use gitfat_observability::{init_tracing, LogFormat};
//!
//! init_tracing(LogFormat::Compact, Some("info"))?;
//! tracing::info!("push complete");
//! ```

pub mod config;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, LogOutput, DEFAULT_LEVEL};
pub use initialization::{init_tracing, init_tracing_with_config};
