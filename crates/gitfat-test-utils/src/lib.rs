// Copyright (C) 2026  git-fat Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! # git-fat Test Utilities
//!
//! Shared test utilities for git-fat crates providing:
//! - Scratch git repositories driven by the real `git`
//! - CLI command helpers for testing the `git-fat` binary
//! - Assertions over the object cache

pub mod assertions;
pub mod cli;
pub mod repo;

// Re-export commonly used items at crate root
pub use assertions::*;
pub use cli::{gitfat, GitFatCommand};
pub use repo::TestRepo;
