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
//! Configuration for git-fat
//!
//! All process-wide settings (cache paths, placeholder wire version, block
//! size, transfer remote, verbosity) live in one [`Config`] value that the
//! binary builds at startup and hands to each component.
//!
//! # Sources, in order of precedence (last wins)
//!
//! - Built-in defaults, with paths derived from the git directory
//! - The work tree's `.gitfat` file (git-config syntax, `[rsync]` section)
//! - `GIT_FAT_*` environment variables
//!
//! # Example
//!
//! ```no_run
//! use gitfat_config::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::new().load(Path::new(".git"), Some(Path::new(".")))?;
//! println!("objects live in {}", config.paths.object_dir.display());
//! # Ok::<(), gitfat_config::ConfigError>(())
//! ```

/// Configuration error types
pub mod error;
/// Loading from `.gitfat` and the environment
pub mod loader;
/// Configuration data structures
pub mod schema;
/// Configuration checks run after loading
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use schema::*;
pub use validation::Validator;
