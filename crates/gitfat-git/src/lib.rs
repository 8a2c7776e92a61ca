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

//! # git-fat core
//!
//! Large files are committed as short placeholder records while their bytes
//! live in a local content-addressed cache that is synchronized with a remote
//! out of band.
//!
//! ## Architecture
//!
//! - **Placeholders** ([`pointer`]): versioned single-line records naming a digest
//! - **Filters** ([`filter`]): streaming clean/smudge over the [`store`]
//! - **Reachability** ([`catalog`]): cache contents versus what history references
//! - **Pipelines** ([`pipeline`]): chained `git` processes joined by bridge threads
//! - **History rewrite** ([`rewrite`]): memoized cleaning of historical blobs
//! - **Transfer** ([`transfer`]): rsync between the cache and the remote
//!
//! git itself is reached only through the [`Backend`] trait.
//!
//! ## Placeholder Format
//!
//! ```text
//! #$# git-fat aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d                    5
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gitfat_git::{Digest, PlaceholderCodec};
//!
//! let codec = PlaceholderCodec::default();
//! let record = codec.encode(&Digest::of(b"hello"), 5);
//! let placeholder = codec.decode(&record)?;
//! assert_eq!(placeholder.size, Some(5));
//! # Ok::<(), gitfat_git::FatError>(())
//! ```

pub mod backend;
pub mod catalog;
pub mod digest;
pub mod error;
pub mod filter;
pub mod find;
pub mod git;
pub mod pipeline;
pub mod pointer;
pub mod rewrite;
pub mod store;
pub mod transfer;
pub mod worktree;

pub use backend::{Backend, BlobTransform, IndexEntry, ObjectInfo, RevScope};
pub use catalog::{ObjectCatalog, Reconciliation, StatusSummary};
pub use digest::{Digest, DigestWriter};
pub use error::{FatError, FatResult};
pub use filter::{CleanOutcome, FilterDriver, InstallOutcome, SmudgeOutcome, FILTER_DRIVER_NAME};
pub use find::{find_large_files, format_large_files, LargeFile};
pub use git::GitBackend;
pub use pipeline::{bridge, Bridge, DiffTreeEntry, DiffTreeReader, Stage};
pub use pointer::{Placeholder, PlaceholderCodec, PlaceholderVersion};
pub use rewrite::{merge_attributes, parse_file_list, IndexFilter, IndexFilterReport, RewriteCache};
pub use store::{Corruption, GcReport, ObjectStore, PublishOutcome, StagedObject};
pub use transfer::{Direction, RsyncTransfer, Transfer};
pub use worktree::{CheckoutReport, PlaceholderFile, WorkTree};
