// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! Subprocess pipelines
//!
//! Chains of git invocations where one stage's output framing differs from
//! the next stage's input framing. Each adaptation runs on exactly one
//! [`bridge`] thread that reads stage A, transforms, writes stage B and then
//! closes B's stdin. The calling thread only ever reads the last stage.
//!
//! Teardown order matters: drain the final output to EOF, join every bridge,
//! and only then [`Stage::finish`] the children. Waiting on a child before its
//! pipe is drained can deadlock on a full pipe buffer.

use crate::error::{FatError, FatResult};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Read size used by [`DiffTreeReader::new`]
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// One running external process.
#[derive(Debug)]
pub struct Stage {
    label: String,
    child: Child,
}

impl Stage {
    /// Spawns `command`; its stderr is inherited so tool diagnostics reach the user.
    pub fn spawn(label: impl Into<String>, command: &mut Command) -> FatResult<Self> {
        let label = label.into();
        debug!("Starting {}", label);
        let child = command
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| FatError::backend(&label, format!("failed to start: {}", e)))?;
        Ok(Self { label, child })
    }

    /// Takes ownership of the child's stdin; it closes when dropped.
    pub fn take_stdin(&mut self) -> FatResult<ChildStdin> {
        self.child
            .stdin
            .take()
            .ok_or_else(|| FatError::backend(&self.label, "stdin is not piped"))
    }

    /// Takes ownership of the child's stdout.
    pub fn take_stdout(&mut self) -> FatResult<ChildStdout> {
        self.child
            .stdout
            .take()
            .ok_or_else(|| FatError::backend(&self.label, "stdout is not piped"))
    }

    /// Waits for the child; a non-zero exit is a [`FatError::BackendUnavailable`].
    pub fn finish(mut self) -> FatResult<()> {
        let status = self
            .child
            .wait()
            .map_err(|e| FatError::backend(&self.label, format!("wait failed: {}", e)))?;
        if status.success() {
            Ok(())
        } else {
            Err(FatError::backend(&self.label, format!("exited with {}", status)))
        }
    }
}

/// A running bridge thread.
#[derive(Debug)]
pub struct Bridge {
    label: String,
    handle: JoinHandle<FatResult<u64>>,
}

impl Bridge {
    /// Waits for the thread and returns what its transform reported.
    pub fn join(self) -> FatResult<u64> {
        self.handle.join().map_err(|_| {
            FatError::InvalidRepositoryState(format!("bridge {} panicked", self.label))
        })?
    }
}

/// Spawns one thread that moves `reader` through `transform` into `writer`.
///
/// The writer is flushed and dropped when the transform returns, which closes
/// the next stage's stdin. A broken pipe means the downstream reader stopped
/// early and counts as normal termination.
pub fn bridge<R, W, F>(label: &str, reader: R, mut writer: W, transform: F) -> FatResult<Bridge>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
    F: FnOnce(R, &mut W) -> FatResult<u64> + Send + 'static,
{
    let thread_label = label.to_string();
    let handle = thread::Builder::new()
        .name(format!("bridge-{}", label))
        .spawn(move || {
            let result = transform(reader, &mut writer).and_then(|n| {
                writer.flush()?;
                Ok(n)
            });
            drop(writer);
            match result {
                Err(e) if e.is_broken_pipe() => {
                    debug!("Bridge {} stopped: downstream closed", thread_label);
                    Ok(0)
                }
                other => other,
            }
        })?;

    Ok(Bridge {
        label: label.to_string(),
        handle,
    })
}

/// Copies `reader` to `writer` line by line, keeping the lines `project` maps
/// to `Some`. Lines are written newline-terminated; returns lines written.
pub fn project_lines<R, W, F>(reader: R, writer: &mut W, mut project: F) -> FatResult<u64>
where
    R: Read,
    W: Write + ?Sized,
    F: FnMut(&[u8]) -> Option<Vec<u8>>,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    let mut written = 0;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let trimmed = line.strip_suffix(b"\n").unwrap_or(&line);
        if let Some(mut projected) = project(trimmed) {
            projected.push(b'\n');
            writer.write_all(&projected)?;
            written += 1;
        }
    }
    Ok(written)
}

/// First whitespace-separated field of a line.
pub fn first_field(line: &[u8]) -> &[u8] {
    line.split(|b| *b == b' ').next().unwrap_or(line)
}

/// One `git diff-tree -z` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffTreeEntry {
    /// Mode on the new side, e.g. `100644`
    pub new_mode: String,
    /// Blob id on the new side
    pub new_blob: String,
    /// Status letter plus optional score, e.g. `M` or `R100`
    pub status: String,
    /// Path on the new side
    pub path: String,
}

/// Incremental parser for NUL-delimited `diff-tree -z` output.
///
/// Records are `:oldmode newmode oldhash newhash status NUL path NUL`; copy
/// and rename records carry a source path before the destination. Bytes may
/// arrive in chunks of any size. Forward-only: once exhausted or failed it
/// yields nothing more.
#[derive(Debug)]
pub struct DiffTreeReader<R> {
    reader: R,
    buffer: Vec<u8>,
    pos: usize,
    chunk_size: usize,
    eof: bool,
    done: bool,
}

impl<R: Read> DiffTreeReader<R> {
    /// Reader with the default chunk size
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// Reader that pulls at most `chunk_size` bytes per read
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            pos: 0,
            chunk_size: chunk_size.max(1),
            eof: false,
            done: false,
        }
    }

    fn next_field(&mut self) -> FatResult<Option<Vec<u8>>> {
        loop {
            if let Some(offset) = self.buffer[self.pos..].iter().position(|b| *b == 0) {
                let field = self.buffer[self.pos..self.pos + offset].to_vec();
                self.pos += offset + 1;
                return Ok(Some(field));
            }

            if self.eof {
                if self.pos < self.buffer.len() {
                    return Err(FatError::InvalidRepositoryState(format!(
                        "diff-tree output ends with {} unterminated bytes",
                        self.buffer.len() - self.pos
                    )));
                }
                return Ok(None);
            }

            self.buffer.drain(..self.pos);
            self.pos = 0;

            let start = self.buffer.len();
            self.buffer.resize(start + self.chunk_size, 0);
            let n = loop {
                match self.reader.read(&mut self.buffer[start..]) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        self.buffer.truncate(start);
                        return Err(e.into());
                    }
                }
            };
            self.buffer.truncate(start + n);
            if n == 0 {
                self.eof = true;
            }
        }
    }

    fn required_field(&mut self, what: &str) -> FatResult<Vec<u8>> {
        self.next_field()?.ok_or_else(|| {
            FatError::InvalidRepositoryState(format!("diff-tree record is missing its {}", what))
        })
    }

    fn next_entry(&mut self) -> FatResult<Option<DiffTreeEntry>> {
        let Some(header) = self.next_field()? else {
            return Ok(None);
        };
        let header = String::from_utf8_lossy(&header).into_owned();

        let fields: Vec<&str> = header
            .strip_prefix(':')
            .map(|h| h.split(' ').collect())
            .unwrap_or_default();
        let [_, new_mode, _, new_blob, status] = fields.as_slice() else {
            return Err(FatError::InvalidRepositoryState(format!(
                "malformed diff-tree header: {:?}",
                header
            )));
        };

        // Copies and renames list the source path first.
        if status.starts_with('C') || status.starts_with('R') {
            self.required_field("source path")?;
        }
        let path = self.required_field("path")?;

        Ok(Some(DiffTreeEntry {
            new_mode: new_mode.to_string(),
            new_blob: new_blob.to_string(),
            status: status.to_string(),
            path: String::from_utf8_lossy(&path).into_owned(),
        }))
    }
}

impl<R: Read> Iterator for DiffTreeReader<R> {
    type Item = FatResult<DiffTreeEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
