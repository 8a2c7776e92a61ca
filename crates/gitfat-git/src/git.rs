// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2025 git-fat Contributors

//! [`Backend`] over `git` subprocesses
//!
//! Reachability scans chain `rev-list --objects` into `cat-file --batch-check`,
//! then feed the selected ids to `cat-file --batch`. Each chain adapts framing
//! with a single [`crate::pipeline::bridge`] thread.

use crate::backend::{Backend, BlobTransform, IndexEntry, ObjectInfo, RevScope};
use crate::error::{FatError, FatResult};
use crate::pipeline::{bridge, first_field, project_lines, DiffTreeEntry, DiffTreeReader, Stage};
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs `git` in a fixed directory.
///
/// The directory is the caller's view of the repository: paths reported by
/// `ls-files` are relative to it, and git discovers the repository from it
/// (honouring `GIT_DIR`/`GIT_INDEX_FILE`, as `filter-branch` sets them).
#[derive(Debug, Clone)]
pub struct GitBackend {
    dir: PathBuf,
}

impl GitBackend {
    /// Backend running git in `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn command(&self, args: &[&str]) -> (String, Command) {
        let mut command = Command::new("git");
        command.current_dir(&self.dir).args(args);
        (args.join(" "), command)
    }

    /// Runs git to completion and returns its stdout.
    fn output(&self, args: &[&str]) -> FatResult<Vec<u8>> {
        let (label, mut command) = self.command(args);
        debug!("Running git {}", label);
        let output = command
            .output()
            .map_err(|e| FatError::backend(&label, format!("failed to start: {}", e)))?;
        if !output.status.success() {
            return Err(FatError::backend(
                &label,
                format!(
                    "exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        Ok(output.stdout)
    }

    /// Runs git with `data` on stdin and returns its trimmed stdout.
    fn feed(&self, args: &[&str], data: Vec<u8>) -> FatResult<String> {
        let (label, mut command) = self.command(args);
        let mut stage = Stage::spawn(
            label,
            command.stdin(Stdio::piped()).stdout(Stdio::piped()),
        )?;
        let writer = bridge("feed", io::Cursor::new(data), stage.take_stdin()?, |mut r, w| {
            Ok(io::copy(&mut r, w)?)
        })?;

        let mut out = String::new();
        stage.take_stdout()?.read_to_string(&mut out)?;
        writer.join()?;
        stage.finish()?;
        Ok(out.trim().to_string())
    }

    fn rev_list_objects(&self, scope: &RevScope) -> FatResult<Stage> {
        let scope_args = scope.rev_list_args();
        let mut args = vec!["rev-list", "--objects"];
        args.extend(scope_args.iter().map(String::as_str));
        let (label, mut command) = self.command(&args);
        Stage::spawn(label, command.stdout(Stdio::piped()))
    }

    fn batch_stage(&self, mode: &str) -> FatResult<Stage> {
        let (label, mut command) = self.command(&["cat-file", mode]);
        Stage::spawn(label, command.stdin(Stdio::piped()).stdout(Stdio::piped()))
    }
}

/// Reads one `cat-file --batch` record: header, content, trailing newline.
fn read_batch_record<R: BufRead>(reader: &mut R) -> FatResult<Option<(ObjectInfo, Vec<u8>)>> {
    let mut header = String::new();
    if reader.read_line(&mut header)? == 0 {
        return Ok(None);
    }
    let info = ObjectInfo::parse(header.trim_end()).ok_or_else(|| {
        FatError::InvalidRepositoryState(format!("unexpected cat-file header: {:?}", header.trim_end()))
    })?;

    let mut content = vec![0u8; info.size as usize];
    reader.read_exact(&mut content)?;
    let mut newline = [0u8; 1];
    reader.read_exact(&mut newline)?;
    Ok(Some((info, content)))
}

impl Backend for GitBackend {
    fn resolve_revision(&self, name: &str) -> FatResult<Option<String>> {
        let (label, mut command) = self.command(&["rev-parse", "--verify", "--quiet", name]);
        let output = command
            .stderr(Stdio::null())
            .output()
            .map_err(|e| FatError::backend(&label, format!("failed to start: {}", e)))?;
        if output.status.success() {
            Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
        } else {
            debug!("{} does not resolve", name);
            Ok(None)
        }
    }

    fn list_reachable_objects(
        &self,
        scope: &RevScope,
        visit: &mut dyn FnMut(ObjectInfo) -> FatResult<()>,
    ) -> FatResult<()> {
        let mut rev_list = self.rev_list_objects(scope)?;
        let mut check = self.batch_stage("--batch-check")?;

        let cut = bridge("cut", rev_list.take_stdout()?, check.take_stdin()?, |r, w| {
            project_lines(r, w, |line| Some(first_field(line).to_vec()))
        })?;

        let reader = BufReader::new(check.take_stdout()?);
        let mut visited = Ok(());
        for line in reader.lines() {
            let line = line?;
            if visited.is_err() {
                continue;
            }
            if let Some(info) = ObjectInfo::parse(&line) {
                visited = visit(info);
            }
        }

        cut.join()?;
        rev_list.finish()?;
        check.finish()?;
        visited
    }

    fn read_reachable_blobs(
        &self,
        scope: &RevScope,
        sizes: &[u64],
        visit: &mut dyn FnMut(&ObjectInfo, &[u8]) -> FatResult<()>,
    ) -> FatResult<()> {
        // Two chains, one bridge each: pick candidates by size, then read them.
        let mut candidates = Vec::new();
        self.list_reachable_objects(scope, &mut |info| {
            if info.is_blob() && sizes.contains(&info.size) {
                candidates.push(info.id);
            }
            Ok(())
        })?;
        debug!("{} candidate blobs in {}", candidates.len(), scope);
        if candidates.is_empty() {
            return Ok(());
        }

        let mut batch = self.batch_stage("--batch")?;
        let mut request = candidates.join("\n");
        request.push('\n');
        let feed = bridge(
            "feed",
            io::Cursor::new(request.into_bytes()),
            batch.take_stdin()?,
            |mut r, w| Ok(io::copy(&mut r, w)?),
        )?;

        let mut reader = BufReader::new(batch.take_stdout()?);
        let mut visited = Ok(());
        while let Some((info, content)) = read_batch_record(&mut reader)? {
            if visited.is_ok() {
                visited = visit(&info, &content);
            }
        }

        feed.join()?;
        batch.finish()?;
        visited
    }

    fn read_blob(&self, id: &str) -> FatResult<Vec<u8>> {
        self.output(&["cat-file", "blob", id])
    }

    fn write_blob(&self, data: &[u8]) -> FatResult<String> {
        self.feed(&["hash-object", "-w", "--stdin"], data.to_vec())
    }

    fn transform_blob(&self, id: &str, transform: BlobTransform) -> FatResult<String> {
        let (label, mut command) = self.command(&["cat-file", "blob", id]);
        let mut source = Stage::spawn(label, command.stdout(Stdio::piped()))?;
        let (label, mut command) = self.command(&["hash-object", "-w", "--stdin"]);
        let mut sink = Stage::spawn(label, command.stdin(Stdio::piped()).stdout(Stdio::piped()))?;

        let link = bridge("transform", source.take_stdout()?, sink.take_stdin()?, move |mut r, w| {
            transform(&mut r, w)
        })?;

        let mut out = String::new();
        sink.take_stdout()?.read_to_string(&mut out)?;
        link.join()?;
        source.finish()?;
        sink.finish()?;
        Ok(out.trim().to_string())
    }

    fn list_tracked_paths(&self, patterns: &[String]) -> FatResult<Vec<String>> {
        let mut args = vec!["ls-files", "-z", "--"];
        args.extend(patterns.iter().map(String::as_str));
        let stdout = self.output(&args)?;
        Ok(stdout
            .split(|b| *b == 0)
            .filter(|p| !p.is_empty())
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect())
    }

    fn list_index(&self) -> FatResult<Vec<IndexEntry>> {
        let stdout = self.output(&["ls-files", "-s", "-z"])?;
        stdout
            .split(|b| *b == 0)
            .filter(|r| !r.is_empty())
            .map(|r| {
                let record = String::from_utf8_lossy(r);
                IndexEntry::parse(&record).ok_or_else(|| {
                    FatError::InvalidRepositoryState(format!("unexpected ls-files record: {:?}", record))
                })
            })
            .collect()
    }

    fn update_index(&self, entries: &[IndexEntry]) -> FatResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut data = Vec::new();
        for entry in entries {
            data.extend_from_slice(entry.to_record().as_bytes());
            data.push(0);
        }
        self.feed(&["update-index", "-z", "--index-info"], data)?;
        Ok(())
    }

    fn diff_tree_all(&self, visit: &mut dyn FnMut(DiffTreeEntry) -> FatResult<()>) -> FatResult<()> {
        let (label, mut command) = self.command(&["rev-list", "--all"]);
        let mut rev_list = Stage::spawn(label, command.stdout(Stdio::piped()))?;

        let (label, mut command) = self.command(&[
            "diff-tree",
            "--root",
            "--no-renames",
            "--no-commit-id",
            "--diff-filter=AMCR",
            "-r",
            "--stdin",
            "-z",
        ]);
        let mut diff_tree = Stage::spawn(
            label,
            command
                .stdin(Stdio::from(rev_list.take_stdout()?))
                .stdout(Stdio::piped()),
        )?;

        let mut visited = Ok(());
        for entry in DiffTreeReader::new(diff_tree.take_stdout()?) {
            let entry = entry?;
            if visited.is_ok() {
                visited = visit(entry);
            }
        }

        rev_list.finish()?;
        diff_tree.finish()?;
        visited
    }

    fn checkout_index(&self, path: &str) -> FatResult<()> {
        self.output(&["checkout-index", "--index", "--force", "--", path])?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_read_batch_record() {
        let data = b"aaaa blob 5\nhello\nbbbb blob 0\n\n";
        let mut reader = &data[..];

        let (info, content) = read_batch_record(&mut reader).unwrap().unwrap();
        assert_eq!(info.id, "aaaa");
        assert_eq!(content, b"hello");

        let (info, content) = read_batch_record(&mut reader).unwrap().unwrap();
        assert_eq!(info.size, 0);
        assert!(content.is_empty());

        assert!(read_batch_record(&mut reader).unwrap().is_none());
    }

    #[test]
    fn test_read_batch_record_truncated() {
        let mut reader = &b"aaaa blob 50\nshort"[..];
        assert!(read_batch_record(&mut reader).is_err());
    }
}
