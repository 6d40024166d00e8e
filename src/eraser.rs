//! Multi-pass secure erase.
//!
//! Each pass rewinds the file and rewrites its full length, then syncs before
//! the next pass starts. A pass writes every original byte XORed with a fresh
//! random mask byte in `1..=255`, so no byte keeps its original value after
//! any pass. Masks come from a ChaCha-based generator seeded per pass; the
//! previous pass's seed is kept in memory to undo its mask on read-back.
//!
//! Deletion truncates the file, renames it to a random name in the same
//! directory and unlinks it, so the original name does not linger in the
//! directory entry either.
//!
//! Symbolic links are never followed. Only regular files are overwritten.
//!
//! On copy-on-write, log-structured or wear-levelled storage the old blocks
//! may survive an in-place overwrite; nothing here can prevent that.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::RngCore;
use rand::SeedableRng;
use rand::distr::{Alphanumeric, SampleString};
use rand::rngs::StdRng;
use tracing::{debug, trace};
use walkdir::WalkDir;
use zeroize::Zeroizing;

use crate::error::{Error, PathContext, Result};
use crate::types::{CleanOperation, Hooks, Phase, WipeOutcome};

/// Length of the throwaway name used right before unlinking.
const SCRUB_NAME_LEN: usize = 16;

type Seed = Zeroizing<[u8; 32]>;

/// Running byte count for progress across several files.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    processed: u64,
    total: u64,
}

pub struct Eraser {
    chunk_size: usize,
}

impl Eraser {
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size: chunk_size.max(1) }
    }

    /// Runs a prepared [`CleanOperation`].
    ///
    /// # Errors
    ///
    /// See [`Eraser::wipe`].
    pub fn execute(&self, operation: &CleanOperation, hooks: Hooks<'_>) -> Result<()> {
        self.wipe(&operation.target_path, operation.pass_count, operation.delete_after, hooks)
    }

    /// Overwrites `path` `passes` times and, if `delete_after`, removes it.
    ///
    /// # Errors
    ///
    /// - [`Error::WeakParameter`] if `passes` is zero.
    /// - [`Error::Io`] if the path is missing, is not a regular file or
    ///   symlink, is swapped for another file before it is opened, or any
    ///   read, write, sync, rename or unlink fails.
    /// - [`Error::Cancelled`] if the token fires; the file is then left in
    ///   place, possibly partially overwritten.
    pub fn wipe(&self, path: &Path, passes: u32, delete_after: bool, hooks: Hooks<'_>) -> Result<()> {
        check_passes(passes)?;

        let metadata = fs::symlink_metadata(path).at(path)?;
        let mut tally = Tally { processed: 0, total: if metadata.is_file() { planned_bytes(metadata.len(), passes) } else { 0 } };

        self.wipe_entry(path, &metadata, passes, delete_after, hooks, &mut tally)
    }

    /// Wipes every non-directory entry under `dir`.
    ///
    /// Links are not followed. Each entry gets one [`WipeOutcome`]; a failure
    /// is recorded and the walk moves on. Cancellation is recorded as a
    /// [`Error::Cancelled`] outcome for the entry in progress and ends the
    /// batch. Directories themselves are left in place.
    ///
    /// # Errors
    ///
    /// Fails up front with [`Error::WeakParameter`] for zero passes, or
    /// [`Error::Io`] when `dir` is not a directory.
    pub fn wipe_directory(&self, dir: &Path, passes: u32, delete_after: bool, recursive: bool, hooks: Hooks<'_>) -> Result<Vec<WipeOutcome>> {
        check_passes(passes)?;

        if !fs::symlink_metadata(dir).at(dir)?.is_dir() {
            return Err(Error::io(dir, invalid_input("not a directory")));
        }

        let mut walker = WalkDir::new(dir).follow_links(false).min_depth(1).sort_by_file_name();
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut outcomes = Vec::new();
        let mut targets: Vec<(PathBuf, fs::Metadata)> = Vec::new();

        for entry in walker {
            match entry.and_then(|entry| entry.metadata().map(|metadata| (entry, metadata))) {
                Ok((entry, _)) if entry.file_type().is_dir() => {}
                Ok((entry, metadata)) => targets.push((entry.into_path(), metadata)),
                Err(e) => {
                    let path = e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
                    outcomes.push(WipeOutcome { result: Err(Error::io(&path, io::Error::from(e))), path });
                }
            }
        }

        let total = targets.iter().filter(|(_, metadata)| metadata.is_file()).fold(0u64, |sum, (_, metadata)| sum.saturating_add(planned_bytes(metadata.len(), passes)));
        let mut tally = Tally { processed: 0, total };

        debug!(dir = %dir.display(), files = targets.len(), passes, "wiping directory");

        for (path, metadata) in targets {
            let result = self.wipe_entry(&path, &metadata, passes, delete_after, hooks, &mut tally);
            let cancelled = matches!(result, Err(Error::Cancelled));
            outcomes.push(WipeOutcome { path, result });

            if cancelled {
                break;
            }
        }

        Ok(outcomes)
    }

    fn wipe_entry(&self, path: &Path, metadata: &fs::Metadata, passes: u32, delete_after: bool, hooks: Hooks<'_>, tally: &mut Tally) -> Result<()> {
        let file_type = metadata.file_type();

        if file_type.is_symlink() {
            if delete_after {
                debug!(path = %path.display(), "removing symlink without following it");
                fs::remove_file(path).at(path)?;
            }
            return Ok(());
        }

        if !file_type.is_file() {
            return Err(Error::io(path, invalid_input("not a regular file")));
        }

        hooks.checkpoint()?;

        let mut file = OpenOptions::new().read(true).write(true).open(path).at(path)?;
        let opened = file.metadata().at(path)?;
        if !same_file(metadata, &opened) {
            return Err(Error::io(path, io::Error::other("file was replaced after it was checked")));
        }
        let len = opened.len();

        debug!(path = %path.display(), len, passes, "wiping file");

        let mut previous: Option<Seed> = None;
        for pass in 1..=passes {
            trace!(path = %path.display(), pass, passes, "overwrite pass");
            let seed = fresh_seed();
            self.overwrite(&mut file, path, len, previous.as_ref(), &seed, hooks, tally)?;
            previous = Some(seed);
        }

        if delete_after {
            hooks.checkpoint()?;
            file.set_len(0).at(path)?;
            file.sync_all().at(path)?;
            drop(file);
            scrub_and_remove(path)?;
        }

        Ok(())
    }

    /// One pass: every byte becomes `original ^ mask` under `seed`'s masks.
    ///
    /// `previous` is the seed of the pass that produced the current contents;
    /// without it the contents are taken to be the original.
    #[allow(clippy::too_many_arguments)]
    fn overwrite(&self, file: &mut File, path: &Path, len: u64, previous: Option<&Seed>, seed: &Seed, hooks: Hooks<'_>, tally: &mut Tally) -> Result<()> {
        let mut undo = previous.map(|seed| StdRng::from_seed(**seed));
        let mut mask = StdRng::from_seed(**seed);
        let mut buffer = Zeroizing::new(vec![0u8; self.chunk_size]);
        let mut offset = 0u64;

        while offset < len {
            hooks.checkpoint()?;

            let n = usize::try_from(len - offset).map_or(buffer.len(), |r| r.min(buffer.len()));
            let chunk = &mut buffer[..n];

            file.seek(SeekFrom::Start(offset)).at(path)?;
            file.read_exact(chunk).at(path)?;

            if let Some(undo) = undo.as_mut() {
                apply_mask(undo, chunk);
            }
            apply_mask(&mut mask, chunk);

            file.seek(SeekFrom::Start(offset)).at(path)?;
            file.write_all(chunk).at(path)?;

            offset += n as u64;
            tally.processed = tally.processed.saturating_add(n as u64);
            hooks.report(Phase::Wiping, tally.processed, tally.total);
        }

        file.flush().at(path)?;
        file.sync_all().at(path)
    }
}

/// Renames `path` to a random sibling name, then unlinks it.
fn scrub_and_remove(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let scrubbed = parent.join(Alphanumeric.sample_string(&mut rand::rng(), SCRUB_NAME_LEN));
    let target = match fs::rename(path, &scrubbed) {
        Ok(()) => scrubbed,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "rename before unlink failed, removing under original name");
            path.to_path_buf()
        }
    };

    fs::remove_file(&target).at(&target)
}

fn fresh_seed() -> Seed {
    let mut seed = Zeroizing::new([0u8; 32]);
    rand::rng().fill_bytes(&mut seed[..]);
    seed
}

/// XORs each byte with the next mask byte, drawn uniformly from `1..=255`.
fn apply_mask(rng: &mut StdRng, data: &mut [u8]) {
    for byte in data {
        *byte ^= rng.random_range(1..=u8::MAX);
    }
}

/// Bytes a wipe of `len` bytes with `passes` passes will report.
fn planned_bytes(len: u64, passes: u32) -> u64 {
    len.saturating_mul(u64::from(passes))
}

#[cfg(unix)]
fn same_file(checked: &fs::Metadata, opened: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    checked.dev() == opened.dev() && checked.ino() == opened.ino()
}

#[cfg(not(unix))]
fn same_file(_checked: &fs::Metadata, opened: &fs::Metadata) -> bool {
    opened.is_file()
}

fn check_passes(passes: u32) -> Result<()> {
    if passes == 0 {
        return Err(Error::weak("pass count must be at least 1"));
    }
    Ok(())
}

fn invalid_input(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message.to_owned())
}
