//! tar archiver
//!
//! A requested file is stored under its base name. A requested directory is
//! stored under its base name together with its whole subtree, and the
//! directory entry itself counts as one folder. Children are visited in
//! sorted order so the same tree always produces the same stream.

use std::fs::{self, File, Metadata};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use qbak_core::{ArchiveCounts, QbakError, QbakResult};
use tracing::{info, warn};

use crate::fmt::fmt_bytes;
use crate::Archiver;

/// Archiver backed by the POSIX ustar/GNU format.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarArchiver;

impl Archiver for TarArchiver {
    fn archive(&self, paths: &[PathBuf], out: &mut dyn Write) -> QbakResult<ArchiveCounts> {
        let mut builder = tar::Builder::new(out);
        builder.follow_symlinks(false);
        let mut counts = ArchiveCounts::default();

        for path in paths {
            let path = clean(path);
            // Roots follow symlinks, children inside a tree do not.
            let meta = fs::metadata(&path)?;
            let name = archive_name(&path)?;
            append_tree(&mut builder, &path, &name, &meta, &mut counts)?;
        }

        builder.into_inner()?;
        Ok(counts)
    }

    fn extract(&self, input: &mut dyn Read, dest: &Path) -> QbakResult<ArchiveCounts> {
        fs::create_dir_all(dest)?;
        let mut archive = tar::Archive::new(input);
        let mut counts = ArchiveCounts::default();

        for entry in archive.entries()? {
            let mut entry = entry?;
            let name = entry.path()?.into_owned();
            let is_dir = entry.header().entry_type().is_dir();
            let size = entry.size();

            if !entry.unpack_in(dest)? {
                warn!(entry = %name.display(), "skipping entry outside destination");
                continue;
            }

            if is_dir {
                counts.folders += 1;
                info!("+ {}", name.display());
            } else {
                counts.files += 1;
                info!("+ [{}] {}", fmt_bytes(size), name.display());
            }
        }

        Ok(counts)
    }
}

fn append_tree<W: Write>(
    builder: &mut tar::Builder<W>,
    disk: &Path,
    name: &Path,
    meta: &Metadata,
    counts: &mut ArchiveCounts,
) -> QbakResult<()> {
    if meta.is_dir() {
        builder.append_dir(name, disk)?;
        counts.folders += 1;
        info!("+ {}", name.display());

        let mut children = fs::read_dir(disk)?.collect::<Result<Vec<_>, _>>()?;
        children.sort_by_key(|e| e.file_name());
        for child in children {
            let child_meta = child.metadata()?;
            append_tree(
                builder,
                &child.path(),
                &name.join(child.file_name()),
                &child_meta,
                counts,
            )?;
        }
        return Ok(());
    }

    if meta.is_file() {
        let mut file = File::open(disk)?;
        builder.append_file(name, &mut file)?;
        info!("+ [{}] {}", fmt_bytes(meta.len()), name.display());
    } else {
        builder.append_path_with_name(disk, name)?;
        info!("+ {}", name.display());
    }
    counts.files += 1;
    Ok(())
}

/// Lexical cleanup: drops `.` components, doubled and trailing separators.
fn clean(path: &Path) -> PathBuf {
    let cleaned: PathBuf = path.components().collect();
    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}

fn archive_name(path: &Path) -> QbakResult<PathBuf> {
    if let Some(name) = path.file_name() {
        return Ok(PathBuf::from(name));
    }
    // `.`, `..` and friends have no lexical base name
    let resolved = fs::canonicalize(path)?;
    resolved
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| QbakError::Archive(format!("cannot archive {}: no base name", path.display())))
}
