use std::fmt;

/// Number of regular files and folders written to or read from an archive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveCounts {
    pub files: u64,
    pub folders: u64,
}

impl ArchiveCounts {
    pub fn new(files: u64, folders: u64) -> Self {
        Self { files, folders }
    }
}

impl fmt::Display for ArchiveCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} files, {} folders", self.files, self.folders)
    }
}

/// Lifecycle of a single create or restore operation.
///
/// `Aborted` is reachable from every other stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    /// create: encrypted header written through the MAC tee
    HeaderWritten,
    /// restore: header read and keys decapsulated
    HeaderRead,
    /// restore: hashing the ciphertext, nothing decrypted yet
    Verifying,
    Streaming,
    Finalized,
    Aborted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::HeaderWritten => "header-written",
            Stage::HeaderRead => "header-read",
            Stage::Verifying => "verifying",
            Stage::Streaming => "streaming",
            Stage::Finalized => "finalized",
            Stage::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_display() {
        let total = ArchiveCounts::new(5, 1);
        assert_eq!(total.to_string(), "5 files, 1 folders");
    }
}
