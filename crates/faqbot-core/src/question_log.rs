//! Append-only log of answered questions, one `"<username>: <question>"` line each.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct QuestionLog {
    path: PathBuf,
}

impl QuestionLog {
    /// Prepares the log at `path`, creating its parent directory. The file itself
    /// is created on first append.
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line. The line is written with a single `write_all` on an
    /// append-mode handle so concurrent writers interleave whole lines only.
    pub fn append(&self, username: &str, question: &str) -> std::io::Result<()> {
        let line = format!("{}: {}\n", single_line(username), single_line(question));
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

/// Line breaks would split one entry across lines.
fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}
