//! Intermediate artifacts: the cleaned corpus and the edge list.
//!
//! Each file is written to a sibling temp path first and renamed into
//! place. The temp path is owned by a guard that removes it on drop, so
//! no error path leaves a partial file behind.

use crate::error::CorpusError;
use crate::pipeline::Corpus;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const CORPUS_FILE: &str = "corpus.txt";
pub const EDGES_FILE: &str = "edges.tsv";

struct ScopedTempFile {
    path: PathBuf,
    persisted: bool,
}

impl ScopedTempFile {
    fn beside(target: &Path) -> Self {
        let mut path: OsString = target.as_os_str().to_os_string();
        path.push(format!(".tmp.{}", std::process::id()));
        Self {
            path: PathBuf::from(path),
            persisted: false,
        }
    }

    fn persist(mut self, target: &Path) -> Result<(), CorpusError> {
        fs::rename(&self.path, target).map_err(|error| CorpusError::Io {
            path: format!("{} -> {}", self.path.display(), target.display()),
            message: error.to_string(),
        })?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for ScopedTempFile {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn write_atomic(target: &Path, body: &str) -> Result<(), CorpusError> {
    let temp = ScopedTempFile::beside(target);
    let file = File::create(&temp.path).map_err(|error| CorpusError::io(&temp.path, error))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(body.as_bytes())
        .map_err(|error| CorpusError::io(&temp.path, error))?;
    let file = writer
        .into_inner()
        .map_err(|error| CorpusError::io(&temp.path, error.into_error()))?;
    file.sync_all()
        .map_err(|error| CorpusError::io(&temp.path, error))?;
    drop(file);
    temp.persist(target)
}

/// `source\ttarget\trelation\tresolved|unresolved`, sorted and deduplicated.
pub fn edges_tsv(corpus: &Corpus) -> String {
    let mut edges: Vec<_> = corpus.edges.iter().collect();
    edges.sort();
    edges.dedup();
    let mut out = String::from("source\ttarget\trelation\tstatus\n");
    for edge in edges {
        let status = if corpus.is_resolved(edge) {
            "resolved"
        } else {
            "unresolved"
        };
        out.push_str(&format!(
            "{}\t{}\t{}\t{status}\n",
            edge.source, edge.target, edge.relation
        ));
    }
    out
}

fn corpus_txt(corpus: &Corpus) -> String {
    let mut out = corpus.text();
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Write `corpus.txt` and `edges.tsv` into `dir`, creating it if needed.
pub fn write_intermediates(dir: &Path, corpus: &Corpus) -> Result<Vec<PathBuf>, CorpusError> {
    fs::create_dir_all(dir).map_err(|error| CorpusError::io(dir, error))?;
    let mut written = Vec::new();
    for (name, body) in [(CORPUS_FILE, corpus_txt(corpus)), (EDGES_FILE, edges_tsv(corpus))] {
        let target = dir.join(name);
        write_atomic(&target, &body)?;
        tracing::debug!(path = %target.display(), bytes = body.len(), "wrote intermediate");
        written.push(target);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_target_and_leaves_no_temp() {
        let temp = tempfile::tempdir().expect("tempdir");
        let target = temp.path().join("corpus.txt");
        fs::write(&target, "old\n").expect("seed");
        write_atomic(&target, "new\n").expect("write");
        assert_eq!(fs::read_to_string(&target).expect("read"), "new\n");
        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .expect("list")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn failed_write_removes_temp_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        // A directory in the target's place makes the final rename fail.
        let target = temp.path().join("edges.tsv");
        fs::create_dir_all(target.join("occupied")).expect("mkdir");
        assert!(write_atomic(&target, "body\n").is_err());
        let names: Vec<String> = fs::read_dir(temp.path())
            .expect("list")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["edges.tsv".to_string()]);
    }
}
