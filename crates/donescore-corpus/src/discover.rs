//! Stable corpus assembly: the one place inputs are listed and ordered.
//!
//! Artifacts are the `<PREFIX>-####*.md` files directly inside a domain
//! directory, sorted by file name in byte order before anything reads them.

use crate::error::CorpusError;
use crate::profile::DomainProfile;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSource {
    pub id: String,
    pub path: PathBuf,
    pub text: String,
}

/// Artifact ID encoded in a file name, if it follows the convention.
pub fn artifact_id_from_file_name(file_name: &str, prefix: &str) -> Option<String> {
    if !file_name.ends_with(".md") {
        return None;
    }
    let rest = file_name.strip_prefix(prefix)?.strip_prefix('-')?;
    let digits = rest.get(..4)?;
    if !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    // `PER-00012.md` is not `PER-0001`.
    if rest[4..].starts_with(|ch: char| ch.is_ascii_digit()) {
        return None;
    }
    Some(format!("{prefix}-{digits}"))
}

/// Sorted artifact paths for one domain. A missing domain directory is an
/// empty listing.
pub fn discover(
    docs_root: &Path,
    profile: &DomainProfile,
) -> Result<Vec<(String, PathBuf)>, CorpusError> {
    let dir = docs_root.join(&profile.dir);
    if !dir.is_dir() {
        tracing::debug!(domain = %profile.name, dir = %dir.display(), "domain directory absent");
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in fs::read_dir(&dir).map_err(|error| CorpusError::io(&dir, error))? {
        let entry = entry.map_err(|error| CorpusError::io(&dir, error))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if let Some(id) = artifact_id_from_file_name(name, &profile.prefix) {
            found.push((name.to_string(), id, path));
        }
    }
    found.sort_by(|left, right| left.0.as_bytes().cmp(right.0.as_bytes()));

    tracing::debug!(domain = %profile.name, artifacts = found.len(), "discovered artifacts");
    Ok(found.into_iter().map(|(_, id, path)| (id, path)).collect())
}

/// Read an artifact as UTF-8; anything else is an error, never a lossy read.
pub fn read_utf8(path: &Path) -> Result<String, CorpusError> {
    let bytes = fs::read(path).map_err(|error| CorpusError::io(path, error))?;
    String::from_utf8(bytes).map_err(|error| CorpusError::Encoding {
        path: path.display().to_string(),
        offset: error.utf8_error().valid_up_to(),
    })
}

pub fn load_artifacts(
    docs_root: &Path,
    profile: &DomainProfile,
) -> Result<Vec<ArtifactSource>, CorpusError> {
    discover(docs_root, profile)?
        .into_iter()
        .map(|(id, path)| {
            let text = read_utf8(&path)?;
            Ok(ArtifactSource { id, path, text })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::persona_profile;

    #[test]
    fn file_names_follow_the_prefix_convention() {
        assert_eq!(
            artifact_id_from_file_name("PER-0001-buyer.md", "PER"),
            Some("PER-0001".to_string())
        );
        assert_eq!(
            artifact_id_from_file_name("PER-0002.md", "PER"),
            Some("PER-0002".to_string())
        );
        assert_eq!(artifact_id_from_file_name("PER-0001.txt", "PER"), None);
        assert_eq!(artifact_id_from_file_name("PROP-0001.md", "PER"), None);
        assert_eq!(artifact_id_from_file_name("PER-00012.md", "PER"), None);
        assert_eq!(artifact_id_from_file_name("PER-01.md", "PER"), None);
    }

    #[test]
    fn discovery_is_sorted_and_non_recursive() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("personas");
        fs::create_dir_all(dir.join("nested")).expect("mkdir");
        for name in ["PER-0002-b.md", "PER-0001-a.md", "notes.md", "nested/PER-0003.md"] {
            fs::write(dir.join(name), "# x\n").expect("write");
        }
        let ids: Vec<String> = discover(temp.path(), &persona_profile())
            .expect("discover")
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["PER-0001", "PER-0002"]);
    }

    #[test]
    fn missing_domain_directory_is_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(discover(temp.path(), &persona_profile()).expect("discover").is_empty());
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("PER-0001.md");
        fs::write(&path, [b'o', b'k', 0xff, 0xfe]).expect("write");
        match read_utf8(&path) {
            Err(CorpusError::Encoding { offset, .. }) => assert_eq!(offset, 2),
            other => panic!("expected encoding error, got {other:?}"),
        }
    }
}
