//! Seed corpus loading

use crate::error::{LoadTestError, LoadTestResult};
use bottle_config::CorpusConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Immutable, shareable sequence of payload lines. Never empty.
#[derive(Debug, Clone)]
pub struct Corpus {
    lines: Arc<[String]>,
}

impl Corpus {
    /// Read every line of a UTF-8 file
    ///
    /// Blank lines are kept unless `skip_blank_lines` is set. Fails with
    /// [`LoadTestError::CorpusUnavailable`] if the file cannot be read or
    /// holds no lines.
    pub fn load(path: impl AsRef<Path>, skip_blank_lines: bool) -> LoadTestResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| LoadTestError::CorpusUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let lines: Vec<String> = content
            .lines()
            .filter(|line| !skip_blank_lines || !line.trim().is_empty())
            .map(str::to_string)
            .collect();

        let corpus = Self::from_lines(lines).map_err(|_| LoadTestError::CorpusUnavailable {
            path: path.to_path_buf(),
            reason: "corpus is empty".to_string(),
        })?;
        info!("Loaded {} corpus lines from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    /// Locate and load the corpus named by the configuration
    pub fn from_config(config: &CorpusConfig) -> LoadTestResult<Self> {
        let path = Self::locate(&config.path).ok_or_else(|| LoadTestError::CorpusUnavailable {
            path: config.path.clone(),
            reason: "file not found".to_string(),
        })?;
        Self::load(path, config.skip_blank_lines)
    }

    /// Find the corpus file: the path as given, then next to the executable
    pub fn locate(path: &Path) -> Option<PathBuf> {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        if path.is_absolute() {
            return None;
        }

        let beside_exe = std::env::current_exe()
            .ok()?
            .parent()?
            .join(path);
        debug!("Looking for corpus at {}", beside_exe.display());
        beside_exe.is_file().then_some(beside_exe)
    }

    /// Build a corpus from in-memory lines
    pub fn from_lines<I, S>(lines: I) -> LoadTestResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        if lines.is_empty() {
            return Err(LoadTestError::CorpusUnavailable {
                path: PathBuf::from("<memory>"),
                reason: "corpus is empty".to_string(),
            });
        }
        Ok(Self {
            lines: lines.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Always false for a constructed corpus
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line at `index`, wrapping around the corpus length
    pub fn line(&self, index: usize) -> &str {
        &self.lines[index % self.lines.len()]
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn corpus_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_keeps_blank_lines_by_default() {
        let file = corpus_file("Shall I compare thee\n\nto a summer's day?\n");
        let corpus = Corpus::load(file.path(), false).unwrap();

        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.line(0), "Shall I compare thee");
        assert_eq!(corpus.line(1), "");
        assert_eq!(corpus.line(2), "to a summer's day?");
    }

    #[test]
    fn test_load_can_skip_blank_lines() {
        let file = corpus_file("one\n   \ntwo\r\n");
        let corpus = Corpus::load(file.path(), true).unwrap();
        assert_eq!(corpus.lines(), &["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_empty_file_is_unavailable() {
        let file = corpus_file("");
        let err = Corpus::load(file.path(), false).unwrap_err();
        assert!(matches!(err, LoadTestError::CorpusUnavailable { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_blank_only_file_with_skip_is_unavailable() {
        let file = corpus_file("\n\n");
        assert!(Corpus::load(file.path(), true).is_err());
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let config = CorpusConfig {
            path: PathBuf::from("/definitely/not/here/sonnets.txt"),
            skip_blank_lines: false,
        };
        match Corpus::from_config(&config) {
            Err(LoadTestError::CorpusUnavailable { path, .. }) => {
                assert_eq!(path, config.path);
            }
            other => panic!("expected CorpusUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_single_line_corpus() {
        let corpus = Corpus::from_lines(["a"]).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.line(0), "a");
        assert_eq!(corpus.line(7), "a");
        assert!(!corpus.is_empty());
    }

    #[test]
    fn test_locate_prefers_given_path() {
        let file = corpus_file("x\n");
        assert_eq!(Corpus::locate(file.path()), Some(file.path().to_path_buf()));
        assert_eq!(Corpus::locate(Path::new("/no/such/corpus.txt")), None);
    }
}
