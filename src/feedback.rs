// File: src/feedback.rs
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("rating must be an integer from 1 to 5, got {0}")]
    InvalidRating(i64),

    #[error("feedback log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("feedback log lock poisoned")]
    Poisoned,
}

/// Append-only `timestamp, rating` log. Appends are serialized so concurrent
/// callers never interleave partial lines.
pub struct FeedbackLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FeedbackLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FeedbackError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| FeedbackError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, rating: i64) -> Result<(), FeedbackError> {
        if !(1..=5).contains(&rating) {
            return Err(FeedbackError::InvalidRating(rating));
        }
        let line = format!(
            "{}, {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            rating
        );
        let mut file = self.file.lock().map_err(|_| FeedbackError::Poisoned)?;
        file.write_all(line.as_bytes())
            .map_err(|source| FeedbackError::Io {
                path: self.path.clone(),
                source,
            })?;
        log::debug!("Recorded feedback rating {}", rating);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn out_of_range_ratings_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let log = FeedbackLog::open(dir.path().join("feedback.log")).unwrap();
        assert!(matches!(log.record(0), Err(FeedbackError::InvalidRating(0))));
        assert!(matches!(log.record(6), Err(FeedbackError::InvalidRating(6))));
        assert_eq!(std::fs::read_to_string(log.path()).unwrap(), "");
    }

    #[test]
    fn concurrent_appends_stay_line_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(FeedbackLog::open(dir.path().join("feedback.log")).unwrap());
        let handles: Vec<_> = (1..=5)
            .map(|rating| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        log.record(rating).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let text = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 100);
        for line in lines {
            let (stamp, rating) = line.split_once(", ").unwrap();
            assert_eq!(stamp.len(), 19);
            assert!((1..=5).contains(&rating.parse::<i64>().unwrap()));
        }
    }
}
