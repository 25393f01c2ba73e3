use chrono::{DateTime, Utc};
use std::str::FromStr;

use crate::models::SelectedFile;
use crate::utils::hash::calculate_hash;

/// How an object key is derived from a selection.
///
/// `OriginalName` keeps the file name untouched, so uploading two files with
/// the same name overwrites the first object. The other strategies make keys
/// unique enough to avoid that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyStrategy {
    #[default]
    OriginalName,
    TimestampSuffix,
    ContentHash,
    UniquePrefix,
}

impl KeyStrategy {
    pub fn object_key(&self, file: &SelectedFile) -> String {
        self.object_key_at(file, Utc::now())
    }

    /// Same as [`object_key`](Self::object_key) with an explicit clock.
    pub fn object_key_at(&self, file: &SelectedFile, now: DateTime<Utc>) -> String {
        match self {
            KeyStrategy::OriginalName => file.name.clone(),
            KeyStrategy::TimestampSuffix => {
                let stamp = now.format("%Y%m%d%H%M%S");
                match split_extension(&file.name) {
                    (stem, Some(ext)) => format!("{}-{}.{}", stem, stamp, ext),
                    (stem, None) => format!("{}-{}", stem, stamp),
                }
            }
            KeyStrategy::ContentHash => {
                let digest = calculate_hash(&file.data);
                format!("{}-{}", &digest[..16], file.name)
            }
            KeyStrategy::UniquePrefix => format!("{}-{}", uuid::Uuid::new_v4(), file.name),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStrategy::OriginalName => "original",
            KeyStrategy::TimestampSuffix => "timestamp",
            KeyStrategy::ContentHash => "content-hash",
            KeyStrategy::UniquePrefix => "uuid",
        }
    }
}

impl FromStr for KeyStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "original" | "original-name" => Ok(KeyStrategy::OriginalName),
            "timestamp" => Ok(KeyStrategy::TimestampSuffix),
            "content-hash" | "hash" => Ok(KeyStrategy::ContentHash),
            "uuid" => Ok(KeyStrategy::UniquePrefix),
            other => Err(format!("unknown object key strategy '{}'", other)),
        }
    }
}

impl std::fmt::Display for KeyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Splits `name.ext` at the last dot. Dotfiles and trailing dots keep the
/// whole name as the stem.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(0) | None => (name, None),
        Some(i) if i + 1 == name.len() => (name, None),
        Some(i) => (&name[..i], Some(&name[i + 1..])),
    }
}
