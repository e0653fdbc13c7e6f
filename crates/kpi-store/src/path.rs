use std::fmt;

use crate::{StoreError, StoreResult};

const FORBIDDEN: &[char] = &['.', '#', '$', '[', ']'];

/// Slash-separated location in the document tree. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse `a/b/c`. Leading and trailing slashes are ignored.
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let segments = trimmed
            .split('/')
            .map(|seg| validate_segment(raw, seg).map(str::to_owned))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Self { segments })
    }

    pub fn child(&self, segment: impl AsRef<str>) -> StoreResult<Self> {
        self.join(segment.as_ref())
    }

    /// Append a relative path, which may itself contain slashes.
    pub fn join(&self, relative: &str) -> StoreResult<Self> {
        let rel = Self::parse(relative)?;
        let mut segments = self.segments.clone();
        segments.extend(rel.segments);
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn starts_with(&self, prefix: &StorePath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// True when a change at one path can alter the value seen at the other.
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }
}

fn validate_segment<'a>(raw: &str, seg: &'a str) -> StoreResult<&'a str> {
    if seg.is_empty() {
        return Err(StoreError::InvalidPath {
            path: raw.into(),
            reason: "empty segment",
        });
    }
    if seg.contains(FORBIDDEN) {
        return Err(StoreError::InvalidPath {
            path: raw.into(),
            reason: "segment contains one of . # $ [ ]",
        });
    }
    Ok(seg)
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        f.write_str(&self.segments.join("/"))
    }
}
