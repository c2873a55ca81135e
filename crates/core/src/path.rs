//! Dot-delimited node addressing.
//!
//! A `Path` is the ordered sequence of segment names from the root to a
//! node. The root is the empty path. Paths are cheap to hash and order, so
//! they key every registry map in the engine.

use crate::error::{Error, Result};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

/// An ordered sequence of string segments addressing a node from the root.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Returns the root path (no segments).
    #[inline]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a dot-delimited path string.
    ///
    /// The empty string parses to the root path. Empty segments
    /// (`"a..b"`, leading or trailing dots) are rejected.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for segment in text.split('.') {
            if segment.is_empty() {
                return Err(Error::invalid_path(text, "empty path segment"));
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Builds a path from pre-split segments.
    pub fn from_segments<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Returns the parent path, or None for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns the last segment, or None for the root.
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns the segments in order.
    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns true if this is the root path.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the number of segments.
    #[inline]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if `other` is this path or an ancestor of it.
    pub fn starts_with(&self, other: &Path) -> bool {
        self.segments.len() >= other.segments.len()
            && self.segments[..other.segments.len()] == other.segments[..]
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}
