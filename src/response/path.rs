//! Match paths and the scanner's path pointer
//!
//! The extractor navigates by comparing a runtime pointer (a stack of
//! field names and array-wildcard markers) against a handful of fixed
//! match paths. Paths use the restricted `$.a.b[*]` form: dotted field
//! segments, each optionally followed by `[*]` to descend into an array.

use std::fmt;

use crate::error::{Error, Result};

/// One segment of a match path or path pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// An object field name
    Field(String),
    /// Any index of an array
    AnyIndex,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, ".{name}"),
            Self::AnyIndex => f.write_str("[*]"),
        }
    }
}

/// A parsed, fixed match path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPath {
    segments: Vec<PathSegment>,
}

impl MatchPath {
    /// Parse the restricted `$.a.b[*]` path form
    ///
    /// The leading `$` is optional. Wildcards other than a trailing `[*]`
    /// per segment, filters, slices and recursive descent are rejected;
    /// this scanner only follows fixed paths.
    pub fn parse(path: &str) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidPath {
            path: path.to_string(),
            message: message.to_string(),
        };

        let mut rest = path.trim();
        rest = rest.strip_prefix('$').unwrap_or(rest);
        rest = rest.strip_prefix('.').unwrap_or(rest);
        if rest.is_empty() {
            return Err(invalid("path must name at least one field"));
        }

        let mut segments = Vec::new();
        for raw in rest.split('.') {
            let (name, wildcard) = match raw.strip_suffix("[*]") {
                Some(name) => (name, true),
                None => (raw, false),
            };
            if name.is_empty() {
                return Err(invalid("empty field segment"));
            }
            if name.contains('[') || name.contains(']') {
                return Err(invalid("only a trailing [*] wildcard is supported"));
            }
            segments.push(PathSegment::Field(name.to_string()));
            if wildcard {
                segments.push(PathSegment::AnyIndex);
            }
        }
        Ok(Self { segments })
    }

    /// Segments of this path
    #[inline]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl fmt::Display for MatchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// The scanner's current position as a stack of path segments
#[derive(Debug, Default)]
pub struct PathPointer {
    stack: Vec<PathSegment>,
}

impl PathPointer {
    /// Create an empty pointer positioned at the document root
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a field name on a field-name token
    #[inline]
    pub fn push_field(&mut self, name: &str) {
        self.stack.push(PathSegment::Field(name.to_string()));
    }

    /// Push a wildcard marker on array entry
    #[inline]
    pub fn push_any_index(&mut self) {
        self.stack.push(PathSegment::AnyIndex);
    }

    /// Pop the top segment, whatever it is
    #[inline]
    pub fn pop(&mut self) {
        self.stack.pop();
    }

    /// Pop the top segment iff it is a field name
    ///
    /// Called once a field's value has been fully consumed; array
    /// wildcard markers stay until their array closes.
    #[inline]
    pub fn pop_field(&mut self) {
        if matches!(self.stack.last(), Some(PathSegment::Field(_))) {
            self.stack.pop();
        }
    }

    /// Whether the pointer currently equals `path`
    #[inline]
    pub fn matches(&self, path: &MatchPath) -> bool {
        self.stack == path.segments()
    }

    /// Current depth of the pointer
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
