//! Streaming response handling
//!
//! A page body is scanned exactly once: the token reader yields events,
//! the path pointer tracks where in the document they occur, and the
//! extractor slices matched records out as raw byte spans.

pub mod extractor;
pub mod path;
pub mod token;

pub use extractor::{ExtractPaths, PageExtractor};
pub use path::{MatchPath, PathPointer, PathSegment};
pub use token::{Token, TokenReader};
