//! One-pass extraction of records, cursor and error flag from a page body
//!
//! The extractor walks the token stream once, tracking its position with a
//! [`PathPointer`]. Item payloads are sliced out of the body as raw byte
//! spans the moment the pointer equals the item path; the scanner never
//! descends into a matched subtree itself. A non-accepted status value
//! retargets matching to the error-array path for the rest of the pass,
//! and the first string seen at the cursor path wins.

use bytes::Bytes;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::response::path::{MatchPath, PathPointer};
use crate::response::token::{Token, TokenReader};

/// Parsed match paths for one extraction pass
#[derive(Debug, Clone)]
pub struct ExtractPaths {
    pub item: MatchPath,
    pub error: MatchPath,
    pub cursor: MatchPath,
    pub status: MatchPath,
}

impl ExtractPaths {
    /// Parse the four match paths out of a client configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            item: MatchPath::parse(config.item_path())?,
            error: MatchPath::parse(config.error_path())?,
            cursor: MatchPath::parse(config.cursor_path())?,
            status: MatchPath::parse(config.status_path())?,
        })
    }
}

/// Streaming extractor over one page body
///
/// Drive it with [`next_record`](Self::next_record) until it returns
/// `None`; the cursor and error flag are final once the pass completes.
#[derive(Debug)]
pub struct PageExtractor<'a> {
    body: &'a Bytes,
    reader: TokenReader<'a>,
    pointer: PathPointer,
    paths: &'a ExtractPaths,
    accepted_statuses: &'a [String],
    /// Current record target; flips to the error path on a bad status
    target: MatchPath,
    cursor: Option<String>,
    is_error: bool,
    status_checked: bool,
    exhausted: bool,
}

impl<'a> PageExtractor<'a> {
    /// Create an extractor over a complete page body
    pub fn new(body: &'a Bytes, paths: &'a ExtractPaths, accepted_statuses: &'a [String]) -> Self {
        Self {
            body,
            reader: TokenReader::new(body.as_ref()),
            pointer: PathPointer::new(),
            paths,
            accepted_statuses,
            target: paths.item.clone(),
            cursor: None,
            is_error: false,
            status_checked: false,
            exhausted: false,
        }
    }

    /// Scan forward to the next matched record
    ///
    /// Returns `None` once the token stream is exhausted. Malformed or
    /// truncated input surfaces as a fatal parse error; the pass cannot
    /// be resumed afterwards.
    pub fn next_record(&mut self) -> Result<Option<Bytes>> {
        if self.exhausted {
            return Ok(None);
        }
        let result = self.scan_next();
        if result.is_err() {
            self.exhausted = true;
        }
        result
    }

    fn scan_next(&mut self) -> Result<Option<Bytes>> {
        loop {
            let Some(token) = self.reader.next_token()? else {
                self.exhausted = true;
                return Ok(None);
            };
            match token {
                Token::FieldName(name) => {
                    self.pointer.push_field(&name);
                }
                Token::StartObject => {
                    if self.pointer.matches(&self.target) {
                        let record = self.capture_container()?;
                        self.pointer.pop_field();
                        return Ok(Some(record));
                    }
                }
                Token::StartArray => {
                    // Check before descending: an item path ending in [*]
                    // matches the elements, not the array itself.
                    if self.pointer.matches(&self.target) {
                        let record = self.capture_container()?;
                        self.pointer.pop_field();
                        return Ok(Some(record));
                    }
                    self.pointer.push_any_index();
                }
                Token::EndObject => {
                    self.pointer.pop_field();
                }
                Token::EndArray => {
                    self.pointer.pop();
                    self.pointer.pop_field();
                }
                Token::String(value) => {
                    if self.pointer.matches(&self.target) {
                        let record = self.scalar_span();
                        self.pointer.pop_field();
                        return Ok(Some(record));
                    }
                    self.observe_string(&value);
                    self.pointer.pop_field();
                }
                Token::Number(_) | Token::Bool(_) | Token::Null => {
                    if self.pointer.matches(&self.target) {
                        let record = self.scalar_span();
                        self.pointer.pop_field();
                        return Ok(Some(record));
                    }
                    if self.pointer.matches(&self.paths.status) && !self.status_checked {
                        // A non-string status cannot be an accepted marker.
                        self.flag_error();
                    }
                    self.pointer.pop_field();
                }
            }
        }
    }

    /// Continuation cursor, if one was seen; final once drained
    #[inline]
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Whether the page reported a non-accepted status
    #[inline]
    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// Slice out the container the reader just entered
    fn capture_container(&mut self) -> Result<Bytes> {
        let start = self.reader.token_start();
        let end = self.reader.finish_container()?;
        Ok(self.body.slice(start..end))
    }

    /// Slice out the scalar token the reader just consumed
    fn scalar_span(&self) -> Bytes {
        self.body
            .slice(self.reader.token_start()..self.reader.position())
    }

    fn observe_string(&mut self, value: &str) {
        if self.pointer.matches(&self.paths.status) && !self.status_checked {
            self.status_checked = true;
            if !self.accepted_statuses.iter().any(|s| s == value) {
                self.flag_error();
            }
        } else if self.pointer.matches(&self.paths.cursor) && self.cursor.is_none() {
            // First occurrence wins; later duplicates are ignored.
            self.cursor = Some(value.to_string());
        }
    }

    fn flag_error(&mut self) {
        self.is_error = true;
        self.status_checked = true;
        self.target = self.paths.error.clone();
    }
}

impl Iterator for PageExtractor<'_> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
