//! Result sink: where extracted records and operation results land
//!
//! The driver is the only caller; it translates every runtime error into
//! exactly one of these calls and guarantees `finish` fires exactly once
//! per logical operation.

use bytes::Bytes;
use http::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// One extracted record: raw payload plus capture-time response metadata
#[derive(Debug, Clone)]
pub struct Record {
    payload: Bytes,
    headers: HeaderMap,
}

impl Record {
    /// Build a record from a payload and the headers of the page that
    /// carried it
    pub fn new(payload: Bytes, headers: HeaderMap) -> Self {
        Self { payload, headers }
    }

    /// Raw payload bytes, a zero-copy slice of the page body
    #[inline]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Response headers captured when the page was received
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Deserialize the payload as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.payload)
            .map_err(|e| Error::parse(e.column(), format!("record payload: {e}")))
    }
}

/// Destination for the results of one logical operation
///
/// `finish` is called exactly once, on every path; when an operation ends
/// without a single emitted unit and without a failure, the driver emits
/// one `add_empty_success` marker first so finalization is never empty.
pub trait ResultSink {
    /// A record extracted from a success page
    fn add_success(&mut self, record: Record);

    /// A record extracted from an error page, with a diagnostic message
    /// and the HTTP status of the page that carried it
    fn add_application_error(&mut self, record: Record, message: &str, status: u16);

    /// A transport or parse failure terminating the whole operation
    fn add_failure(&mut self, error: &Error, status: Option<u16>);

    /// Marker for an operation that completed without emitting anything
    fn add_empty_success(&mut self);

    /// Finalize the operation
    fn finish(&mut self);
}
