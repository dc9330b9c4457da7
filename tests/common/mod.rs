//! Shared test doubles: a scripted transport and a recording sink

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use tabql::{ApiRequest, ApiResponse, Error, Record, ResultSink, Transport};

/// One scripted exchange: the request the transport expects next and the
/// response it plays back
pub struct Exchange {
    pub expect_method: &'static str,
    pub expect_path: String,
    pub expect_body: Option<String>,
    pub status: u16,
    pub body: &'static str,
}

impl Exchange {
    pub fn first_page(query: &str, status: u16, body: &'static str) -> Self {
        Self {
            expect_method: "POST",
            expect_path: "/query".to_string(),
            expect_body: Some(format!("q={query}")),
            status,
            body,
        }
    }

    pub fn next_page(path: &str, status: u16, body: &'static str) -> Self {
        Self {
            expect_method: "GET",
            expect_path: path.to_string(),
            expect_body: None,
            status,
            body,
        }
    }
}

/// Transport that plays back a fixed script of exchanges, asserting each
/// incoming request against the script as it goes
pub struct ScriptedTransport {
    script: Mutex<Vec<Exchange>>,
}

impl ScriptedTransport {
    pub fn new(mut script: Vec<Exchange>) -> Self {
        script.reverse();
        Self {
            script: Mutex::new(script),
        }
    }

    pub fn assert_exhausted(&self) {
        assert!(
            self.script.lock().unwrap().is_empty(),
            "scripted exchanges left unplayed"
        );
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> tabql::Result<ApiResponse> {
        let Some(exchange) = self.script.lock().unwrap().pop() else {
            return Err(Error::transport("unexpected request past end of script"));
        };
        assert_eq!(request.method.as_str(), exchange.expect_method);
        assert_eq!(request.path, exchange.expect_path);
        if let Some(expected) = &exchange.expect_body {
            let body = request.body.as_deref().unwrap_or_default();
            assert_eq!(body, expected.as_bytes());
        }
        Ok(ApiResponse {
            status: StatusCode::from_u16(exchange.status).unwrap(),
            headers: HeaderMap::new(),
            body: Bytes::from_static(exchange.body.as_bytes()),
        })
    }
}

/// Transport that fails every request
pub struct FailingTransport;

#[async_trait]
impl Transport for FailingTransport {
    async fn execute(&self, _request: ApiRequest) -> tabql::Result<ApiResponse> {
        Err(Error::transport("connection refused"))
    }
}

/// Everything a sink was told, in call order
#[derive(Debug, Default)]
pub struct MemorySink {
    pub successes: Vec<String>,
    pub application_errors: Vec<(String, String, u16)>,
    pub failures: Vec<(String, Option<u16>)>,
    pub empty_success_marks: usize,
    pub finish_calls: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultSink for MemorySink {
    fn add_success(&mut self, record: Record) {
        assert_eq!(self.finish_calls, 0, "emission after finish");
        self.successes
            .push(String::from_utf8(record.payload().to_vec()).unwrap());
    }

    fn add_application_error(&mut self, record: Record, message: &str, status: u16) {
        assert_eq!(self.finish_calls, 0, "emission after finish");
        self.application_errors.push((
            String::from_utf8(record.payload().to_vec()).unwrap(),
            message.to_string(),
            status,
        ));
    }

    fn add_failure(&mut self, error: &Error, status: Option<u16>) {
        assert_eq!(self.finish_calls, 0, "emission after finish");
        self.failures.push((error.to_string(), status));
    }

    fn add_empty_success(&mut self) {
        assert_eq!(self.finish_calls, 0, "emission after finish");
        self.empty_success_marks += 1;
    }

    fn finish(&mut self) {
        self.finish_calls += 1;
    }
}
