//! Page-following driver
//!
//! Orchestrates compile, execute, extract, emit, follow-cursor and
//! finalize for one logical operation. Pages are strictly sequential:
//! each page's cursor is only known after that page is fully read, so at
//! most one request is ever in flight. The sink's `finish` is called
//! exactly once per operation, on every path.

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::query::{QueryCompiler, QuerySpec};
use crate::response::extractor::{ExtractPaths, PageExtractor};
use crate::rewrite::next_page_target;
use crate::sink::{Record, ResultSink};
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Diagnostic message attached to records routed from error pages
const APPLICATION_ERROR_MESSAGE: &str = "query returned an application error";

/// Driver position between page requests
#[derive(Debug, Clone, PartialEq, Eq)]
enum DriveState {
    AwaitingFirstPage,
    HasNextPage(String),
    Exhausted,
    Failed,
}

/// Accumulators for one drive
#[derive(Debug, Default)]
struct DriveProgress {
    pages: usize,
    emitted: usize,
    error_pages: usize,
    failed: bool,
}

/// Page driver for one client configuration
pub struct PageDriver<'a> {
    transport: &'a dyn Transport,
    config: &'a ClientConfig,
}

impl<'a> PageDriver<'a> {
    /// Create a driver over a transport and configuration
    pub fn new(transport: &'a dyn Transport, config: &'a ClientConfig) -> Self {
        Self { transport, config }
    }

    /// Run one logical query operation to completion
    ///
    /// All outcomes flow into the sink; this method itself never fails.
    /// Records already emitted from earlier pages are never retracted,
    /// and `finish` fires exactly once regardless of page count.
    pub async fn run(&self, spec: &QuerySpec, sink: &mut dyn ResultSink) {
        let mut progress = DriveProgress::default();

        let compiler = QueryCompiler::new(self.config.subquery_suffix());
        let prepared = compiler
            .compile(spec)
            .and_then(|query| ExtractPaths::from_config(self.config).map(|paths| (query, paths)));

        match prepared {
            Err(error) => {
                sink.add_failure(&error, None);
                progress.failed = true;
            }
            Ok((compiled, paths)) => {
                debug!(query = %compiled, "compiled query");
                let mut state = DriveState::AwaitingFirstPage;

                loop {
                    let request = match state {
                        DriveState::AwaitingFirstPage => ApiRequest::post_form(
                            self.config.query_path(),
                            format!("q={compiled}"),
                        ),
                        DriveState::HasNextPage(ref path) => ApiRequest::get(path.clone()),
                        DriveState::Exhausted | DriveState::Failed => break,
                    };

                    let response = match self.transport.execute(request).await {
                        Ok(response) => response,
                        Err(error) => {
                            warn!(page = progress.pages, %error, "page request failed");
                            sink.add_failure(&error, None);
                            progress.failed = true;
                            break;
                        }
                    };

                    state = match self.process_page(&response, &paths, &mut progress, sink) {
                        Ok(Some(cursor)) => DriveState::HasNextPage(next_page_target(&cursor)),
                        Ok(None) => DriveState::Exhausted,
                        Err(error) => {
                            sink.add_failure(&error, Some(response.status.as_u16()));
                            progress.failed = true;
                            DriveState::Failed
                        }
                    };
                }
            }
        }

        debug!(
            pages = progress.pages,
            emitted = progress.emitted,
            error_pages = progress.error_pages,
            failed = progress.failed,
            "operation finished"
        );

        // Finalize exactly once. An operation that emitted nothing and did
        // not fail still marks itself so finalization is never empty.
        if progress.emitted == 0 && !progress.failed && progress.error_pages == 0 {
            sink.add_empty_success();
        }
        sink.finish();
    }

    /// Drain one page into the sink; returns its cursor, if any
    fn process_page(
        &self,
        response: &ApiResponse,
        paths: &ExtractPaths,
        progress: &mut DriveProgress,
        sink: &mut dyn ResultSink,
    ) -> crate::error::Result<Option<String>> {
        progress.pages += 1;
        let status = response.status.as_u16();
        let transport_error = !response.status.is_success();

        let mut extractor =
            PageExtractor::new(&response.body, paths, self.config.accepted_statuses());
        let mut page_records = 0usize;

        while let Some(payload) = extractor.next_record()? {
            let record = Record::new(payload, response.headers.clone());
            if transport_error || extractor.is_error() {
                sink.add_application_error(record, APPLICATION_ERROR_MESSAGE, status);
            } else {
                sink.add_success(record);
            }
            progress.emitted += 1;
            page_records += 1;
        }

        let page_error = transport_error || extractor.is_error();
        if page_error {
            progress.error_pages += 1;
            if page_records == 0 {
                // An error page with no extractable records still surfaces
                // the whole page body as one application error.
                let record = Record::new(response.body.clone(), response.headers.clone());
                sink.add_application_error(record, APPLICATION_ERROR_MESSAGE, status);
                progress.emitted += 1;
            }
        }

        debug!(
            page = progress.pages,
            records = page_records,
            error = page_error,
            status,
            "page drained"
        );

        // An error page's cursor is still followed; the service keeps
        // paginating even through partially failed result sets.
        Ok(extractor.cursor().map(str::to_string))
    }
}
