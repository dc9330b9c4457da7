//! tabql: streaming query client for paginated tabular data APIs
//!
//! The crate compiles a structured query description into the service's
//! SQL-like query language, submits it, and streams every page of the
//! result set into a caller-supplied sink. Page bodies are scanned once,
//! byte level, without building a document tree; item payloads are handed
//! over as zero-copy slices of the page body.
//!
//! ```no_run
//! use tabql::{ClientConfig, HttpTransport, PageDriver, QuerySpec};
//!
//! # async fn run(sink: &mut dyn tabql::ResultSink) -> tabql::Result<()> {
//! let config = ClientConfig::new("https://data.example.com", "/api/v1")?;
//! let transport = HttpTransport::new(&config);
//! let spec = QuerySpec::new("product__v", ["id", "name__v"]);
//! PageDriver::new(&transport, &config).run(&spec, sink).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod query;
pub mod response;
pub mod rewrite;
pub mod sink;
pub mod transport;

pub use config::{ClientConfig, ClientConfigBuilder};
pub use driver::PageDriver;
pub use error::{Error, Result};
pub use query::{
    BoolOp, CompiledQuery, FilterExpr, QueryCompiler, QueryOptions, QuerySpec, SortDirection,
    SortTerm, VersionScope,
};
pub use sink::{Record, ResultSink};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
