//! Query model and compilation into query-language text

pub mod compiler;
pub mod filter;

pub use compiler::{
    CompiledQuery, QueryCompiler, QueryOptions, QuerySpec, SortDirection, SortTerm, VersionScope,
};
pub use filter::{BoolOp, FilterExpr};
