//! Compilation of an abstract selection model into query text
//!
//! The compiler is a pure function over an immutable [`QuerySpec`]; it
//! performs no I/O and reports every validation failure before a request
//! is ever built. Per-operation state (the currently open subquery group)
//! lives in loop-local accumulators, never on the compiler itself.

use crate::error::{Error, Result};
use crate::query::filter::FilterExpr;

/// Version scope of a query
///
/// One tri-state setting with two independent surface effects: matching
/// all versions prefixes the queried object with `allversions`, and
/// latest-of-matching additionally prefixes the SELECT keyword itself
/// with `latestversion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionScope {
    /// Query latest versions only
    #[default]
    Latest,
    /// Query all matching versions
    AllMatching,
    /// Query the latest version of each matching record
    LatestOfMatching,
}

impl VersionScope {
    #[inline]
    fn all_versions(self) -> bool {
        matches!(self, Self::AllMatching | Self::LatestOfMatching)
    }

    #[inline]
    fn latest_version(self) -> bool {
        matches!(self, Self::LatestOfMatching)
    }
}

/// Sort direction of one ORDER BY term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Keyword used in query text
    #[inline]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One ordered `(property, direction)` sort term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortTerm {
    pub property: String,
    pub direction: SortDirection,
}

impl SortTerm {
    /// Build a sort term
    pub fn new(property: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }
}

/// Pagination and search hints, immutable per operation
///
/// `max_rows` and `page_size` are active iff greater than zero.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub max_rows: i64,
    pub page_size: i64,
    pub find: Option<String>,
    pub version_scope: VersionScope,
}

/// Complete selection model for one query operation
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub object: String,
    pub fields: Vec<String>,
    pub filter: Option<FilterExpr>,
    pub sort: Vec<SortTerm>,
    pub options: QueryOptions,
}

impl QuerySpec {
    /// Build a selection of `fields` from `object` with default options
    pub fn new<I, S>(object: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            object: object.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            filter: None,
            sort: Vec::new(),
            options: QueryOptions::default(),
        }
    }

    /// Attach a filter tree
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Append a sort term
    pub fn with_sort(mut self, property: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortTerm::new(property, direction));
        self
    }

    /// Replace the options
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }
}

/// Compiled query text, created once and never mutated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery(String);

impl CompiledQuery {
    /// The query text
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deterministic compiler from selection model to query text
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    subquery_suffix: String,
}

impl QueryCompiler {
    /// Create a compiler recognizing `subquery_suffix` as the marker for
    /// subquery object segments in selected field paths
    pub fn new(subquery_suffix: impl Into<String>) -> Self {
        Self {
            subquery_suffix: subquery_suffix.into(),
        }
    }

    /// Compile a selection model into query text
    pub fn compile(&self, spec: &QuerySpec) -> Result<CompiledQuery> {
        if spec.fields.is_empty() {
            return Err(Error::config("at least one field must be selected"));
        }

        let mut query = String::with_capacity(128);
        query.push_str("SELECT ");
        if spec.options.version_scope.latest_version() {
            query.push_str("latestversion ");
        }
        query.push_str(&self.select_terms(&spec.fields).join(", "));

        query.push_str(" FROM ");
        if spec.options.version_scope.all_versions() {
            query.push_str("allversions ");
        }
        query.push_str(&spec.object);

        if let Some(term) = spec.options.find.as_deref().filter(|t| !t.is_empty()) {
            query.push_str(" FIND (");
            if term.contains('\'') {
                // Already-quoted search terms are taken as supplied.
                query.push_str(term);
            } else {
                query.push('\'');
                query.push_str(term);
                query.push('\'');
            }
            query.push(')');
        }

        if let Some(filter) = &spec.filter {
            let rendered = filter.render()?;
            if !rendered.is_empty() {
                query.push_str(" WHERE ");
                query.push_str(&rendered);
            }
        }

        let order_terms: Vec<String> = spec
            .sort
            .iter()
            .filter(|term| !term.property.trim().is_empty())
            .map(|term| {
                format!(
                    "{} {}",
                    term.property.replace('/', "."),
                    term.direction.keyword()
                )
            })
            .collect();
        if !order_terms.is_empty() {
            query.push_str(" ORDER BY ");
            query.push_str(&order_terms.join(", "));
        }

        if spec.options.max_rows > 0 {
            query.push_str(&format!(" MAXROWS {}", spec.options.max_rows));
        }
        if spec.options.page_size > 0 {
            query.push_str(&format!(" PAGESIZE {}", spec.options.page_size));
        }

        Ok(CompiledQuery(query))
    }

    /// Walk selected fields into SELECT terms, grouping subquery fields
    ///
    /// The "currently open subquery" travels through the loop as a local
    /// accumulator: consecutive fields of the same subquery object merge
    /// into one `(SELECT .. FROM object)` clause, and anything else closes
    /// the open group before being emitted itself.
    fn select_terms(&self, fields: &[String]) -> Vec<String> {
        let normalized: Vec<String> = fields.iter().map(|f| f.replace('/', ".")).collect();

        let mut terms: Vec<String> = Vec::with_capacity(fields.len());
        let mut open: Option<(String, Vec<String>)> = None;

        for field in fields {
            match self.split_subquery(field) {
                Some((object, member)) => {
                    match &mut open {
                        Some((current, members)) if *current == object => {
                            members.push(member);
                        }
                        _ => {
                            // Switching objects closes the previous group.
                            close_group(&mut terms, open.take());
                            open = Some((object, vec![member]));
                        }
                    }
                }
                None => {
                    close_group(&mut terms, open.take());
                    let name = field.replace('/', ".");
                    if !has_strict_descendant(&normalized, &name) {
                        terms.push(name);
                    }
                }
            }
        }
        close_group(&mut terms, open.take());

        terms
    }

    /// Split `object__r/field` style paths into (subquery object, member)
    ///
    /// Returns `None` for plain and merely nested fields. The member is
    /// the dot-joined remainder of the path after the marker segment.
    fn split_subquery(&self, field: &str) -> Option<(String, String)> {
        let segments: Vec<&str> = field.split('/').collect();
        let marker = segments
            .iter()
            .position(|segment| segment.ends_with(&self.subquery_suffix))?;
        if marker + 1 >= segments.len() {
            // A trailing marker segment has no member fields to select.
            return None;
        }
        Some((
            segments[marker].to_string(),
            segments[marker + 1..].join("."),
        ))
    }
}

fn close_group(terms: &mut Vec<String>, open: Option<(String, Vec<String>)>) {
    if let Some((object, members)) = open {
        terms.push(format!("(SELECT {} FROM {})", members.join(","), object));
    }
}

/// Whether some other selected field is a strict dot-descendant of `name`
fn has_strict_descendant(normalized: &[String], name: &str) -> bool {
    normalized
        .iter()
        .any(|other| other.len() > name.len() + 1 && other.starts_with(name) && other.as_bytes()[name.len()] == b'.')
}
