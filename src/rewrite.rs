//! Continuation-URL rewriting
//!
//! Page bodies carry absolute continuation URLs that re-enter under the
//! same fixed two-segment API/version prefix the transport already
//! prepends. The rewriter reduces such a URL to the relative request
//! target for the next page: drop scheme and host, then strip exactly the
//! first two path segments, keeping the remaining path and any query
//! string.

/// Rewrite an absolute continuation URL into a relative next-page target
///
/// Purely textual and deterministic; inputs without a scheme or without a
/// query string are tolerated.
pub fn next_page_target(url: &str) -> String {
    let path_and_query = strip_scheme_and_host(url);
    let (path, query) = match path_and_query.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path_and_query, None),
    };

    let mut rest = path.strip_prefix('/').unwrap_or(path);
    for _ in 0..2 {
        match rest.split_once('/') {
            Some((_, tail)) => rest = tail,
            None => {
                rest = "";
                break;
            }
        }
    }

    match query {
        Some(query) => format!("/{rest}?{query}"),
        None => format!("/{rest}"),
    }
}

fn strip_scheme_and_host(url: &str) -> &str {
    let Some(scheme_end) = url.find("://") else {
        return url;
    };
    let after_host = &url[scheme_end + 3..];
    match after_host.find('/') {
        Some(path_start) => &after_host[path_start..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_host_and_two_segments() {
        assert_eq!(
            next_page_target("https://host/api/v1/items?x=1"),
            "/items?x=1"
        );
    }

    #[test]
    fn keeps_deep_paths_and_query() {
        assert_eq!(
            next_page_target("https://h.example.com/api/v21.3/query/abc123?limit=50&offset=100"),
            "/query/abc123?limit=50&offset=100"
        );
    }

    #[test]
    fn tolerates_missing_query_string() {
        assert_eq!(next_page_target("https://host/api/v1/query/p2"), "/query/p2");
    }

    #[test]
    fn tolerates_relative_input() {
        assert_eq!(next_page_target("/api/v1/query/p2?a=b"), "/query/p2?a=b");
    }

    #[test]
    fn slash_inside_query_is_not_a_segment() {
        assert_eq!(
            next_page_target("https://host/api/v1/items?redirect=/a/b"),
            "/items?redirect=/a/b"
        );
    }

    #[test]
    fn too_few_segments_collapse_to_root() {
        assert_eq!(next_page_target("https://host/api"), "/");
        assert_eq!(next_page_target("https://host"), "/");
    }
}
