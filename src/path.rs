//! Helpers for the path half of a URL.

use regex::Regex;

use crate::error::Result;

/// Returns the last portion of a path, like the Unix `basename` command.
///
/// Any query string is trimmed, and `suffix` is removed if the result
/// ends with it exactly.
///
/// ```
/// use nested_qs::path::basename;
///
/// assert_eq!(basename("/path/to/file.txt?query=string", None), "file.txt");
/// assert_eq!(basename("/path/to/file.txt", Some(".txt")), "file");
/// assert_eq!(basename("/path/to/file/", None), "");
/// ```
pub fn basename<'a>(path: &'a str, suffix: Option<&str>) -> &'a str {
    let name = path.rsplit_once('/').map_or(path, |(_, name)| name);
    let name = name.split_once('?').map_or(name, |(name, _)| name);
    match suffix {
        Some(suffix) => name.strip_suffix(suffix).unwrap_or(name),
        None => name,
    }
}

/// A route with `:name` parameters, turned into a pattern that matches
/// concrete paths.
///
/// ```
/// use nested_qs::path::ParamsRoute;
///
/// let route = ParamsRoute::from_path("/path/:id/index").unwrap().unwrap();
/// assert_eq!(route.pattern().as_str(), "/path/.*?/index");
/// assert_eq!(route.params(), ["id"]);
/// assert!(route.is_match("/path/42/index"));
///
/// assert!(ParamsRoute::from_path("/path/index/layout").unwrap().is_none());
/// ```
#[derive(Clone, Debug)]
pub struct ParamsRoute {
    pattern: Regex,
    params: Vec<String>,
}

impl ParamsRoute {
    /// Scans `path` for `:name` parameters, each running up to the next
    /// `/` or the end of the path.
    ///
    /// Returns `Ok(None)` when the path has no parameters. Otherwise every
    /// parameter (and its name) is replaced by a lazy wildcard `.*?` and
    /// the literal text around them is escaped.
    pub fn from_path(path: &str) -> Result<Option<Self>> {
        let mut pattern = String::with_capacity(path.len() + 8);
        let mut params = Vec::new();
        let mut rest = path;

        while let Some(colon) = rest.find(':') {
            pattern.push_str(&regex::escape(&rest[..colon]));
            let after = &rest[colon + 1..];
            let (name, remainder) = match after.find('/') {
                Some(slash) => (&after[..slash], &after[slash..]),
                None => (after, ""),
            };
            params.push(name.to_owned());
            pattern.push_str(".*?");
            // the terminating `/` stays in the pattern
            match remainder.strip_prefix('/') {
                Some(remainder) => {
                    pattern.push('/');
                    rest = remainder;
                }
                None => rest = remainder,
            }
        }

        if params.is_empty() {
            return Ok(None);
        }
        pattern.push_str(&regex::escape(rest));

        Ok(Some(ParamsRoute {
            pattern: Regex::new(&pattern)?,
            params,
        }))
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Parameter names, in order of appearance.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}

#[cfg(test)]
mod test {
    use super::{basename, ParamsRoute};

    #[test]
    fn basename_without_separator() {
        assert_eq!(basename("file.txt", None), "file.txt");
        assert_eq!(basename("", None), "");
    }

    #[test]
    fn basename_truncates_at_first_question_mark() {
        assert_eq!(basename("/a/b?x=1?y=2", None), "b");
        assert_eq!(basename("/a/?x=1", None), "");
    }

    #[test]
    fn basename_suffix_is_exact() {
        assert_eq!(basename("/a/file.tar.gz", Some(".gz")), "file.tar");
        assert_eq!(basename("/a/file.tar.gz", Some(".tar")), "file.tar.gz");
        assert_eq!(basename("/a/.txt", Some(".txt")), "");
        assert_eq!(basename("/a/file", Some("")), "file");
    }

    #[test]
    fn route_without_params() {
        assert!(ParamsRoute::from_path("").unwrap().is_none());
        assert!(ParamsRoute::from_path("/path/index/layout").unwrap().is_none());
    }

    #[test]
    fn route_with_trailing_param() {
        let route = ParamsRoute::from_path("/path/:id/:uid").unwrap().unwrap();
        assert_eq!(route.pattern().as_str(), "/path/.*?/.*?");
        assert_eq!(route.params(), ["id", "uid"]);
    }

    #[test]
    fn route_with_params_between_literals() {
        let route = ParamsRoute::from_path("/path/:id/:uid/index").unwrap().unwrap();
        assert_eq!(route.pattern().as_str(), "/path/.*?/.*?/index");
        assert_eq!(route.params(), ["id", "uid"]);
        assert!(route.is_match("/path/1/2/index"));
        assert!(!route.is_match("/other/1/2/layout"));
    }

    #[test]
    fn route_literals_are_escaped() {
        let route = ParamsRoute::from_path("/v1.0/:id").unwrap().unwrap();
        assert_eq!(route.pattern().as_str(), r"/v1\.0/.*?");
        assert!(!route.is_match("/v1x0/7"));
    }
}
