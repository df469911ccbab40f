use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("document location {0:?} is not an absolute URL")]
    InvalidLocation(String),
    #[error("failed to resolve {target:?} against {base}: {source}")]
    Join {
        target: String,
        base: String,
        #[source]
        source: url::ParseError,
    },
}

/// Strip `base` from the front of `url`, leaving anything else untouched.
pub fn normalize(url: &str, base: &str) -> String {
    if base.is_empty() {
        return url.to_string();
    }
    match url.strip_prefix(base) {
        Some(rest) => rest.to_string(),
        None => url.to_string(),
    }
}

pub fn absolute(url: &str, base: &str) -> String {
    format!("{base}{}", normalize(url, base))
}

/// Resolve a request path into a fetchable URL relative to the document location.
pub fn resolve(href: &str, target: &str) -> Result<Url, ResolveError> {
    if let Ok(url) = Url::parse(target) {
        return Ok(url);
    }

    let base = Url::parse(href).map_err(|_| ResolveError::InvalidLocation(href.to_string()))?;
    base.join(target).map_err(|source| ResolveError::Join {
        target: target.to_string(),
        base: href.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://myinvoice.org/";

    #[test]
    fn strips_known_prefix() {
        assert_eq!(normalize("http://myinvoice.org/dashboard/1", BASE), "dashboard/1");
        assert_eq!(normalize("dashboard/1", BASE), "dashboard/1");
    }

    #[test]
    fn prefix_only_strips_once() {
        assert_eq!(normalize("/app/app/users", "/app"), "/app/users");
    }

    #[test]
    fn empty_base_is_identity() {
        assert_eq!(normalize("/users", ""), "/users");
        assert_eq!(absolute("/users", ""), "/users");
    }

    #[test]
    fn absolute_prepends_base_once() {
        assert_eq!(absolute("users", BASE), "http://myinvoice.org/users");
        assert_eq!(
            absolute("http://myinvoice.org/users", BASE),
            "http://myinvoice.org/users"
        );
    }

    #[test]
    fn normalize_absolute_round_trip() {
        let bases = ["", "/", "/app", "http://myinvoice.org/", "x"];
        let urls = [
            "",
            "/",
            "users",
            "/app/users",
            "/appusers",
            "http://myinvoice.org/users?page=2",
            "xx",
            "#frag",
        ];
        for base in bases {
            for url in urls {
                assert_eq!(
                    normalize(&absolute(url, base), base),
                    normalize(url, base),
                    "url={url:?} base={base:?}"
                );
            }
        }
    }

    #[test]
    fn malformed_input_passes_through() {
        assert_eq!(normalize("::not a url::", BASE), "::not a url::");
    }

    #[test]
    fn resolves_relative_paths_against_location() {
        let url = resolve("http://localhost:8080/app/#users", "/app/users").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/app/users");
    }

    #[test]
    fn keeps_already_absolute_targets() {
        let url = resolve("about:blank", "https://example.com/a").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a");
    }

    #[test]
    fn rejects_relative_location() {
        assert!(matches!(
            resolve("/relative", "users"),
            Err(ResolveError::InvalidLocation(_))
        ));
    }
}
