use std::str::FromStr;

use percent_encoding::percent_decode_str;

/// An HTTP request method. Anything but GET is carried around verbatim so
/// the handler can refuse it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Other(String),
}

/// A parsed HTTP request line.
#[derive(Debug, PartialEq)]
pub struct Request {
    method: Method,
    path: String,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum RequestError {
    #[error("The request line exceeded 8192 bytes.")]
    TooLong,
    #[error("A request line must be terminated by CRLF.")]
    UnterminatedLine,
    #[error("A request line is `METHOD target HTTP-version`.")]
    MalformedRequestLine,
    #[error("Unrecognised protocol version `{0}`.")]
    UnsupportedVersion(String),
    #[error("The request target is not valid percent-encoded UTF-8.")]
    BadEscape,
}

impl Request {
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The percent-decoded path component of the request target, with any
    /// query or fragment stripped. `.`/`..`/empty segments are preserved;
    /// making sense of them is the resolver's business.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl FromStr for Request {
    type Err = RequestError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > 8192 {
            return Err(RequestError::TooLong);
        }
        let line = s
            .strip_suffix("\r\n")
            .ok_or(RequestError::UnterminatedLine)?;

        let mut tokens = line.split_ascii_whitespace();
        let (method, target, version) = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(m), Some(t), Some(v)) if tokens.next().is_none() => (m, t, v),
            _ => return Err(RequestError::MalformedRequestLine),
        };
        if !version.starts_with("HTTP/") {
            return Err(RequestError::UnsupportedVersion(version.into()));
        }

        let method = match method {
            "GET" => Method::Get,
            other => Method::Other(other.into()),
        };
        let raw_path = target
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let path = percent_decode_str(raw_path)
            .decode_utf8()
            .map_err(|_| RequestError::BadEscape)?
            .into_owned();

        Ok(Request { method, path })
    }
}

#[cfg(test)]
mod an_invalid_request_is_rejected {
    use super::*;
    use rstest::rstest;

    #[test]
    fn when_its_request_line_is_over_8192_bytes() {
        let line = format!("GET /{} HTTP/1.1\r\n", "a".repeat(8192 - 16));
        assert!(Request::from_str(&line).is_ok());

        let line = format!("GET /{} HTTP/1.1\r\n", "a".repeat(8193 - 16));
        let parsed = Request::from_str(&line);

        assert!(matches!(parsed, Err(RequestError::TooLong)));
    }

    #[rstest]
    #[case("GET / HTTP/1.1\r")]
    #[case("GET / HTTP/1.1\n")]
    #[case("GET / HTTP/1.1")]
    fn when_not_terminated_by_crlf(#[case] line: &str) {
        let parsed = Request::from_str(line);
        assert!(matches!(parsed, Err(RequestError::UnterminatedLine)));
    }

    #[rstest]
    #[case::no_version("GET /\r\n")]
    #[case::no_target("GET\r\n")]
    #[case::empty("\r\n")]
    #[case::too_many_tokens("GET / HTTP/1.1 extra\r\n")]
    fn when_the_request_line_is_malformed(#[case] line: &str) {
        let parsed = Request::from_str(line);
        assert!(matches!(parsed, Err(RequestError::MalformedRequestLine)));
    }

    #[test]
    fn when_the_protocol_is_not_http() {
        let parsed = Request::from_str("GET / GOPHER/0.1\r\n");
        assert!(matches!(parsed, Err(RequestError::UnsupportedVersion(_))));
    }

    #[test]
    fn when_an_escape_decodes_to_invalid_utf8() {
        let parsed = Request::from_str("GET /%ff%fe HTTP/1.1\r\n");
        assert!(matches!(parsed, Err(RequestError::BadEscape)));
    }
}
