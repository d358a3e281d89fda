use std::time::Duration;

use time::OffsetDateTime;

use actix_web::dev::ServiceResponse;
use actix_web::http::header::HeaderMap;
use actix_web::http::{Method, StatusCode};

/// A finished HTTP exchange handed over by the web framework.
///
/// Request and response are always present; the principal and the elapsed
/// time are only known when the framework recorded them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRecord {
    pub timestamp: OffsetDateTime,
    pub request: Request,
    pub response: Response,
    pub principal: Option<Principal>,
    pub time_taken: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Request URI exactly as captured, e.g. `https://example.com/path?q=1`.
    pub uri: String,
    pub remote_address: Option<String>,
    pub method: Method,
    pub headers: Headers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Headers,
}

/// Authenticated user associated with the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
}

impl ExchangeRecord {
    pub fn new(timestamp: OffsetDateTime, request: Request, response: Response) -> Self {
        ExchangeRecord {
            timestamp,
            request,
            response,
            principal: None,
            time_taken: None,
        }
    }

    pub fn with_principal(mut self, name: impl Into<String>) -> Self {
        self.principal = Some(Principal { name: name.into() });
        self
    }

    pub fn with_time_taken(mut self, time_taken: Duration) -> Self {
        self.time_taken = Some(time_taken);
        self
    }

    /// Build a record from a finished actix-web response.
    ///
    /// An absolute request URI is taken as-is; otherwise the URL is reassembled
    /// from the connection info (scheme and host) and the request URI. The peer
    /// IP becomes the remote address. actix-web carries no principal, so none is
    /// set.
    pub fn from_service_response<B>(
        res: &ServiceResponse<B>,
        timestamp: OffsetDateTime,
        time_taken: Option<Duration>,
    ) -> Self {
        let req = res.request();
        let (uri, remote_address) = {
            let conn = req.connection_info();
            let uri = if req.uri().scheme().is_some() {
                req.uri().to_string()
            } else {
                format!("{}://{}{}", conn.scheme(), conn.host(), req.uri())
            };
            (uri, conn.peer_addr().map(|addr| addr.to_string()))
        };

        ExchangeRecord {
            timestamp,
            request: Request {
                uri,
                remote_address,
                method: req.method().clone(),
                headers: req.headers().into(),
            },
            response: Response {
                status: res.status(),
                headers: res.headers().into(),
            },
            principal: None,
            time_taken,
        }
    }
}

impl Request {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Request {
            uri: uri.into(),
            remote_address: None,
            method,
            headers: Headers::new(),
        }
    }

    pub fn with_remote_address(mut self, addr: impl Into<String>) -> Self {
        self.remote_address = Some(addr.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Response {
            status,
            headers: Headers::new(),
        }
    }
}

/// Header multimap.
///
/// Names are matched ASCII-case-insensitively and keep the spelling of their
/// first insertion. Values of one name stay in insertion order, so
/// [`first`](Headers::first) returns the earliest value seen for that name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, Vec<String>)>);

impl Headers {
    pub fn new() -> Self {
        Headers(Vec::new())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Add `value` after any existing values of `name`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => self.0[idx].1.push(value.into()),
            None => self.0.push((name, vec![value.into()])),
        }
    }

    /// Replace every value of `name` with `values`.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => self.0[idx].1 = values,
            None => self.0.push((name, values)),
        }
    }

    /// All values of `name`, empty when the header is absent.
    pub fn get(&self, name: &str) -> &[String] {
        match self.position(name) {
            Some(idx) => &self.0[idx].1,
            None => &[],
        }
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).first().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        !self.get(name).is_empty()
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.append(k, v);
        }
        headers
    }
}

impl From<&HeaderMap> for Headers {
    fn from(map: &HeaderMap) -> Self {
        // Values that are not visible ASCII are dropped rather than blanked.
        map.iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};
    use actix_web::{HttpResponse, test::TestRequest};
    use time::macros::datetime;

    #[test]
    fn test_headers_case_insensitive_lookup() {
        let mut headers = Headers::new();
        headers.append("User-Agent", "mock");
        headers.append("user-agent", "second");
        headers.append("Referer", "https://google.com");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("USER-AGENT"), ["mock", "second"]);
        assert_eq!(headers.first("user-agent"), Some("mock"));
        assert_eq!(headers.first("referer"), Some("https://google.com"));
        assert_eq!(headers.first("x-missing"), None);
        assert!(headers.get("x-missing").is_empty());
        assert!(!headers.contains("x-missing"));
    }

    #[test]
    fn test_headers_insert_replaces_values() {
        let mut headers: Headers = [("accept", "text/html"), ("accept", "*/*")]
            .into_iter()
            .collect();
        headers.insert("Accept", vec!["application/json".to_string()]);

        assert_eq!(headers.get("accept"), ["application/json"]);

        // An empty value list counts as absent for lookups.
        headers.insert("referer", Vec::new());
        assert!(!headers.contains("referer"));
        assert_eq!(headers.first("referer"), None);
    }

    #[test]
    fn test_headers_from_map_skips_non_text_values() {
        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_static("user-agent"),
            HeaderValue::from_bytes(b"caf\xe9").unwrap(),
        );
        map.append(
            HeaderName::from_static("referer"),
            HeaderValue::from_bytes(b"\xff").unwrap(),
        );
        map.append(
            HeaderName::from_static("referer"),
            HeaderValue::from_static("https://google.com"),
        );

        let headers = Headers::from(&map);
        assert!(!headers.contains("user-agent"));
        assert_eq!(headers.get("referer"), ["https://google.com"]);
    }

    #[test]
    fn test_record_builders() {
        let record = ExchangeRecord::new(
            datetime!(2024-05-16 00:00:00 UTC),
            Request::new(Method::GET, "https://example.com")
                .with_remote_address("127.0.0.1")
                .with_header("user-agent", "mock"),
            Response::new(StatusCode::OK),
        )
        .with_principal("admin")
        .with_time_taken(Duration::from_secs(1));

        assert_eq!(record.request.uri, "https://example.com");
        assert_eq!(record.request.remote_address.as_deref(), Some("127.0.0.1"));
        assert_eq!(record.principal.map(|p| p.name), Some("admin".to_string()));
        assert_eq!(record.time_taken, Some(Duration::from_millis(1000)));
    }

    #[test]
    fn test_from_service_response() {
        let req = TestRequest::default()
            .method(Method::POST)
            .uri("/test?param=value")
            .peer_addr("127.0.0.1:52000".parse().unwrap())
            .insert_header(("user-agent", "test-agent"))
            .insert_header(("referer", "https://actix.rs"))
            .to_http_request();

        let response = HttpResponse::NotFound()
            .insert_header(("content-type", "application/json"))
            .finish();
        let res = ServiceResponse::new(req, response);

        let ts = datetime!(2024-05-16 00:00:00 UTC);
        let record =
            ExchangeRecord::from_service_response(&res, ts, Some(Duration::from_millis(42)));

        assert_eq!(record.timestamp, ts);
        assert_eq!(record.request.method, Method::POST);
        assert_eq!(record.request.uri, "http://localhost:8080/test?param=value");
        assert_eq!(record.request.remote_address.as_deref(), Some("127.0.0.1"));
        assert_eq!(record.request.headers.first("user-agent"), Some("test-agent"));
        assert_eq!(record.request.headers.first("Referer"), Some("https://actix.rs"));
        assert_eq!(record.response.status, StatusCode::NOT_FOUND);
        assert_eq!(
            record.response.headers.first("content-type"),
            Some("application/json")
        );
        assert_eq!(record.principal, None);
        assert_eq!(record.time_taken, Some(Duration::from_millis(42)));
    }

    #[test]
    fn test_from_service_response_absolute_uri() {
        let req = TestRequest::default()
            .uri("https://example.com/test?param=value")
            .to_http_request();
        let res = ServiceResponse::new(req, HttpResponse::Ok().finish());

        let record =
            ExchangeRecord::from_service_response(&res, datetime!(2024-05-16 00:00:00 UTC), None);
        assert_eq!(record.request.uri, "https://example.com/test?param=value");
        assert_eq!(record.request.remote_address, None);
        assert_eq!(record.time_taken, None);
    }
}
