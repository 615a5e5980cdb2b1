use crate::{query, Version};
use std::{error, fmt, io};

#[derive(Debug, PartialEq)]
pub(crate) enum ErrorKind {
    InvalidMethod,

    InvalidUrl,
    #[allow(dead_code)]
    Query(query::Error),

    InvalidVersion,
    UnsupportedVersion,

    InvalidHeader,
    TooManyHeaders,
    InvalidContentLength,
    InvalidConnection,

    BodyTooLarge,
    #[allow(dead_code)]
    BodyMismatch {
        expected: usize,
        available: usize,
    },
    #[allow(dead_code)]
    UnexpectedBody(usize),

    TransferEncodingRejected,
    AmbiguousContentLength,

    HostNotFound,
    NotFound,
    Forbidden,

    ServiceUnavailable,
    Io(IoError),
}

macro_rules! http_errors {
    ($($name:ident: $status_code:expr, $len:literal => $json:literal, $html_len:literal => $html:literal; )*) => {
        pub(crate) const fn as_http(
            &self,
            version: Version,
            json: bool,
        ) -> &'static [u8] {
            match (json, self, version) { $(
                (true, Self::$name { .. }, Version::Http11) => concat!(
                    "HTTP/1.1 ", $status_code, "\r\n",
                    "connection: close\r\n",
                    "content-length: ", $len, "\r\n",
                    "content-type: application/json\r\n",
                    "\r\n",
                    $json
                ),
                (false, Self::$name { .. }, Version::Http11) => concat!(
                    "HTTP/1.1 ", $status_code, "\r\n",
                    "connection: close\r\n",
                    "content-length: ", $html_len, "\r\n",
                    "content-type: text/html\r\n",
                    "\r\n",
                    $html
                ),
                (true, Self::$name { .. }, Version::Http10) => concat!(
                    "HTTP/1.0 ", $status_code, "\r\n",
                    "connection: close\r\n",
                    "content-length: ", $len, "\r\n",
                    "content-type: application/json\r\n",
                    "\r\n",
                    $json
                ),
                (false, Self::$name { .. }, Version::Http10) => concat!(
                    "HTTP/1.0 ", $status_code, "\r\n",
                    "connection: close\r\n",
                    "content-length: ", $html_len, "\r\n",
                    "content-type: text/html\r\n",
                    "\r\n",
                    $html
                ),
                (_, Self::$name { .. }, Version::Http09) => concat!(
                    "ERROR: ", stringify!($status_code)
                ),
            )* }.as_bytes()
        }
    };
}

impl ErrorKind {
    http_errors! {
        InvalidMethod: "400 Bad Request", "55"
            => r#"{"error":"Invalid HTTP method","code":"INVALID_METHOD"}"#,
            "77" => "<html><body><h1>400 Bad Request</h1><p>Invalid HTTP method.</p></body></html>";

        InvalidUrl: "400 Bad Request", "51"
            => r#"{"error":"Invalid URL format","code":"INVALID_URL"}"#,
            "76" => "<html><body><h1>400 Bad Request</h1><p>Invalid URL format.</p></body></html>";
        Query: "400 Bad Request", "55"
            => r#"{"error":"Invalid query string","code":"INVALID_QUERY"}"#,
            "78" => "<html><body><h1>400 Bad Request</h1><p>Invalid query string.</p></body></html>";

        InvalidVersion: "400 Bad Request", "57"
            => r#"{"error":"Invalid HTTP version","code":"INVALID_VERSION"}"#,
            "78" => "<html><body><h1>400 Bad Request</h1><p>Invalid HTTP version.</p></body></html>";
        UnsupportedVersion: "505 HTTP Version Not Supported", "67"
            => r#"{"error":"HTTP version not supported","code":"UNSUPPORTED_VERSION"}"#,
            "65" => "<html><body><h1>505 HTTP Version Not Supported</h1></body></html>";

        InvalidHeader: "400 Bad Request", "57"
            => r#"{"error":"Invalid header format","code":"INVALID_HEADER"}"#,
            "79" => "<html><body><h1>400 Bad Request</h1><p>Invalid header format.</p></body></html>";
        TooManyHeaders: "431 Request Header Fields Too Large", "54"
            => r#"{"error":"Too many headers","code":"TOO_MANY_HEADERS"}"#,
            "70" => "<html><body><h1>431 Request Header Fields Too Large</h1></body></html>";
        InvalidContentLength: "400 Bad Request", "66"
            => r#"{"error":"Invalid Content-Length","code":"INVALID_CONTENT_LENGTH"}"#,
            "80" => "<html><body><h1>400 Bad Request</h1><p>Invalid Content-Length.</p></body></html>";
        InvalidConnection: "400 Bad Request", "65"
            => r#"{"error":"Invalid Connection header","code":"INVALID_CONNECTION"}"#,
            "83" => "<html><body><h1>400 Bad Request</h1><p>Invalid Connection header.</p></body></html>";

        BodyTooLarge: "413 Payload Too Large", "58"
            => r#"{"error":"Request body too large","code":"BODY_TOO_LARGE"}"#,
            "56" => "<html><body><h1>413 Payload Too Large</h1></body></html>";
        BodyMismatch: "400 Bad Request", "55"
            => r#"{"error":"Body length mismatch","code":"BODY_MISMATCH"}"#,
            "78" => "<html><body><h1>400 Bad Request</h1><p>Body length mismatch.</p></body></html>";
        UnexpectedBody: "400 Bad Request", "60"
            => r#"{"error":"Unexpected request body","code":"UNEXPECTED_BODY"}"#,
            "81" => "<html><body><h1>400 Bad Request</h1><p>Unexpected request body.</p></body></html>";

        TransferEncodingRejected: "400 Bad Request", "68"
            => r#"{"error":"Transfer-Encoding not accepted","code":"TE_REJECTED"}"#,
            "91" => "<html><body><h1>400 Bad Request</h1><p>Transfer-Encoding is not accepted.</p></body></html>";
        AmbiguousContentLength: "400 Bad Request", "69"
            => r#"{"error":"Ambiguous Content-Length header","code":"AMBIGUOUS_LENGTH"}"#,
            "89" => "<html><body><h1>400 Bad Request</h1><p>Ambiguous Content-Length header.</p></body></html>";

        HostNotFound: "404 Not Found", "51"
            => r#"{"error":"Unknown Host header","code":"HOST_NOT_FOUND"}"#,
            "89" => "<html><body><h1>404 Not Found</h1><p>No virtual host matches this Host.</p></body></html>";
        NotFound: "404 Not Found", "46"
            => r#"{"error":"Resource not found","code":"NOT_FOUND"}"#,
            "48" => "<html><body><h1>404 Not Found</h1></body></html>";
        Forbidden: "403 Forbidden", "43"
            => r#"{"error":"Access forbidden","code":"FORBIDDEN"}"#,
            "48" => "<html><body><h1>403 Forbidden</h1></body></html>";

        ServiceUnavailable: "503 Service Unavailable", "72"
            => r#"{"error":"Service temporarily unavailable","code":"SERVICE_UNAVAILABLE"}"#,
            "58" => "<html><body><h1>503 Service Unavailable</h1></body></html>";
        Io: "503 Service Unavailable", "48"
            => r#"{"error":"I/O error occurred","code":"IO_ERROR"}"#,
            "58" => "<html><body><h1>503 Service Unavailable</h1></body></html>";
    }
}

impl error::Error for ErrorKind {}
impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<query::Error> for ErrorKind {
    fn from(err: query::Error) -> Self {
        ErrorKind::Query(err)
    }
}
impl From<io::Error> for ErrorKind {
    fn from(err: io::Error) -> Self {
        ErrorKind::Io(IoError(err))
    }
}

#[derive(Debug)]
pub(crate) struct IoError(pub(crate) io::Error);

impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

/// A 429 response carries a `Retry-After` computed from the rate limiter's
/// bucket state, so unlike the rest of [`ErrorKind`] it can't be a canned
/// `&'static [u8]` produced by `http_errors!` and is built by hand instead.
pub(crate) fn too_many_requests(version: Version, retry_after_secs: u64, json: bool) -> Vec<u8> {
    let version = match version {
        Version::Http11 => "HTTP/1.1",
        _ => "HTTP/1.0",
    };

    if json {
        let body = format!(
            r#"{{"error":"Too many requests","code":"RATE_LIMITED","retry_after":{retry_after_secs}}}"#
        );
        format!(
            "{version} 429 Too Many Requests\r\n\
             connection: close\r\n\
             retry-after: {retry_after_secs}\r\n\
             content-length: {}\r\n\
             content-type: application/json\r\n\r\n{body}",
            body.len(),
        )
        .into_bytes()
    } else {
        let body = "<html><body><h1>429 Too Many Requests</h1></body></html>";
        format!(
            "{version} 429 Too Many Requests\r\n\
             connection: close\r\n\
             retry-after: {retry_after_secs}\r\n\
             content-length: {}\r\n\
             content-type: text/html\r\n\r\n{body}",
            body.len(),
        )
        .into_bytes()
    }
}
