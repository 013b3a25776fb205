//! HTTP headers for CIM operations over HTTP
//!
//! Content lengths are written as ten zero-padded digits so a transport
//! can patch the real length in place once the body is known.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{BufMut, BytesMut};

use cim::CimName;

use crate::generator::encode_uri_characters;

/// Namespace URI of the CIM HTTP mapping extension header
const CIM_MAPPING_URI: &str = "http://www.dmtf.org/cim/mapping/http/v1.0";

/// Header carrying a human-readable error detail
pub const ERROR_DETAIL_HEADER: &str = "PGErrorDetail";

/// Status line text of a successful response
pub const HTTP_STATUS_OK: &str = "200 OK";

pub const HTTP_STATUS_UNAUTHORIZED: &str = "401 Unauthorized";

/// Request method for CIM operations
///
/// Requests are always sent with `POST`; the mandatory-extension form is
/// still understood when building responses to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Post,
    MPost,
}

/// Everything that goes into the header of a method call request
#[derive(Debug, Clone)]
pub struct MethodCallHeader<'a> {
    pub host: &'a str,
    pub cim_method: &'a CimName,
    /// Target of the call: a local object path or a namespace
    pub cim_object: &'a str,
    /// Complete `Authorization` line without the line terminator
    pub authentication_header: &'a str,
    pub http_method: HttpMethod,
    pub accept_languages: &'a str,
    pub content_languages: &'a str,
    pub content_length: u32,
}

fn put_str(out: &mut BytesMut, text: &str) {
    out.put_slice(text.as_bytes());
}

/// `content-length` line with a fixed-width value
///
/// The header name stays lower case; transports search for it verbatim.
pub fn append_content_length(out: &mut BytesMut, content_length: u32) {
    put_str(out, &format!("content-length: {content_length:010}\r\n"));
}

/// Two-digit prefix of the mandatory extension headers
fn extension_prefix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("{:02}", nanos % 100)
}

pub fn append_method_call_header(out: &mut BytesMut, header: &MethodCallHeader<'_>) {
    let cim_method = encode_uri_characters(header.cim_method.as_str());
    let cim_object = encode_uri_characters(header.cim_object);

    match header.http_method {
        HttpMethod::MPost => out.put_slice(b"M-POST /cimom HTTP/1.1\r\n"),
        HttpMethod::Post => out.put_slice(b"POST /cimom HTTP/1.1\r\n"),
    }
    put_str(out, &format!("HOST: {}\r\n", header.host));
    out.put_slice(b"Content-Type: application/xml; charset=utf-8\r\n");
    append_content_length(out, header.content_length);
    if !header.accept_languages.is_empty() {
        put_str(out, &format!("Accept-Language: {}\r\n", header.accept_languages));
    }
    if !header.content_languages.is_empty() {
        put_str(out, &format!("Content-Language: {}\r\n", header.content_languages));
    }
    out.put_slice(b"TE: chunked, trailers\r\n");

    match header.http_method {
        HttpMethod::MPost => {
            let nn = extension_prefix();
            put_str(out, &format!("Man: {CIM_MAPPING_URI}; ns={nn}\r\n"));
            put_str(out, &format!("{nn}-CIMOperation: MethodCall\r\n"));
            put_str(out, &format!("{nn}-CIMMethod: {cim_method}\r\n"));
            put_str(out, &format!("{nn}-CIMObject: {cim_object}\r\n"));
        }
        HttpMethod::Post => {
            out.put_slice(b"CIMOperation: MethodCall\r\n");
            put_str(out, &format!("CIMMethod: {cim_method}\r\n"));
            put_str(out, &format!("CIMObject: {cim_object}\r\n"));
        }
    }

    if !header.authentication_header.is_empty() {
        put_str(out, header.authentication_header);
        out.put_slice(b"\r\n");
    }
    out.put_slice(b"\r\n");
}

pub fn append_method_response_header(
    out: &mut BytesMut,
    http_method: HttpMethod,
    content_languages: &str,
    content_length: u32,
) {
    put_str(out, &format!("HTTP/1.1 {HTTP_STATUS_OK}\r\n"));
    out.put_slice(b"Content-Type: application/xml; charset=utf-8\r\n");
    append_content_length(out, content_length);
    if !content_languages.is_empty() {
        put_str(out, &format!("Content-Language: {content_languages}\r\n"));
    }
    match http_method {
        HttpMethod::MPost => {
            let nn = extension_prefix();
            out.put_slice(b"Ext:\r\nCache-Control: no-cache\r\n");
            put_str(out, &format!("Man: {CIM_MAPPING_URI}; ns={nn}\r\n"));
            put_str(out, &format!("{nn}-CIMOperation: MethodResponse\r\n\r\n"));
        }
        HttpMethod::Post => out.put_slice(b"CIMOperation: MethodResponse\r\n\r\n"),
    }
}

/// Header-only error response
///
/// ```text
/// HTTP/1.1 400 Bad Request
/// CIMError: <error type>        (when given)
/// PGErrorDetail: <error text>   (when given, URI-encoded)
/// ```
pub fn append_http_error_response_header(
    out: &mut BytesMut,
    status: &str,
    cim_error: &str,
    error_detail: &str,
) {
    put_str(out, &format!("HTTP/1.1 {status}\r\n"));
    if !cim_error.is_empty() {
        put_str(out, &format!("CIMError: {cim_error}\r\n"));
    }
    if !error_detail.is_empty() {
        put_str(
            out,
            &format!("{ERROR_DETAIL_HEADER}: {}\r\n", encode_uri_characters(error_detail)),
        );
    }
    out.put_slice(b"\r\n");
}

/// `401 Unauthorized` response carrying the authentication challenge in
/// `content`
pub fn append_unauthorized_response_header(out: &mut BytesMut, error_detail: &str, content: &str) {
    put_str(out, &format!("HTTP/1.1 {HTTP_STATUS_UNAUTHORIZED}\r\n"));
    if !error_detail.is_empty() {
        put_str(
            out,
            &format!("{ERROR_DETAIL_HEADER}: {}\r\n", encode_uri_characters(error_detail)),
        );
    }
    append_content_length(out, 0);
    put_str(out, content);
    out.put_slice(b"\r\n\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(out: &BytesMut) -> String {
        String::from_utf8(out.to_vec()).unwrap()
    }

    #[test]
    fn test_method_call_header() {
        let method = CimName::new("EnumerateInstances").unwrap();
        let mut out = BytesMut::new();
        append_method_call_header(
            &mut out,
            &MethodCallHeader {
                host: "localhost:5988",
                cim_method: &method,
                cim_object: "root/cimv2",
                authentication_header: "Authorization: Basic dXNlcg==",
                http_method: HttpMethod::Post,
                accept_languages: "",
                content_languages: "en-US",
                content_length: 1234,
            },
        );
        assert_eq!(
            text(&out),
            "POST /cimom HTTP/1.1\r\n\
             HOST: localhost:5988\r\n\
             Content-Type: application/xml; charset=utf-8\r\n\
             content-length: 0000001234\r\n\
             Content-Language: en-US\r\n\
             TE: chunked, trailers\r\n\
             CIMOperation: MethodCall\r\n\
             CIMMethod: EnumerateInstances\r\n\
             CIMObject: root%2Fcimv2\r\n\
             Authorization: Basic dXNlcg==\r\n\
             \r\n"
        );
    }

    #[test]
    fn test_mpost_prefixes_extension_headers() {
        let method = CimName::new("GetClass").unwrap();
        let mut out = BytesMut::new();
        append_method_call_header(
            &mut out,
            &MethodCallHeader {
                host: "h",
                cim_method: &method,
                cim_object: "root",
                authentication_header: "",
                http_method: HttpMethod::MPost,
                accept_languages: "",
                content_languages: "",
                content_length: 0,
            },
        );
        let text = text(&out);
        assert!(text.starts_with("M-POST /cimom HTTP/1.1\r\n"));
        let man = text.lines().find(|l| l.starts_with("Man: ")).unwrap();
        let nn = &man[man.len() - 2..];
        assert!(text.contains(&format!("{nn}-CIMOperation: MethodCall\r\n")));
        assert!(text.ends_with("-CIMObject: root\r\n\r\n"));
    }

    #[test]
    fn test_method_response_header() {
        let mut out = BytesMut::new();
        append_method_response_header(&mut out, HttpMethod::Post, "", 0);
        assert_eq!(
            text(&out),
            "HTTP/1.1 200 OK\r\n\
             Content-Type: application/xml; charset=utf-8\r\n\
             content-length: 0000000000\r\n\
             CIMOperation: MethodResponse\r\n\r\n"
        );
    }

    #[test]
    fn test_error_headers() {
        let mut out = BytesMut::new();
        append_http_error_response_header(
            &mut out,
            "400 Bad Request",
            "request-not-valid",
            "bad header: x",
        );
        assert_eq!(
            text(&out),
            "HTTP/1.1 400 Bad Request\r\n\
             CIMError: request-not-valid\r\n\
             PGErrorDetail: bad%20header%3A%20x\r\n\r\n"
        );

        let mut out = BytesMut::new();
        append_unauthorized_response_header(&mut out, "", "WWW-Authenticate: Basic realm=\"h\"");
        assert_eq!(
            text(&out),
            "HTTP/1.1 401 Unauthorized\r\n\
             content-length: 0000000000\r\n\
             WWW-Authenticate: Basic realm=\"h\"\r\n\r\n"
        );
    }
}
