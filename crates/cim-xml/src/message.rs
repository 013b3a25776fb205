//! CIM-XML message envelopes and complete request/response formatters

use std::sync::atomic::{AtomicU32, Ordering};

use bytes::{BufMut, BytesMut};
use tracing::debug;

use cim::{
    CimName, CimValue, Class, Instance, NamespaceName, ObjectPath, PropertyList, QualifierDecl,
    StatusCode,
};

use crate::error::Result;
use crate::http::{
    append_http_error_response_header, append_method_call_header, append_method_response_header,
    HttpMethod, MethodCallHeader,
};
use crate::writer::{
    append_class_element, append_class_name_element, append_error_element,
    append_instance_element, append_instance_name_element, append_local_namespace_path_element,
    append_local_object_path_element, append_param_value_element, append_qualifier_decl_element,
    append_value_element, append_value_named_instance_element,
};

/// Monotonic source of message ids
#[derive(Debug)]
pub struct MessageIdFactory {
    next: AtomicU32,
}

impl MessageIdFactory {
    pub const fn new(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }

    pub fn next_id(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

static MESSAGE_IDS: MessageIdFactory = MessageIdFactory::new(1000);

/// Next process-wide message id; the first one issued is `"1000"`
pub fn next_message_id() -> String {
    MESSAGE_IDS.next_id().to_string()
}

/// One argument of an extrinsic method call
#[derive(Debug, Clone, PartialEq)]
pub struct ParamValue {
    pub name: String,
    pub value: CimValue,
    /// Write the `PARAMTYPE` attribute
    pub is_typed: bool,
}

impl ParamValue {
    pub fn new(name: impl Into<String>, value: impl Into<CimValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            is_typed: true,
        }
    }
}

/// Error carried in an `<ERROR>` element
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub code: StatusCode,
    pub description: String,
    pub instances: Vec<Instance>,
    pub content_languages: String,
}

impl ErrorResponse {
    pub fn new(code: StatusCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            instances: Vec::new(),
            content_languages: String::new(),
        }
    }
}

/// Connection-level parameters of a request
#[derive(Debug, Clone, Default)]
pub struct RequestContext<'a> {
    pub host: &'a str,
    pub message_id: &'a str,
    pub http_method: HttpMethod,
    pub authentication_header: &'a str,
    pub accept_languages: &'a str,
    pub content_languages: &'a str,
}

// ---------------------------------------------------------------------------
// Envelope elements
// ---------------------------------------------------------------------------

pub fn append_message_element_begin(out: &mut BytesMut, message_id: &str) {
    out.put_slice(
        b"<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n\
          <CIM CIMVERSION=\"2.0\" DTDVERSION=\"2.0\">\n\
          <MESSAGE ID=\"",
    );
    out.put_slice(message_id.as_bytes());
    out.put_slice(b"\" PROTOCOLVERSION=\"1.0\">\n");
}

pub fn append_message_element_end(out: &mut BytesMut) {
    out.put_slice(b"</MESSAGE>\n</CIM>\n");
}

fn append_named_begin(out: &mut BytesMut, element: &str, name: &str) {
    out.put_u8(b'<');
    out.put_slice(element.as_bytes());
    out.put_slice(b" NAME=\"");
    out.put_slice(name.as_bytes());
    out.put_slice(b"\">\n");
}

fn append_end(out: &mut BytesMut, element: &str) {
    out.put_slice(b"</");
    out.put_slice(element.as_bytes());
    out.put_slice(b">\n");
}

pub fn append_simple_req_element_begin(out: &mut BytesMut) {
    out.put_slice(b"<SIMPLEREQ>\n");
}

pub fn append_simple_req_element_end(out: &mut BytesMut) {
    append_end(out, "SIMPLEREQ");
}

pub fn append_simple_rsp_element_begin(out: &mut BytesMut) {
    out.put_slice(b"<SIMPLERSP>\n");
}

pub fn append_simple_rsp_element_end(out: &mut BytesMut) {
    append_end(out, "SIMPLERSP");
}

pub fn append_method_call_element_begin(out: &mut BytesMut, name: &CimName) {
    append_named_begin(out, "METHODCALL", name.as_str());
}

pub fn append_method_call_element_end(out: &mut BytesMut) {
    append_end(out, "METHODCALL");
}

pub fn append_imethod_call_element_begin(out: &mut BytesMut, name: &CimName) {
    append_named_begin(out, "IMETHODCALL", name.as_str());
}

pub fn append_imethod_call_element_end(out: &mut BytesMut) {
    append_end(out, "IMETHODCALL");
}

pub fn append_method_response_element_begin(out: &mut BytesMut, name: &CimName) {
    append_named_begin(out, "METHODRESPONSE", name.as_str());
}

pub fn append_method_response_element_end(out: &mut BytesMut) {
    append_end(out, "METHODRESPONSE");
}

pub fn append_imethod_response_element_begin(out: &mut BytesMut, name: &CimName) {
    append_named_begin(out, "IMETHODRESPONSE", name.as_str());
}

pub fn append_imethod_response_element_end(out: &mut BytesMut) {
    append_end(out, "IMETHODRESPONSE");
}

pub fn append_iparam_value_element_begin(out: &mut BytesMut, name: &str) {
    append_named_begin(out, "IPARAMVALUE", name);
}

pub fn append_iparam_value_element_end(out: &mut BytesMut) {
    append_end(out, "IPARAMVALUE");
}

pub fn append_ireturn_value_element_begin(out: &mut BytesMut) {
    out.put_slice(b"<IRETURNVALUE>\n");
}

pub fn append_ireturn_value_element_end(out: &mut BytesMut) {
    append_end(out, "IRETURNVALUE");
}

// ---------------------------------------------------------------------------
// Intrinsic method parameters
// ---------------------------------------------------------------------------

pub fn append_boolean_iparameter(out: &mut BytesMut, name: &str, flag: bool) {
    append_iparam_value_element_begin(out, name);
    out.put_slice(if flag {
        b"<VALUE>TRUE</VALUE>\n".as_slice()
    } else {
        b"<VALUE>FALSE</VALUE>\n".as_slice()
    });
    append_iparam_value_element_end(out);
}

pub fn append_class_name_iparameter(out: &mut BytesMut, name: &str, class_name: &CimName) {
    append_iparam_value_element_begin(out, name);
    append_class_name_element(out, class_name);
    append_iparam_value_element_end(out);
}

pub fn append_instance_name_iparameter(
    out: &mut BytesMut,
    name: &str,
    instance_name: &ObjectPath,
) -> Result<()> {
    append_iparam_value_element_begin(out, name);
    append_instance_name_element(out, instance_name)?;
    append_iparam_value_element_end(out);
    Ok(())
}

/// Class name for a keyless path, instance name otherwise
pub fn append_object_name_iparameter(
    out: &mut BytesMut,
    name: &str,
    object_name: &ObjectPath,
) -> Result<()> {
    if object_name.key_bindings().is_empty() {
        append_class_name_iparameter(out, name, object_name.class_name());
        Ok(())
    } else {
        append_instance_name_iparameter(out, name, object_name)
    }
}

pub fn append_class_iparameter(out: &mut BytesMut, name: &str, class: &Class) -> Result<()> {
    append_iparam_value_element_begin(out, name);
    append_class_element(out, class)?;
    append_iparam_value_element_end(out);
    Ok(())
}

pub fn append_instance_iparameter(
    out: &mut BytesMut,
    name: &str,
    instance: &Instance,
) -> Result<()> {
    append_iparam_value_element_begin(out, name);
    append_instance_element(out, instance, true, true, &PropertyList::all())?;
    append_iparam_value_element_end(out);
    Ok(())
}

pub fn append_named_instance_iparameter(
    out: &mut BytesMut,
    name: &str,
    instance: &Instance,
) -> Result<()> {
    append_iparam_value_element_begin(out, name);
    append_value_named_instance_element(out, instance, true, true, &PropertyList::all())?;
    append_iparam_value_element_end(out);
    Ok(())
}

pub fn append_property_name_iparameter(out: &mut BytesMut, property_name: &CimName) {
    append_iparam_value_element_begin(out, "PropertyName");
    out.put_slice(b"<VALUE>");
    out.put_slice(property_name.as_str().as_bytes());
    out.put_slice(b"</VALUE>\n");
    append_iparam_value_element_end(out);
}

pub fn append_property_value_iparameter(
    out: &mut BytesMut,
    name: &str,
    value: &CimValue,
) -> Result<()> {
    append_iparam_value_element_begin(out, name);
    append_value_element(out, value)?;
    append_iparam_value_element_end(out);
    Ok(())
}

/// `PropertyList` parameter; a null list is an empty `IPARAMVALUE`
pub fn append_property_list_iparameter(out: &mut BytesMut, property_list: &PropertyList) {
    append_iparam_value_element_begin(out, "PropertyList");
    if !property_list.is_null() {
        out.put_slice(b"<VALUE.ARRAY>\n");
        for name in property_list.names() {
            out.put_slice(b"<VALUE>");
            out.put_slice(name.as_str().as_bytes());
            out.put_slice(b"</VALUE>\n");
        }
        out.put_slice(b"</VALUE.ARRAY>\n");
    }
    append_iparam_value_element_end(out);
}

pub fn append_qualifier_declaration_iparameter(
    out: &mut BytesMut,
    name: &str,
    decl: &QualifierDecl,
) -> Result<()> {
    append_iparam_value_element_begin(out, name);
    append_qualifier_decl_element(out, decl)?;
    append_iparam_value_element_end(out);
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatters
// ---------------------------------------------------------------------------

/// Prepend a request header announcing the exact body length
fn with_request_header(
    ctx: &RequestContext<'_>,
    method: &CimName,
    cim_object: &str,
    body: BytesMut,
) -> BytesMut {
    let mut out = BytesMut::with_capacity(body.len() + 512);
    append_method_call_header(
        &mut out,
        &MethodCallHeader {
            host: ctx.host,
            cim_method: method,
            cim_object,
            authentication_header: ctx.authentication_header,
            http_method: ctx.http_method,
            accept_languages: ctx.accept_languages,
            content_languages: ctx.content_languages,
            content_length: body.len() as u32,
        },
    );
    out.put_slice(&body);
    out
}

/// Complete extrinsic method call request
///
/// The target path is sent relative to `namespace` with its host removed.
pub fn format_simple_method_req_message(
    ctx: &RequestContext<'_>,
    namespace: &NamespaceName,
    path: &ObjectPath,
    method_name: &CimName,
    parameters: &[ParamValue],
) -> Result<BytesMut> {
    let mut local_path = path.clone();
    local_path.set_namespace(Some(namespace.clone()));
    local_path.set_host("");

    let mut body = BytesMut::new();
    append_message_element_begin(&mut body, ctx.message_id);
    append_simple_req_element_begin(&mut body);
    append_method_call_element_begin(&mut body, method_name);
    append_local_object_path_element(&mut body, &local_path)?;
    for parameter in parameters {
        append_param_value_element(
            &mut body,
            &parameter.name,
            &parameter.value,
            parameter.is_typed,
        )?;
    }
    append_method_call_element_end(&mut body);
    append_simple_req_element_end(&mut body);
    append_message_element_end(&mut body);

    debug!(method = %method_name, id = ctx.message_id, size = body.len(), "method request");
    Ok(with_request_header(
        ctx,
        method_name,
        &local_path.to_string(),
        body,
    ))
}

/// Complete intrinsic method call request; `body` holds the
/// `IPARAMVALUE` elements
pub fn format_simple_imethod_req_message(
    ctx: &RequestContext<'_>,
    namespace: &NamespaceName,
    imethod_name: &CimName,
    body: &[u8],
) -> BytesMut {
    let mut message = BytesMut::with_capacity(body.len() + 256);
    append_message_element_begin(&mut message, ctx.message_id);
    append_simple_req_element_begin(&mut message);
    append_imethod_call_element_begin(&mut message, imethod_name);
    append_local_namespace_path_element(&mut message, namespace);
    message.put_slice(body);
    append_imethod_call_element_end(&mut message);
    append_simple_req_element_end(&mut message);
    append_message_element_end(&mut message);

    debug!(method = %imethod_name, id = ctx.message_id, size = message.len(), "intrinsic request");
    with_request_header(ctx, imethod_name, namespace.as_str(), message)
}

/// One chunk of an extrinsic method response
///
/// The first chunk carries the header (with a zero content length to be
/// filled in by the transport) and the opening elements; the last chunk
/// closes them.
pub fn format_simple_method_rsp_message(
    method_name: &CimName,
    message_id: &str,
    http_method: HttpMethod,
    content_languages: &str,
    body: &[u8],
    is_first: bool,
    is_last: bool,
) -> BytesMut {
    let mut out = BytesMut::with_capacity(body.len() + 512);
    if is_first {
        append_method_response_header(&mut out, http_method, content_languages, 0);
        append_message_element_begin(&mut out, message_id);
        append_simple_rsp_element_begin(&mut out);
        append_method_response_element_begin(&mut out, method_name);
    }
    out.put_slice(body);
    if is_last {
        append_method_response_element_end(&mut out);
        append_simple_rsp_element_end(&mut out);
        append_message_element_end(&mut out);
    }
    out
}

/// One chunk of an intrinsic method response
///
/// `<IRETURNVALUE>` is opened when the first chunk has data or more chunks
/// follow, and closed when the last chunk has data or earlier chunks were
/// sent. `return_params` follow the return value in the last chunk.
#[allow(clippy::too_many_arguments)]
pub fn format_simple_imethod_rsp_message(
    imethod_name: &CimName,
    message_id: &str,
    http_method: HttpMethod,
    content_languages: &str,
    return_params: &[u8],
    body: &[u8],
    is_first: bool,
    is_last: bool,
) -> BytesMut {
    let mut out = BytesMut::with_capacity(body.len() + return_params.len() + 512);
    if is_first {
        append_method_response_header(&mut out, http_method, content_languages, 0);
        append_message_element_begin(&mut out, message_id);
        append_simple_rsp_element_begin(&mut out);
        append_imethod_response_element_begin(&mut out, imethod_name);
        if !body.is_empty() || !is_last {
            append_ireturn_value_element_begin(&mut out);
        }
    }
    out.put_slice(body);
    if is_last {
        if !body.is_empty() || !is_first {
            append_ireturn_value_element_end(&mut out);
        }
        out.put_slice(return_params);
        append_imethod_response_element_end(&mut out);
        append_simple_rsp_element_end(&mut out);
        append_message_element_end(&mut out);
    }
    out
}

fn format_error_rsp_message(
    response_element: &str,
    method_name: &CimName,
    message_id: &str,
    http_method: HttpMethod,
    error: &ErrorResponse,
) -> Result<BytesMut> {
    let mut body = BytesMut::new();
    append_message_element_begin(&mut body, message_id);
    append_simple_rsp_element_begin(&mut body);
    append_named_begin(&mut body, response_element, method_name.as_str());
    append_error_element(&mut body, error.code, &error.description, &error.instances)?;
    append_end(&mut body, response_element);
    append_simple_rsp_element_end(&mut body);
    append_message_element_end(&mut body);

    debug!(method = %method_name, code = %error.code.name(), "error response");
    let mut out = BytesMut::with_capacity(body.len() + 256);
    append_method_response_header(
        &mut out,
        http_method,
        &error.content_languages,
        body.len() as u32,
    );
    out.put_slice(&body);
    Ok(out)
}

/// Complete error response to an extrinsic method call
pub fn format_simple_method_error_rsp_message(
    method_name: &CimName,
    message_id: &str,
    http_method: HttpMethod,
    error: &ErrorResponse,
) -> Result<BytesMut> {
    format_error_rsp_message("METHODRESPONSE", method_name, message_id, http_method, error)
}

/// Complete error response to an intrinsic method call
pub fn format_simple_imethod_error_rsp_message(
    imethod_name: &CimName,
    message_id: &str,
    http_method: HttpMethod,
    error: &ErrorResponse,
) -> Result<BytesMut> {
    format_error_rsp_message("IMETHODRESPONSE", imethod_name, message_id, http_method, error)
}

/// Header-only HTTP error response
pub fn format_http_error_rsp_message(status: &str, cim_error: &str, error_detail: &str) -> BytesMut {
    let mut out = BytesMut::new();
    append_http_error_response_header(&mut out, status, cim_error, error_detail);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cim::{KeyBinding, KeyType};

    fn name(s: &str) -> CimName {
        CimName::new(s).unwrap()
    }

    fn text(out: &BytesMut) -> String {
        String::from_utf8(out.to_vec()).unwrap()
    }

    #[test]
    fn test_message_ids_increase() {
        let factory = MessageIdFactory::new(1000);
        assert_eq!(factory.next_id(), 1000);
        assert_eq!(factory.next_id(), 1001);

        let a: u32 = next_message_id().parse().unwrap();
        let b: u32 = next_message_id().parse().unwrap();
        assert!(a >= 1000);
        assert!(b > a);
    }

    #[test]
    fn test_method_request() {
        let ns = NamespaceName::new("root/cimv2").unwrap();
        let path = ObjectPath::new(name("CIM_Service"))
            .with_host("remote")
            .with_key_bindings(vec![KeyBinding::new(name("Name"), "sshd", KeyType::String)]);
        let ctx = RequestContext {
            host: "localhost",
            message_id: "1001",
            ..Default::default()
        };
        let out = format_simple_method_req_message(
            &ctx,
            &ns,
            &path,
            &name("StopService"),
            &[ParamValue::new("Force", true)],
        )
        .unwrap();
        let text = text(&out);

        let (header, body) = text.split_once("\r\n\r\n").unwrap();
        assert!(header.contains(&format!("content-length: {:010}", body.len())));
        assert!(header.contains("CIMMethod: StopService"));
        assert!(header.contains("CIMObject: root%2Fcimv2%3ACIM_Service.Name%3D%22sshd%22"));
        assert!(!header.contains("remote"));
        assert!(body.starts_with(
            "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n\
             <CIM CIMVERSION=\"2.0\" DTDVERSION=\"2.0\">\n\
             <MESSAGE ID=\"1001\" PROTOCOLVERSION=\"1.0\">\n\
             <SIMPLEREQ>\n<METHODCALL NAME=\"StopService\">\n<LOCALINSTANCEPATH>\n"
        ));
        assert!(body.contains("<PARAMVALUE NAME=\"Force\" PARAMTYPE=\"boolean\">\n"));
        assert!(body.ends_with("</METHODCALL>\n</SIMPLEREQ>\n</MESSAGE>\n</CIM>\n"));
    }

    #[test]
    fn test_imethod_request() {
        let ns = NamespaceName::new("root").unwrap();
        let ctx = RequestContext {
            host: "h",
            message_id: "7",
            ..Default::default()
        };
        let mut params = BytesMut::new();
        append_boolean_iparameter(&mut params, "DeepInheritance", false);
        let out = format_simple_imethod_req_message(&ctx, &ns, &name("EnumerateClasses"), &params);
        let text = text(&out);
        assert!(text.contains("CIMObject: root\r\n"));
        assert!(text.contains(
            "<IMETHODCALL NAME=\"EnumerateClasses\">\n<LOCALNAMESPACEPATH>\n\
             <NAMESPACE NAME=\"root\"/>\n</LOCALNAMESPACEPATH>\n\
             <IPARAMVALUE NAME=\"DeepInheritance\">\n<VALUE>FALSE</VALUE>\n</IPARAMVALUE>\n\
             </IMETHODCALL>\n"
        ));
    }

    #[test]
    fn test_imethod_response_chunks() {
        let method = name("EnumerateInstanceNames");
        let single = text(&format_simple_imethod_rsp_message(
            &method,
            "9",
            HttpMethod::Post,
            "",
            b"",
            b"",
            true,
            true,
        ));
        assert!(!single.contains("IRETURNVALUE"));
        assert!(single.contains("<IMETHODRESPONSE NAME=\"EnumerateInstanceNames\">\n</IMETHODRESPONSE>\n"));

        let first = text(&format_simple_imethod_rsp_message(
            &method,
            "9",
            HttpMethod::Post,
            "",
            b"",
            b"<X/>\n",
            true,
            false,
        ));
        assert!(first.ends_with("<IRETURNVALUE>\n<X/>\n"));
        assert!(first.contains("content-length: 0000000000"));

        let last = text(&format_simple_imethod_rsp_message(
            &method,
            "9",
            HttpMethod::Post,
            "",
            b"",
            b"",
            false,
            true,
        ));
        assert_eq!(
            last,
            "</IRETURNVALUE>\n</IMETHODRESPONSE>\n</SIMPLERSP>\n</MESSAGE>\n</CIM>\n"
        );
    }

    #[test]
    fn test_method_response_chunks() {
        let method = name("Reset");
        let mut value = BytesMut::new();
        crate::writer::append_return_value_element(&mut value, &0u32.into()).unwrap();
        let out = text(&format_simple_method_rsp_message(
            &method,
            "11",
            HttpMethod::Post,
            "",
            &value,
            true,
            true,
        ));
        assert!(out.contains(
            "<SIMPLERSP>\n<METHODRESPONSE NAME=\"Reset\">\n<RETURNVALUE PARAMTYPE=\"uint32\">\n"
        ));
        assert!(out.ends_with("</METHODRESPONSE>\n</SIMPLERSP>\n</MESSAGE>\n</CIM>\n"));
    }

    #[test]
    fn test_error_response() {
        let error = ErrorResponse::new(StatusCode::InvalidClass, "no such class");
        let out = format_simple_imethod_error_rsp_message(
            &name("GetClass"),
            "12",
            HttpMethod::Post,
            &error,
        )
        .unwrap();
        let text = text(&out);
        let (header, body) = text.split_once("\r\n\r\n").unwrap();
        assert!(header.contains(&format!("content-length: {:010}", body.len())));
        assert!(body.contains(
            "<IMETHODRESPONSE NAME=\"GetClass\">\n\
             <ERROR CODE=\"5\" DESCRIPTION=\"no such class\"/></IMETHODRESPONSE>\n"
        ));
    }

    #[test]
    fn test_property_list_iparameter() {
        let mut out = BytesMut::new();
        append_property_list_iparameter(&mut out, &PropertyList::all());
        assert_eq!(text(&out), "<IPARAMVALUE NAME=\"PropertyList\">\n</IPARAMVALUE>\n");

        let mut out = BytesMut::new();
        append_property_list_iparameter(&mut out, &PropertyList::new(vec![name("A")]));
        assert_eq!(
            text(&out),
            "<IPARAMVALUE NAME=\"PropertyList\">\n<VALUE.ARRAY>\n<VALUE>A</VALUE>\n\
             </VALUE.ARRAY>\n</IPARAMVALUE>\n"
        );
    }
}
