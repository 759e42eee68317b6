//! SOAP envelope construction and response parsing.
//!
//! The broker's WSDL fixes four operations with flat string parameters, so
//! requests are templated directly and responses are walked with quick-xml.
//! quick-xml does not expand entities, which rules out XXE from a hostile
//! response body.

use crate::error::SisowError;
use quick_xml::events::Event;
use quick_xml::Reader;

/// SOAP 1.1 envelope namespace.
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
/// Namespace of the broker service.
pub const SERVICE_NS: &str = "https://www.sisow.nl/Sisow/iDeal";
/// Production endpoint of the broker service.
pub const DEFAULT_ENDPOINT: &str = "https://www.sisow.nl/Sisow/iDeal/wsdl.aspx";

/// SOAPAction header value for an operation.
pub fn soap_action(operation: &str) -> String {
    format!("{SERVICE_NS}/{operation}")
}

/// Build the request envelope for `operation` with the given parameters,
/// in order.
pub fn request_envelope(operation: &str, params: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, value) in params {
        body.push_str(&format!(
            "      <{name}>{value}</{name}>\n",
            value = xml_escape(value)
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="{SOAP_ENV_NS}">
  <soap:Body>
    <{operation} xmlns="{SERVICE_NS}">
{body}    </{operation}>
  </soap:Body>
</soap:Envelope>"#
    )
}

/// Parsed operation response: the result element and the out-parameter
/// leaves, in document order.
#[derive(Debug, Clone, Default)]
pub struct SoapResponse {
    has_result: bool,
    result_code: Option<i64>,
    fields: Vec<(String, String)>,
}

impl SoapResponse {
    /// Whether the `<{Operation}Result>` element was present at all.
    pub fn has_result(&self) -> bool {
        self.has_result
    }

    /// Integer result code carried by the result element, when it is a
    /// numeric leaf. 0 means success.
    pub fn result_code(&self) -> Option<i64> {
        self.result_code
    }

    /// First value of a named field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All values of a named field, in document order.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// All fields, in document order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Parse a SOAP response body for `operation`.
///
/// A `soap:Fault` maps to [`SisowError::Fault`] carrying the fault string;
/// anything that is not well-formed XML maps to [`SisowError::Response`].
pub fn parse_response(operation: &str, data: &[u8]) -> Result<SoapResponse, SisowError> {
    let xml = std::str::from_utf8(data)
        .map_err(|e| SisowError::Response(format!("invalid UTF-8: {e}")))?;

    let result_element = format!("{operation}Result");

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut response = SoapResponse::default();
    let mut in_fault = false;
    let mut fault_string: Option<String> = None;
    let mut current_text: Option<String> = None;

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local = local_name_str(e.local_name().as_ref());
                if local == "Fault" {
                    in_fault = true;
                }
                if local == result_element {
                    response.has_result = true;
                }
                current_text = None;
            }

            Ok(Event::Empty(ref e)) => {
                // Self-closing out-parameter, e.g. <entrancecode/>
                let local = local_name_str(e.local_name().as_ref());
                if local == result_element {
                    response.has_result = true;
                } else if !in_fault && !is_structural(&local) {
                    response.fields.push((local, String::new()));
                }
            }

            Ok(Event::Text(ref t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| SisowError::Response(format!("text decode error: {e}")))?
                    .into_owned();
                current_text = Some(text);
            }

            Ok(Event::End(ref e)) => {
                let local = local_name_str(e.local_name().as_ref());
                if let Some(text) = current_text.take() {
                    if in_fault {
                        if local == "faultstring" {
                            fault_string = Some(text);
                        }
                    } else if local == result_element {
                        response.result_code = text.trim().parse::<i64>().ok();
                    } else if !is_structural(&local) {
                        response.fields.push((local.clone(), text));
                    }
                }
                if local == "Fault" {
                    in_fault = false;
                }
            }

            Ok(Event::Eof) => break,

            Err(e) => {
                return Err(SisowError::Response(format!("XML parse error: {e}")));
            }

            _ => {}
        }

        buf.clear();
    }

    if in_fault || fault_string.is_some() {
        return Err(SisowError::Fault(
            fault_string.unwrap_or_else(|| "unspecified fault".to_string()),
        ));
    }

    Ok(response)
}

/// Envelope scaffolding elements never carry out-parameters.
fn is_structural(local: &str) -> bool {
    matches!(local, "Envelope" | "Header" | "Body") || local.ends_with("Response")
}

/// Extract local name from raw element-name bytes.
fn local_name_str(name: &[u8]) -> String {
    std::str::from_utf8(name).unwrap_or("").to_string()
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
