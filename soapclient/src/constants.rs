//! Namespace and wire-level constants for SOAP 1.1 exchanges.

/// The SOAP 1.1 envelope namespace.
pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Prefix used when emitting envelope-level elements.
pub const SOAP_ENVELOPE_PREFIX: &str = "soapenv";

/// The WS-Addressing "none" namespace used by the Action and To headers.
pub const WS_ADDRESSING_NONE_NS: &str = "http://schemas.microsoft.com/ws/2005/05/addressing/none";

/// The OASIS WS-Security secext 1.0 namespace (Security, UsernameToken).
pub const WSSE_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";

/// The OASIS WS-Security utility 1.0 namespace (Timestamp, wsu:Id).
pub const WSU_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";

/// The OASIS username-token profile identifier for clear-text passwords.
pub const PASSWORD_TEXT_TYPE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordText";

/// Local name of the reserved fault element inside a SOAP Body.
pub const FAULT_LOCAL_NAME: &str = "Fault";

/// HTTP header carrying the SOAP action identifier.
pub const SOAP_ACTION_HEADER: &str = "SOAPAction";

/// Content type sent with every SOAP 1.1 request.
pub const SOAP_CONTENT_TYPE: &str = r#"text/xml; charset="utf-8""#;
