//! End-to-end send scenarios over a stub transport.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use xmltree::{Element, XMLNode};

use soapclient::{
    headers, Envelope, EnvelopeSerializer, HttpRequest, HttpResponse, QName, Result, SoapClient,
    SoapClientError, SoapClientSettings, SoapTransport, XmlError, XmlObject,
};

const SERVICE_NS: &str = "http://services.company.com";

/// Transport stub that records requests and replies with a canned response.
struct StubTransport {
    status: u16,
    body: &'static str,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    fn replying(status: u16, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl SoapTransport for StubTransport {
    async fn send(
        &self,
        request: HttpRequest,
        _cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        self.requests.lock().push(request);
        Ok(HttpResponse {
            status: self.status,
            headers: vec![("Content-Type".to_string(), "text/xml".to_string())],
            body: self.body.as_bytes().to_vec(),
        })
    }
}

struct IsAliveRequest;

impl XmlObject for IsAliveRequest {
    fn qualified_name() -> QName {
        QName::new(SERVICE_NS, "IsAliveRequest")
    }

    fn to_element(&self) -> Element {
        let mut elem = Element::new("u:IsAliveRequest");
        elem.attributes
            .insert("xmlns:u".to_string(), SERVICE_NS.to_string());
        elem
    }

    fn from_element(element: &Element) -> std::result::Result<Self, XmlError> {
        soapclient::xml::ensure_qualified_name::<Self>(element)?;
        Ok(Self)
    }
}

#[derive(Debug)]
struct IsAliveResponse {
    is_alive: bool,
}

impl XmlObject for IsAliveResponse {
    fn qualified_name() -> QName {
        QName::new(SERVICE_NS, "IsAliveResponse")
    }

    fn to_element(&self) -> Element {
        let mut elem = Element::new("u:IsAliveResponse");
        elem.attributes
            .insert("xmlns:u".to_string(), SERVICE_NS.to_string());
        let mut result = Element::new("u:IsAliveResult");
        result
            .children
            .push(XMLNode::Text(self.is_alive.to_string()));
        elem.children.push(XMLNode::Element(result));
        elem
    }

    fn from_element(element: &Element) -> std::result::Result<Self, XmlError> {
        soapclient::xml::ensure_qualified_name::<Self>(element)?;
        let raw = soapclient::xml::find_child(element, "IsAliveResult")
            .map(soapclient::xml::text_of)
            .unwrap_or_default();
        Ok(Self {
            is_alive: raw == "true",
        })
    }
}

const IS_ALIVE_RESPONSE: &str = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body><IsAliveResponse xmlns="http://services.company.com"><IsAliveResult>true</IsAliveResult></IsAliveResponse></soapenv:Body></soapenv:Envelope>"#;

const FAULT_RESPONSE: &str = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body><soapenv:Fault><faultcode>soapenv:Server</faultcode><faultstring>database down</faultstring><faultactor>urn:backend</faultactor><detail><reason xmlns="urn:app">maintenance</reason></detail></soapenv:Fault></soapenv:Body></soapenv:Envelope>"#;

#[tokio::test]
async fn end_to_end_is_alive() {
    let transport = StubTransport::replying(200, IS_ALIVE_RESPONSE);
    let client = SoapClient::builder()
        .with_transport(transport.clone())
        .build();

    let response = client
        .send(
            "https://svc/x",
            "urn:IsAlive",
            Envelope::prepare().with_body_of(&IsAliveRequest),
        )
        .await
        .unwrap();

    assert!(!response.is_faulted());
    let body: IsAliveResponse = response.body_as().unwrap();
    assert!(body.is_alive);

    let requests = transport.requests.lock();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.url, "https://svc/x");
    assert_eq!(request.header("SOAPAction"), Some("urn:IsAlive"));
    assert_eq!(
        request.header("Content-Type"),
        Some(r#"text/xml; charset="utf-8""#)
    );
    let body_text = request.body_text();
    assert!(body_text.contains("IsAliveRequest"));
    assert!(!body_text.contains("<?xml"));
}

#[tokio::test]
async fn security_header_injected_by_handler_reaches_the_wire() {
    let transport = StubTransport::replying(200, IS_ALIVE_RESPONSE);
    let client = SoapClient::builder()
        .with_transport(transport.clone())
        .on_envelope_request(
            |_, args| {
                args.envelope.add_header(
                    headers::username_token_and_password_text("some-user", "some-password")
                        .to_element(),
                );
                Ok(())
            },
            0,
        )
        .build();

    client
        .send(
            "https://svc/x",
            "urn:IsAlive",
            Envelope::prepare().with_body_of(&IsAliveRequest),
        )
        .await
        .unwrap();

    let requests = transport.requests.lock();
    let body = requests[0].body_text().into_owned();
    assert!(body.contains("Security"));
    assert!(body.contains("some-user"));
    assert!(body.contains("_TS"));
    assert!(body.contains("_UT"));
}

#[tokio::test]
async fn second_http_request_handler_failure_aborts_third_and_transmission() {
    let transport = StubTransport::replying(200, IS_ALIVE_RESPONSE);
    let third_ran = Arc::new(Mutex::new(false));
    let third_flag = third_ran.clone();

    let client = SoapClient::builder()
        .with_transport(transport.clone())
        .on_http_request(|_, _| Ok(()), 1)
        .on_http_request(
            |_, _| Err(SoapClientError::handler_msg("second handler exploded")),
            2,
        )
        .on_http_request(
            move |_, _| {
                *third_flag.lock() = true;
                Ok(())
            },
            3,
        )
        .build();

    let err = client
        .send(
            "https://svc/x",
            "urn:IsAlive",
            Envelope::prepare().with_body_of(&IsAliveRequest),
        )
        .await
        .unwrap_err();

    match err {
        SoapClientError::Handler(inner) => {
            assert_eq!(inner.to_string(), "second handler exploded")
        }
        other => panic!("expected handler error, got {other:?}"),
    }
    assert!(!*third_ran.lock());
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn cancellation_before_transmission_skips_the_transport() {
    let transport = StubTransport::replying(200, IS_ALIVE_RESPONSE);
    let client = SoapClient::builder()
        .with_transport(transport.clone())
        .build();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client
        .send_with_cancellation(
            "https://svc/x",
            "urn:IsAlive",
            Envelope::prepare().with_body_of(&IsAliveRequest),
            &cancel,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SoapClientError::Cancelled));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn faulted_response_is_returned_successfully_and_asserts_on_demand() {
    let transport = StubTransport::replying(500, FAULT_RESPONSE);
    let client = SoapClient::builder()
        .with_transport(transport.clone())
        .build();

    let response = client
        .send(
            "https://svc/x",
            "urn:IsAlive",
            Envelope::prepare().with_body_of(&IsAliveRequest),
        )
        .await
        .unwrap();

    assert!(response.is_faulted());
    let fault = response.fault().unwrap();
    assert_eq!(fault.code, "soapenv:Server");
    assert_eq!(fault.string, "database down");
    assert_eq!(fault.actor.as_deref(), Some("urn:backend"));
    assert!(fault.detail.is_some());

    let err = response.ensure_not_faulted().unwrap_err();
    assert!(matches!(err, SoapClientError::Fault(_)));

    // A fault is a qualified-name mismatch for the expected payload type.
    let err = response.body_as::<IsAliveResponse>().unwrap_err();
    assert!(matches!(err, XmlError::QualifiedNameMismatch { .. }));
}

#[tokio::test]
async fn unparsable_response_surfaces_as_deserialization_failure_with_raw_text() {
    let transport = StubTransport::replying(200, "this is not xml <");
    let client = SoapClient::builder()
        .with_transport(transport.clone())
        .build();

    let err = client
        .send(
            "https://svc/x",
            "urn:IsAlive",
            Envelope::prepare().with_body_of(&IsAliveRequest),
        )
        .await
        .unwrap_err();

    match err {
        SoapClientError::EnvelopeDeserialization { xml, source } => {
            assert_eq!(xml, "this is not xml <");
            assert!(matches!(source, XmlError::Parse(_)));
        }
        other => panic!("expected deserialization failure, got {other:?}"),
    }
}

struct FailingSerializer;

impl EnvelopeSerializer for FailingSerializer {
    fn to_xml(&self, _envelope: &Envelope) -> std::result::Result<String, XmlError> {
        Err(XmlError::EmptyDocument)
    }

    fn from_xml(&self, _xml: &str) -> std::result::Result<Option<Envelope>, XmlError> {
        Err(XmlError::EmptyDocument)
    }
}

#[tokio::test]
async fn serializer_failure_carries_the_envelope_and_skips_transmission() {
    let transport = StubTransport::replying(200, IS_ALIVE_RESPONSE);
    let client = SoapClient::builder()
        .with_transport(transport.clone())
        .with_settings(SoapClientSettings {
            serializer: Arc::new(FailingSerializer),
            ..Default::default()
        })
        .build();

    let err = client
        .send(
            "https://svc/x",
            "urn:IsAlive",
            Envelope::prepare().with_body_of(&IsAliveRequest),
        )
        .await
        .unwrap_err();

    match err {
        SoapClientError::EnvelopeSerialization { envelope, .. } => {
            assert!(envelope.body_fragment().is_some());
        }
        other => panic!("expected serialization failure, got {other:?}"),
    }
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn handlers_can_read_the_response_headers_before_parsing() {
    let transport = StubTransport::replying(200, IS_ALIVE_RESPONSE);
    let seen_content_type = Arc::new(Mutex::new(None::<String>));
    let seen = seen_content_type.clone();

    let client = SoapClient::builder()
        .with_transport(transport.clone())
        .on_http_response(
            move |_, args| {
                *seen.lock() = args.response.header("Content-Type").map(str::to_string);
                Ok(())
            },
            0,
        )
        .build();

    client
        .send(
            "https://svc/x",
            "urn:IsAlive",
            Envelope::prepare().with_body_of(&IsAliveRequest),
        )
        .await
        .unwrap();

    assert_eq!(seen_content_type.lock().as_deref(), Some("text/xml"));
}

#[tokio::test]
async fn typed_header_lookup_on_the_response_envelope() {
    // Response echoing back a Security header.
    const WITH_SECURITY: &str = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Header><wsse:Security xmlns:wsse="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd" soapenv:mustUnderstand="1"><wsse:UsernameToken wsu:Id="_UTabc" xmlns:wsu="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd"><wsse:Username>some-user</wsse:Username><wsse:Password Type="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordText">some-password</wsse:Password></wsse:UsernameToken></wsse:Security></soapenv:Header><soapenv:Body><IsAliveResponse xmlns="http://services.company.com"><IsAliveResult>true</IsAliveResult></IsAliveResponse></soapenv:Body></soapenv:Envelope>"#;

    let transport = StubTransport::replying(200, WITH_SECURITY);
    let client = SoapClient::builder()
        .with_transport(transport)
        .build();

    let response = client
        .send(
            "https://svc/x",
            "urn:IsAlive",
            Envelope::prepare().with_body_of(&IsAliveRequest),
        )
        .await
        .unwrap();

    let security: headers::SecurityHeader = response.header_as().unwrap().unwrap();
    let token = security.username_token.unwrap();
    assert_eq!(token.id, "_UTabc");
    assert_eq!(token.username, "some-user");
    assert_eq!(token.password.value, "some-password");

    // Absent names are "not found", never an error.
    let absent: Option<headers::ActionHeader> = response.header_as().unwrap();
    assert!(absent.is_none());
}
