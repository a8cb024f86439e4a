//! Typed header catalog: WS-Addressing Action/To and the OASIS
//! WS-Security username-token header.
//!
//! Each variant is a projection of a generic header fragment into a
//! strongly-shaped record with a fixed qualified name. A typed variant and
//! its fragment form are interchangeable; conversion round-trips every
//! field the variant declares. The must-understand flag serializes as
//! `1`/`0`.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use uuid::Uuid;
use xmltree::{Element, XMLNode};

use crate::constants::{
    PASSWORD_TEXT_TYPE, SOAP_ENVELOPE_PREFIX, WSSE_NS, WSU_NS, WS_ADDRESSING_NONE_NS,
};
use crate::xml::{
    attribute, ensure_qualified_name, find_child, text_of, QName, XmlError, XmlObject,
};

fn set_must_understand(element: &mut Element, must_understand: bool) {
    // The mustUnderstand attribute lives in the envelope namespace, which
    // the envelope root already declares; re-declaring it on every header
    // would defeat duplicate-namespace collapsing.
    element.attributes.insert(
        format!("{SOAP_ENVELOPE_PREFIX}:mustUnderstand"),
        if must_understand { "1" } else { "0" }.to_string(),
    );
}

fn get_must_understand(element: &Element) -> bool {
    attribute(element, "mustUnderstand") == Some("1")
}

fn parse_datetime(element: &Element, field: &'static str) -> Result<DateTime<Utc>, XmlError> {
    let raw = find_child(element, field).map(text_of).unwrap_or_default();
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| XmlError::InvalidValue {
            field,
            value: raw,
        })
}

fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// WS-Addressing Action header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionHeader {
    /// The action identifier.
    pub action: String,
    /// Whether the receiver must process or reject the header.
    pub must_understand: bool,
}

impl ActionHeader {
    /// Creates an Action header that the receiver must understand.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            must_understand: true,
        }
    }

    /// Overrides the must-understand flag.
    pub fn with_must_understand(mut self, must_understand: bool) -> Self {
        self.must_understand = must_understand;
        self
    }
}

impl XmlObject for ActionHeader {
    fn qualified_name() -> QName {
        QName::new(WS_ADDRESSING_NONE_NS, "Action")
    }

    fn to_element(&self) -> Element {
        let mut elem = Element::new("wsa:Action");
        elem.attributes
            .insert("xmlns:wsa".to_string(), WS_ADDRESSING_NONE_NS.to_string());
        set_must_understand(&mut elem, self.must_understand);
        elem.children.push(XMLNode::Text(self.action.clone()));
        elem
    }

    fn from_element(element: &Element) -> Result<Self, XmlError> {
        ensure_qualified_name::<Self>(element)?;
        Ok(Self {
            action: text_of(element),
            must_understand: get_must_understand(element),
        })
    }
}

/// WS-Addressing To header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToHeader {
    /// The destination identifier.
    pub to: String,
    /// Whether the receiver must process or reject the header.
    pub must_understand: bool,
}

impl ToHeader {
    /// Creates a To header that the receiver must understand.
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            must_understand: true,
        }
    }

    /// Overrides the must-understand flag.
    pub fn with_must_understand(mut self, must_understand: bool) -> Self {
        self.must_understand = must_understand;
        self
    }
}

impl XmlObject for ToHeader {
    fn qualified_name() -> QName {
        QName::new(WS_ADDRESSING_NONE_NS, "To")
    }

    fn to_element(&self) -> Element {
        let mut elem = Element::new("wsa:To");
        elem.attributes
            .insert("xmlns:wsa".to_string(), WS_ADDRESSING_NONE_NS.to_string());
        set_must_understand(&mut elem, self.must_understand);
        elem.children.push(XMLNode::Text(self.to.clone()));
        elem
    }

    fn from_element(element: &Element) -> Result<Self, XmlError> {
        ensure_qualified_name::<Self>(element)?;
        Ok(Self {
            to: text_of(element),
            must_understand: get_must_understand(element),
        })
    }
}

/// A WS-Security utility timestamp with a validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    /// Correlation id (`wsu:Id`).
    pub id: String,
    /// When the timestamp was created.
    pub created: DateTime<Utc>,
    /// When the timestamp expires.
    pub expires: DateTime<Utc>,
}

impl XmlObject for Timestamp {
    fn qualified_name() -> QName {
        QName::new(WSU_NS, "Timestamp")
    }

    fn to_element(&self) -> Element {
        let mut elem = Element::new("wsu:Timestamp");
        elem.attributes
            .insert("xmlns:wsu".to_string(), WSU_NS.to_string());
        elem.attributes
            .insert("wsu:Id".to_string(), self.id.clone());
        let mut created = Element::new("wsu:Created");
        created
            .children
            .push(XMLNode::Text(format_datetime(&self.created)));
        elem.children.push(XMLNode::Element(created));
        let mut expires = Element::new("wsu:Expires");
        expires
            .children
            .push(XMLNode::Text(format_datetime(&self.expires)));
        elem.children.push(XMLNode::Element(expires));
        elem
    }

    fn from_element(element: &Element) -> Result<Self, XmlError> {
        ensure_qualified_name::<Self>(element)?;
        Ok(Self {
            id: attribute(element, "Id").unwrap_or_default().to_string(),
            created: parse_datetime(element, "Created")?,
            expires: parse_datetime(element, "Expires")?,
        })
    }
}

/// A clear-text password inside a username token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordText {
    /// The password value.
    pub value: String,
}

/// A WS-Security username token with a clear-text password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsernameToken {
    /// Correlation id (`wsu:Id`).
    pub id: String,
    /// The username.
    pub username: String,
    /// The clear-text password.
    pub password: PasswordText,
}

/// The WS-Security header container.
///
/// Both members are optional so a received Security header missing either
/// one still projects cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityHeader {
    /// Timestamp bounding the token's validity.
    pub timestamp: Option<Timestamp>,
    /// The username token.
    pub username_token: Option<UsernameToken>,
    /// Whether the receiver must process or reject the header.
    pub must_understand: bool,
}

impl XmlObject for SecurityHeader {
    fn qualified_name() -> QName {
        QName::new(WSSE_NS, "Security")
    }

    fn to_element(&self) -> Element {
        let mut elem = Element::new("wsse:Security");
        elem.attributes
            .insert("xmlns:wsse".to_string(), WSSE_NS.to_string());
        set_must_understand(&mut elem, self.must_understand);

        if let Some(timestamp) = &self.timestamp {
            elem.children.push(XMLNode::Element(timestamp.to_element()));
        }

        if let Some(token) = &self.username_token {
            let mut token_elem = Element::new("wsse:UsernameToken");
            token_elem
                .attributes
                .insert("xmlns:wsu".to_string(), WSU_NS.to_string());
            token_elem
                .attributes
                .insert("wsu:Id".to_string(), token.id.clone());

            let mut username = Element::new("wsse:Username");
            username
                .children
                .push(XMLNode::Text(token.username.clone()));
            token_elem.children.push(XMLNode::Element(username));

            let mut password = Element::new("wsse:Password");
            password
                .attributes
                .insert("Type".to_string(), PASSWORD_TEXT_TYPE.to_string());
            password
                .children
                .push(XMLNode::Text(token.password.value.clone()));
            token_elem.children.push(XMLNode::Element(password));

            elem.children.push(XMLNode::Element(token_elem));
        }

        elem
    }

    fn from_element(element: &Element) -> Result<Self, XmlError> {
        ensure_qualified_name::<Self>(element)?;

        let timestamp = match find_child(element, "Timestamp") {
            Some(child) => Some(Timestamp::from_element(child)?),
            None => None,
        };

        let username_token = find_child(element, "UsernameToken").map(|child| UsernameToken {
            id: attribute(child, "Id").unwrap_or_default().to_string(),
            username: find_child(child, "Username").map(text_of).unwrap_or_default(),
            password: PasswordText {
                value: find_child(child, "Password").map(text_of).unwrap_or_default(),
            },
        });

        Ok(Self {
            timestamp,
            username_token,
            must_understand: get_must_understand(element),
        })
    }
}

/// Creates a WS-Addressing Action header.
pub fn action(action: impl Into<String>) -> ActionHeader {
    ActionHeader::new(action)
}

/// Creates a WS-Addressing To header.
pub fn to(to: impl Into<String>) -> ToHeader {
    ToHeader::new(to)
}

/// Creates a Security header holding a username token with a clear-text
/// password.
///
/// Generates two process-unique correlation ids, one for the timestamp and
/// one for the token, and a validity window of exactly 15 minutes from
/// creation.
pub fn username_token_and_password_text(
    username: impl Into<String>,
    password: impl Into<String>,
) -> SecurityHeader {
    let correlation = Uuid::new_v4().simple().to_string();
    let created = Utc::now();

    SecurityHeader {
        timestamp: Some(Timestamp {
            id: format!("_TS{correlation}"),
            created,
            expires: created + Duration::minutes(15),
        }),
        username_token: Some(UsernameToken {
            id: format!("_UT{correlation}"),
            username: username.into(),
            password: PasswordText {
                value: password.into(),
            },
        }),
        must_understand: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_header_round_trips() {
        let header = ActionHeader::new("urn:IsAlive");
        let back = ActionHeader::from_element(&header.to_element()).unwrap();
        assert_eq!(back, header);

        let relaxed = ActionHeader::new("urn:IsAlive").with_must_understand(false);
        let elem = relaxed.to_element();
        assert_eq!(attribute(&elem, "mustUnderstand"), Some("0"));
        assert_eq!(ActionHeader::from_element(&elem).unwrap(), relaxed);
    }

    #[test]
    fn to_header_round_trips() {
        let header = ToHeader::new("https://svc/x");
        let back = ToHeader::from_element(&header.to_element()).unwrap();
        assert_eq!(back, header);
    }

    #[test]
    fn action_rejects_foreign_fragment() {
        let to_elem = ToHeader::new("https://svc/x").to_element();
        let err = ActionHeader::from_element(&to_elem).unwrap_err();
        assert!(matches!(err, XmlError::QualifiedNameMismatch { .. }));
    }

    #[test]
    fn username_token_generates_ids_and_window() {
        let header = username_token_and_password_text("some-user", "some-password");
        let timestamp = header.timestamp.as_ref().unwrap();
        let token = header.username_token.as_ref().unwrap();

        assert!(timestamp.id.starts_with("_TS"));
        assert!(token.id.starts_with("_UT"));
        assert_eq!(timestamp.id[3..], token.id[3..]);
        assert_eq!(timestamp.expires - timestamp.created, Duration::minutes(15));
        assert!(header.must_understand);

        let other = username_token_and_password_text("some-user", "some-password");
        assert_ne!(
            other.username_token.unwrap().id,
            header.username_token.unwrap().id
        );
    }

    #[test]
    fn security_header_round_trips() {
        let header = username_token_and_password_text("some-user", "some-password");
        let back = SecurityHeader::from_element(&header.to_element()).unwrap();

        let token = back.username_token.as_ref().unwrap();
        assert_eq!(token.username, "some-user");
        assert_eq!(token.password.value, "some-password");
        assert_eq!(token.id, header.username_token.as_ref().unwrap().id);

        let timestamp = back.timestamp.as_ref().unwrap();
        let original = header.timestamp.as_ref().unwrap();
        assert_eq!(timestamp.id, original.id);
        // Emission is millisecond-precise.
        assert_eq!(
            timestamp.created.timestamp_millis(),
            original.created.timestamp_millis()
        );
        assert_eq!(
            timestamp.expires.timestamp_millis(),
            original.expires.timestamp_millis()
        );
        assert!(back.must_understand);
    }

    #[test]
    fn security_header_without_timestamp_still_projects() {
        let header = SecurityHeader {
            timestamp: None,
            username_token: Some(UsernameToken {
                id: "_UTx".into(),
                username: "u".into(),
                password: PasswordText { value: "p".into() },
            }),
            must_understand: false,
        };
        let back = SecurityHeader::from_element(&header.to_element()).unwrap();
        assert_eq!(back, header);
    }
}
