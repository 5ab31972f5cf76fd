//! Normalized RDAP record model
//!
//! RDAP servers answer with two structurally different object classes for the
//! lookups this crate performs: `domain` and `ip network`. Both are normalized
//! into [`RdapRecord`], a closed enum whose variants carry only the fields that
//! exist for that object class.

use crate::message::EmbedField;
use serde_json::{json, Value};

/// Placeholder shown instead of an empty field value
pub const NO_VALUE: &str = "No value :/";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RdapError {
    /// Body was not valid JSON
    #[error("Error parsing RDAP data: {0}")]
    Parse(String),

    /// JSON parsed but is neither a domain nor an ip network object
    #[error("Error parsing RDAP data: Unknown RDAP objectClassName `{0}`")]
    UnknownObjectClass(String),

    /// Network failure talking to an RDAP server
    #[error("RDAP request failed: {0}")]
    Transport(String),

    /// Lookup cache could not be read or written
    #[error("RDAP cache error: {0}")]
    Store(String),
}

// =============================================================================
// Shared structures
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub action: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeLink {
    pub href: Option<String>,
    pub media_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: Option<String>,
    pub description: Vec<String>,
    pub links: Vec<NoticeLink>,
}

/// How a contact card value is typed in the jCard array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardValueKind {
    Text,
    Uri,
    Other(String),
}

impl CardValueKind {
    pub fn from_type(kind: &str) -> Self {
        match kind {
            "text" => CardValueKind::Text,
            "uri" => CardValueKind::Uri,
            other => CardValueKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CardValueKind::Text => "text",
            CardValueKind::Uri => "uri",
            CardValueKind::Other(kind) => kind,
        }
    }
}

/// One `[name, parameters, type, value]` property of a jCard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardField {
    pub name: String,
    /// Parameter name/value pairs in the order the server sent them
    pub parameters: Vec<(String, Value)>,
    pub kind: CardValueKind,
    pub value: Value,
}

impl CardField {
    /// Text shown for this field.
    ///
    /// Text fields prefer their joined parameter values over the value itself.
    /// Never returns an empty string.
    pub fn display_value(&self) -> String {
        let shown = match self.kind {
            CardValueKind::Text => {
                let params = self
                    .parameters
                    .iter()
                    .map(|(_, v)| param_text(v))
                    .collect::<Vec<_>>()
                    .join("; ");
                let shown = if params.is_empty() {
                    value_text(&self.value)
                } else {
                    params
                };
                shown.replace('\n', " ")
            }
            CardValueKind::Uri => scalar_text(&self.value),
            CardValueKind::Other(_) => value_text(&self.value),
        };

        if shown.is_empty() {
            NO_VALUE.to_string()
        } else {
            shown
        }
    }

    pub fn to_embed_field(&self) -> EmbedField {
        EmbedField::new(self.name.clone(), self.display_value())
    }

    fn to_jcard(&self) -> Value {
        let params: serde_json::Map<String, Value> = self.parameters.iter().cloned().collect();
        json!([self.name, params, self.kind.as_str(), self.value])
    }
}

/// Scalar rendering; arrays are comma-joined the way parameter lists print
fn param_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(param_text).collect::<Vec<_>>().join(","),
        other => scalar_text(other),
    }
}

/// Value rendering; top-level arrays are space-joined (structured values like `adr`)
fn value_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(param_text).collect::<Vec<_>>().join(" "),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(_) => param_text(value),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactCard {
    pub fields: Vec<CardField>,
}

/// A registry-listed organization or contact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entity {
    pub handle: Option<String>,
    pub roles: Vec<String>,
    pub card: ContactCard,
    pub entities: Vec<Entity>,
}

impl Entity {
    fn to_rdap_json(&self) -> Value {
        let mut obj = json!({
            "objectClassName": "entity",
            "roles": self.roles,
            "vcardArray": ["vcard", self.card.fields.iter().map(CardField::to_jcard).collect::<Vec<_>>()],
        });
        if let Some(handle) = &self.handle {
            obj["handle"] = json!(handle);
        }
        if !self.entities.is_empty() {
            obj["entities"] = Value::Array(self.entities.iter().map(Entity::to_rdap_json).collect());
        }
        obj
    }
}

/// Fields every supported object class carries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordCommon {
    /// The response exactly as received, for verbatim export
    pub raw: Value,
    pub handle: Option<String>,
    pub status: Vec<String>,
    pub events: Vec<Event>,
    pub notices: Vec<Notice>,
    pub conformance: Vec<String>,
    pub entities: Vec<Entity>,
}

impl RecordCommon {
    fn write_rdap_json(&self, obj: &mut Value) {
        if let Some(handle) = &self.handle {
            obj["handle"] = json!(handle);
        }
        obj["status"] = json!(self.status);
        obj["rdapConformance"] = json!(self.conformance);
        obj["events"] = Value::Array(
            self.events
                .iter()
                .map(|e| json!({"eventAction": e.action, "eventDate": e.date}))
                .collect(),
        );
        obj["notices"] = Value::Array(
            self.notices
                .iter()
                .map(|n| {
                    json!({
                        "title": n.title,
                        "description": n.description,
                        "links": n.links.iter().map(|l| json!({"href": l.href, "type": l.media_type})).collect::<Vec<_>>(),
                    })
                })
                .collect(),
        );
        obj["entities"] = Value::Array(self.entities.iter().map(Entity::to_rdap_json).collect());
    }
}

// =============================================================================
// Domain
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nameserver {
    pub ldh_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainLinks {
    pub self_link: String,
    pub related: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainRecord {
    pub common: RecordCommon,
    pub nameservers: Vec<Nameserver>,
    /// `secureDNS.delegationSigned`, if the server reported it
    pub delegation_signed: Option<bool>,
    pub links: DomainLinks,
}

// =============================================================================
// IP network
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cidr {
    pub v4prefix: Option<String>,
    pub v6prefix: Option<String>,
    pub length: Option<u32>,
}

impl Cidr {
    /// `prefix/length`, preferring the IPv6 prefix when both are present
    pub fn display(&self) -> String {
        let prefix = self
            .v6prefix
            .as_deref()
            .or(self.v4prefix.as_deref())
            .unwrap_or("");
        match self.length {
            Some(length) => format!("{}/{}", prefix, length),
            None => prefix.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub value: Option<String>,
    pub rel: Option<String>,
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remark {
    pub description: Vec<String>,
}

/// A redaction marker (RFC 9537)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction {
    pub name: Option<String>,
    pub reason: Option<String>,
    pub pre_path: Option<String>,
    pub method: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IpNetworkRecord {
    pub common: RecordCommon,
    pub start_address: Option<String>,
    pub end_address: Option<String>,
    pub ip_version: Option<String>,
    pub name: Option<String>,
    pub network_type: Option<String>,
    pub country: Option<String>,
    pub parent_handle: Option<String>,
    pub cidrs: Vec<Cidr>,
    pub links: Vec<Link>,
    pub remarks: Vec<Remark>,
    pub port43: Option<String>,
    pub redacted: Vec<Redaction>,
}

// =============================================================================
// Record
// =============================================================================

/// A normalized RDAP lookup result
#[derive(Debug, Clone, PartialEq)]
pub enum RdapRecord {
    Domain(DomainRecord),
    IpNetwork(IpNetworkRecord),
}

impl RdapRecord {
    pub fn common(&self) -> &RecordCommon {
        match self {
            RdapRecord::Domain(d) => &d.common,
            RdapRecord::IpNetwork(ip) => &ip.common,
        }
    }

    pub fn handle(&self) -> Option<&str> {
        self.common().handle.as_deref()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.common().entities
    }

    pub fn events(&self) -> &[Event] {
        &self.common().events
    }

    /// The raw response as received
    pub fn raw(&self) -> &Value {
        &self.common().raw
    }

    /// RDAP `objectClassName` of this record
    pub fn object_class(&self) -> &'static str {
        match self {
            RdapRecord::Domain(_) => "domain",
            RdapRecord::IpNetwork(_) => "ip network",
        }
    }

    /// Serialize the normalized fields back into an RDAP-shaped JSON object
    ///
    /// Protocol fields that normalization discards are not reproduced.
    pub fn to_rdap_json(&self) -> Value {
        let mut obj = json!({ "objectClassName": self.object_class() });
        self.common().write_rdap_json(&mut obj);

        match self {
            RdapRecord::Domain(d) => {
                obj["nameservers"] = Value::Array(
                    d.nameservers
                        .iter()
                        .map(|ns| json!({"objectClassName": "nameserver", "ldhName": ns.ldh_name}))
                        .collect(),
                );
                if let Some(signed) = d.delegation_signed {
                    obj["secureDNS"] = json!({ "delegationSigned": signed });
                }
                let mut links = vec![json!({"rel": "self", "href": d.links.self_link})];
                if let Some(related) = &d.links.related {
                    links.push(json!({"rel": "related", "href": related}));
                }
                obj["links"] = Value::Array(links);
            }
            RdapRecord::IpNetwork(ip) => {
                let optional = [
                    ("startAddress", &ip.start_address),
                    ("endAddress", &ip.end_address),
                    ("ipVersion", &ip.ip_version),
                    ("name", &ip.name),
                    ("type", &ip.network_type),
                    ("country", &ip.country),
                    ("parentHandle", &ip.parent_handle),
                    ("port43", &ip.port43),
                ];
                for (key, value) in optional {
                    if let Some(v) = value {
                        obj[key] = json!(v);
                    }
                }
                obj["cidr0_cidrs"] = Value::Array(
                    ip.cidrs
                        .iter()
                        .map(|c| {
                            let mut cidr = json!({ "length": c.length });
                            if let Some(v4) = &c.v4prefix {
                                cidr["v4prefix"] = json!(v4);
                            }
                            if let Some(v6) = &c.v6prefix {
                                cidr["v6prefix"] = json!(v6);
                            }
                            cidr
                        })
                        .collect(),
                );
                obj["links"] = Value::Array(
                    ip.links
                        .iter()
                        .map(|l| json!({"value": l.value, "rel": l.rel, "href": l.href}))
                        .collect(),
                );
                obj["remarks"] = Value::Array(
                    ip.remarks
                        .iter()
                        .map(|r| json!({"description": r.description}))
                        .collect(),
                );
                if !ip.redacted.is_empty() {
                    obj["redacted"] = Value::Array(
                        ip.redacted
                            .iter()
                            .map(|r| {
                                json!({
                                    "name": {"description": r.name},
                                    "reason": {"description": r.reason},
                                    "prePath": r.pre_path,
                                    "method": r.method,
                                })
                            })
                            .collect(),
                    );
                }
            }
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(params: Value, kind: &str, value: Value) -> CardField {
        let parameters = match params {
            Value::Object(map) => map.into_iter().collect(),
            _ => Vec::new(),
        };
        CardField {
            name: "fn".to_string(),
            parameters,
            kind: CardValueKind::from_type(kind),
            value,
        }
    }

    #[test]
    fn test_text_field_prefers_parameters() {
        let f = field(
            json!({"label": "1 Main St\nSpringfield"}),
            "text",
            json!(["", "", "1 Main St", "Springfield", "", "", ""]),
        );
        assert_eq!(f.display_value(), "1 Main St Springfield");
    }

    #[test]
    fn test_text_field_falls_back_to_value() {
        let f = field(json!({}), "text", json!("Example Registrar, Inc."));
        assert_eq!(f.display_value(), "Example Registrar, Inc.");

        let f = field(json!({}), "text", json!(["a", "b", "c"]));
        assert_eq!(f.display_value(), "a b c");
    }

    #[test]
    fn test_parameter_arrays_are_comma_joined() {
        let f = field(json!({"type": ["work", "voice"]}), "text", json!("+1.555"));
        assert_eq!(f.display_value(), "work,voice");
    }

    #[test]
    fn test_uri_field_uses_value() {
        let f = field(json!({"type": "work"}), "uri", json!("tel:+1.5555555555"));
        assert_eq!(f.display_value(), "tel:+1.5555555555");
    }

    #[test]
    fn test_empty_values_use_placeholder() {
        assert_eq!(field(json!({}), "text", json!("")).display_value(), NO_VALUE);
        assert_eq!(field(json!({}), "uri", Value::Null).display_value(), NO_VALUE);
        assert_eq!(
            field(json!({}), "text", json!(["", ""])).display_value(),
            " "
        );
    }

    #[test]
    fn test_cidr_display_prefers_v6() {
        let cidr = Cidr {
            v4prefix: Some("8.8.8.0".to_string()),
            v6prefix: Some("2001:4860::".to_string()),
            length: Some(32),
        };
        assert_eq!(cidr.display(), "2001:4860::/32");

        let cidr = Cidr {
            v4prefix: Some("8.8.8.0".to_string()),
            v6prefix: None,
            length: Some(24),
        };
        assert_eq!(cidr.display(), "8.8.8.0/24");
    }

    #[test]
    fn test_object_class() {
        let record = RdapRecord::Domain(DomainRecord::default());
        assert_eq!(record.object_class(), "domain");
        assert_eq!(record.to_rdap_json()["objectClassName"], "domain");

        let record = RdapRecord::IpNetwork(IpNetworkRecord::default());
        assert_eq!(record.object_class(), "ip network");
        assert!(record.entities().is_empty());
    }
}
