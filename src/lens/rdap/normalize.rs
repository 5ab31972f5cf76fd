//! Raw RDAP JSON to [`RdapRecord`]
//!
//! Normalization is permissive: a field with an unexpected shape is treated as
//! absent instead of failing the whole record. Only a body that is not JSON, or
//! JSON with an unsupported `objectClassName`, is an error.

use super::types::*;
use serde_json::Value;

/// Parse and normalize a raw RDAP response body
pub fn normalize(raw: &str) -> Result<RdapRecord, RdapError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| RdapError::Parse(e.to_string()))?;
    normalize_value(value)
}

/// Normalize an already-parsed RDAP response
pub fn normalize_value(value: Value) -> Result<RdapRecord, RdapError> {
    let class = value
        .get("objectClassName")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match class.as_str() {
        "domain" => Ok(RdapRecord::Domain(domain(value))),
        "ip network" => Ok(RdapRecord::IpNetwork(ip_network(value))),
        _ => Err(RdapError::UnknownObjectClass(class)),
    }
}

// =============================================================================
// Field helpers
// =============================================================================

fn string(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn items<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn strings(value: &Value, key: &str) -> Vec<String> {
    items(value, key)
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// `{"description": "..."}` wrappers used by redaction markers
fn described(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| string(v, "description"))
}

// =============================================================================
// Shared structures
// =============================================================================

fn common(raw: &Value) -> RecordCommon {
    RecordCommon {
        raw: Value::Null,
        handle: string(raw, "handle"),
        status: strings(raw, "status"),
        events: items(raw, "events").iter().filter_map(event).collect(),
        notices: items(raw, "notices").iter().map(notice).collect(),
        conformance: strings(raw, "rdapConformance"),
        entities: items(raw, "entities").iter().map(entity).collect(),
    }
}

fn event(value: &Value) -> Option<Event> {
    let action = string(value, "eventAction")?;
    Some(Event {
        action,
        date: string(value, "eventDate").unwrap_or_default(),
    })
}

fn notice(value: &Value) -> Notice {
    Notice {
        title: string(value, "title"),
        description: strings(value, "description"),
        links: items(value, "links")
            .iter()
            .map(|l| NoticeLink {
                href: string(l, "href"),
                media_type: string(l, "type"),
            })
            .collect(),
    }
}

/// Entities nest through `entities`; depth is bounded by the JSON parser's
/// recursion limit.
fn entity(value: &Value) -> Entity {
    Entity {
        handle: string(value, "handle"),
        roles: strings(value, "roles"),
        card: contact_card(value.get("vcardArray")),
        entities: items(value, "entities").iter().map(entity).collect(),
    }
}

/// `["vcard", [[name, params, type, value], ...]]`
fn contact_card(value: Option<&Value>) -> ContactCard {
    let properties = value
        .and_then(Value::as_array)
        .and_then(|arr| arr.get(1))
        .and_then(Value::as_array);

    let Some(properties) = properties else {
        return ContactCard::default();
    };

    ContactCard {
        fields: properties.iter().filter_map(card_field).collect(),
    }
}

fn card_field(value: &Value) -> Option<CardField> {
    let parts = value.as_array()?;
    let name = parts.first()?.as_str()?.to_string();
    let parameters = parts
        .get(1)
        .and_then(Value::as_object)
        .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();
    let kind = parts.get(2).and_then(Value::as_str).unwrap_or("text");

    Some(CardField {
        name,
        parameters,
        kind: CardValueKind::from_type(kind),
        value: parts.get(3).cloned().unwrap_or(Value::Null),
    })
}

// =============================================================================
// Object classes
// =============================================================================

fn domain(raw: Value) -> DomainRecord {
    let links = items(&raw, "links");
    let link_for = |rel: &str| {
        links
            .iter()
            .find(|l| l.get("rel").and_then(Value::as_str) == Some(rel))
            .and_then(|l| string(l, "href"))
    };

    let mut record = DomainRecord {
        common: common(&raw),
        nameservers: items(&raw, "nameservers")
            .iter()
            .filter_map(|ns| string(ns, "ldhName"))
            .map(|ldh_name| Nameserver { ldh_name })
            .collect(),
        delegation_signed: raw
            .get("secureDNS")
            .and_then(|s| s.get("delegationSigned"))
            .and_then(Value::as_bool),
        links: DomainLinks {
            self_link: link_for("self").unwrap_or_default(),
            related: link_for("related"),
        },
    };
    record.common.raw = raw;
    record
}

fn ip_network(raw: Value) -> IpNetworkRecord {
    let mut record = IpNetworkRecord {
        common: common(&raw),
        start_address: string(&raw, "startAddress"),
        end_address: string(&raw, "endAddress"),
        ip_version: string(&raw, "ipVersion"),
        name: string(&raw, "name"),
        network_type: string(&raw, "type"),
        country: string(&raw, "country"),
        parent_handle: string(&raw, "parentHandle"),
        cidrs: items(&raw, "cidr0_cidrs")
            .iter()
            .map(|c| Cidr {
                v4prefix: string(c, "v4prefix"),
                v6prefix: string(c, "v6prefix"),
                length: c
                    .get("length")
                    .and_then(Value::as_u64)
                    .and_then(|l| u32::try_from(l).ok()),
            })
            .collect(),
        links: items(&raw, "links")
            .iter()
            .map(|l| Link {
                value: string(l, "value"),
                rel: string(l, "rel"),
                href: string(l, "href"),
            })
            .collect(),
        remarks: items(&raw, "remarks")
            .iter()
            .map(|r| Remark {
                description: strings(r, "description"),
            })
            .collect(),
        port43: string(&raw, "port43"),
        redacted: items(&raw, "redacted")
            .iter()
            .map(|r| Redaction {
                name: described(r, "name"),
                reason: described(r, "reason"),
                pre_path: string(r, "prePath"),
                method: string(r, "method"),
            })
            .collect(),
    };
    record.common.raw = raw;
    record
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const EXAMPLE_DOMAIN: &str = r#"{
        "objectClassName": "domain",
        "handle": "2336799_DOMAIN_COM-VRSN",
        "ldhName": "EXAMPLE.COM",
        "status": ["client delete prohibited", "client transfer prohibited"],
        "rdapConformance": ["rdap_level_0"],
        "links": [
            {"rel": "self", "href": "https://rdap.verisign.com/com/v1/domain/EXAMPLE.COM"},
            {"rel": "related", "href": "https://rdap.iana.org/domain/example.com"}
        ],
        "events": [
            {"eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z"},
            {"eventAction": "expiration", "eventDate": "2025-08-13T04:00:00Z"}
        ],
        "notices": [{"title": "Terms of Use", "description": ["Service subject to Terms of Use."], "links": [{"href": "https://www.verisign.com/terms", "type": "text/html"}]}],
        "nameservers": [
            {"objectClassName": "nameserver", "ldhName": "A.IANA-SERVERS.NET"},
            {"objectClassName": "nameserver", "ldhName": "B.IANA-SERVERS.NET"}
        ],
        "secureDNS": {"delegationSigned": true},
        "entities": [{
            "objectClassName": "entity",
            "handle": "376",
            "roles": ["registrar"],
            "vcardArray": ["vcard", [
                ["version", {}, "text", "4.0"],
                ["fn", {}, "text", "RESERVED-Internet Assigned Numbers Authority"]
            ]],
            "entities": [{
                "objectClassName": "entity",
                "roles": ["abuse"],
                "vcardArray": ["vcard", [
                    ["fn", {}, "text", ""],
                    ["tel", {"type": "voice"}, "uri", "tel:+1.3104561234"]
                ]]
            }]
        }]
    }"#;

    pub(crate) const EXAMPLE_IP: &str = r#"{
        "objectClassName": "ip network",
        "handle": "NET-8-8-8-0-2",
        "startAddress": "8.8.8.0",
        "endAddress": "8.8.8.255",
        "ipVersion": "v4",
        "name": "GOGL",
        "type": "DIRECT ALLOCATION",
        "parentHandle": "NET-8-0-0-0-0",
        "port43": "whois.arin.net",
        "status": ["active"],
        "cidr0_cidrs": [
            {"v4prefix": "8.8.8.0", "length": 24},
            {"v4prefix": "8.8.4.0", "length": 24}
        ],
        "events": [{"eventAction": "last changed", "eventDate": "2023-12-28T17:24:56-05:00"}],
        "remarks": [{"description": ["Google public DNS"]}],
        "links": [{"value": "https://rdap.arin.net/registry/ip/8.8.8.8", "rel": "self", "href": "https://rdap.arin.net/registry/ip/8.8.8.0"}],
        "entities": [{"handle": "GOGL", "roles": ["registrant"], "vcardArray": ["vcard", [["fn", {}, "text", "Google LLC"]]]}]
    }"#;

    #[test]
    fn test_normalize_domain() {
        let record = normalize(EXAMPLE_DOMAIN).unwrap();
        let RdapRecord::Domain(domain) = &record else {
            panic!("expected domain record");
        };
        assert_eq!(domain.common.handle.as_deref(), Some("2336799_DOMAIN_COM-VRSN"));
        assert_eq!(domain.nameservers.len(), 2);
        assert_eq!(domain.nameservers[0].ldh_name, "A.IANA-SERVERS.NET");
        assert_eq!(domain.delegation_signed, Some(true));
        assert_eq!(
            domain.links.related.as_deref(),
            Some("https://rdap.iana.org/domain/example.com")
        );
        assert_eq!(domain.common.events[1].action, "expiration");
        assert_eq!(domain.common.entities[0].entities.len(), 1);
        assert_eq!(record.raw()["ldhName"], "EXAMPLE.COM");
    }

    #[test]
    fn test_normalize_ip_network() {
        let record = normalize(EXAMPLE_IP).unwrap();
        let RdapRecord::IpNetwork(ip) = &record else {
            panic!("expected ip network record");
        };
        assert_eq!(ip.cidrs.len(), 2);
        assert_eq!(ip.cidrs[1].display(), "8.8.4.0/24");
        assert_eq!(ip.network_type.as_deref(), Some("DIRECT ALLOCATION"));
        assert_eq!(ip.port43.as_deref(), Some("whois.arin.net"));
        assert_eq!(ip.remarks[0].description, vec!["Google public DNS"]);
        assert!(ip.country.is_none());
    }

    #[test]
    fn test_normalize_rejects_unknown_class() {
        let err = normalize(r#"{"objectClassName":"autnum"}"#).unwrap_err();
        assert_eq!(err, RdapError::UnknownObjectClass("autnum".to_string()));

        let err = normalize(r#"{"handle":"x"}"#).unwrap_err();
        assert!(matches!(err, RdapError::UnknownObjectClass(_)));
    }

    #[test]
    fn test_normalize_rejects_invalid_json() {
        let err = normalize("<html>not found</html>").unwrap_err();
        assert!(matches!(err, RdapError::Parse(_)));
        assert!(err.to_string().starts_with("Error parsing RDAP data:"));
    }

    #[test]
    fn test_malformed_fields_are_absent() {
        let record = normalize(
            r#"{"objectClassName":"domain","status":"active","nameservers":{"x":1},"events":[{"eventDate":"2020"}],"entities":[{"vcardArray":"nope"}]}"#,
        )
        .unwrap();
        let RdapRecord::Domain(domain) = record else {
            panic!("expected domain record");
        };
        assert!(domain.common.status.is_empty());
        assert!(domain.nameservers.is_empty());
        assert!(domain.common.events.is_empty());
        assert!(domain.common.entities[0].card.fields.is_empty());
        assert_eq!(domain.links.self_link, "");
    }

    #[test]
    fn test_domain_survives_reserialization() {
        let strip = |mut record: RdapRecord| {
            match &mut record {
                RdapRecord::Domain(d) => d.common.raw = Value::Null,
                RdapRecord::IpNetwork(ip) => ip.common.raw = Value::Null,
            }
            record
        };

        for raw in [EXAMPLE_DOMAIN, EXAMPLE_IP] {
            let record = normalize(raw).unwrap();
            let again = normalize_value(record.to_rdap_json()).unwrap();
            assert_eq!(strip(record), strip(again));
        }
    }
}
