//! Report rendering
//!
//! Turns a fetch result plus a view selection and page number into the embeds
//! and components of a report message, or into a raw-response file.

use super::flatten::flatten;
use super::types::{RdapRecord, NO_VALUE};
use super::RdapFetchResult;
use crate::lens::utils::truncate_name;
use crate::message::{
    ButtonStyle, Component, Embed, EmbedField, EmbedFooter, FileAttachment, SelectOption,
};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

pub const REPORT_TITLE: &str = "RDAP Response";
pub const SELECT_MENU_ID: &str = "whois_select_menu";
pub const NEXT_BUTTON_ID: &str = "whois_next";
pub const PREVIOUS_BUTTON_ID: &str = "whois_previous";
/// First field of every entities page; carries the current page number
pub const PAGE_FIELD_NAME: &str = "Entity Number";
pub const RAW_FILE_NAME: &str = "RDAP_Response.txt";

/// Platform limits on embed contents
const MAX_FIELDS: usize = 25;
const MAX_FIELD_VALUE: usize = 1024;
const MAX_FIELD_NAME: usize = 256;

// =============================================================================
// Views
// =============================================================================

/// A selectable section of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RdapView {
    NameServers,
    Entities,
    Events,
    IpInfo,
    Raw,
}

impl RdapView {
    /// Menu value identifying this view
    pub fn as_str(&self) -> &'static str {
        match self {
            RdapView::NameServers => "ns",
            RdapView::Entities => "entities",
            RdapView::Events => "events",
            RdapView::IpInfo => "ipinfo",
            RdapView::Raw => "raw",
        }
    }

    /// View shown when a report is first rendered
    pub fn initial_for(record: &RdapRecord) -> Self {
        match record {
            RdapRecord::Domain(_) => RdapView::NameServers,
            RdapRecord::IpNetwork(_) => RdapView::IpInfo,
        }
    }
}

impl fmt::Display for RdapView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RdapView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ns" => Ok(RdapView::NameServers),
            "entities" => Ok(RdapView::Entities),
            "events" => Ok(RdapView::Events),
            "ipinfo" => Ok(RdapView::IpInfo),
            "raw" => Ok(RdapView::Raw),
            other => Err(format!(
                "unknown view '{}', expected one of: ns, entities, events, ipinfo, raw",
                other
            )),
        }
    }
}

/// Select-menu options offered for a record
///
/// "Entities" is offered only when the record lists any.
pub fn menu_options(record: &RdapRecord) -> Vec<SelectOption> {
    let mut options = vec![SelectOption::new("Raw Response", "raw", "Raw RDAP Response")];
    let entities_description = match record {
        RdapRecord::IpNetwork(_) => {
            options.push(SelectOption::new(
                "IP Info",
                "ipinfo",
                "IP Information (CIDR, name, country)",
            ));
            options.push(SelectOption::new(
                "IP Events",
                "events",
                "IP registration events (registration, changes, etc)",
            ));
            "IP Entities"
        }
        RdapRecord::Domain(_) => {
            options.push(SelectOption::new("Name Servers", "ns", "Domain nameservers"));
            options.push(SelectOption::new(
                "Domain Events",
                "events",
                "Domain registration events (expiration, registration, etc)",
            ));
            "Domain Entities"
        }
    };

    if !record.entities().is_empty() {
        options.push(SelectOption::new("Entities", "entities", entities_description));
    }
    options
}

// =============================================================================
// Rendering
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedReport {
    pub embeds: Vec<Embed>,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Report(RenderedReport),
    /// The verbatim response, pretty-printed, as a file
    Raw(FileAttachment),
}

/// Render one view of a fetch result
///
/// A failed result renders to an empty report. `page` only matters for the
/// entities view, where it is clamped into the valid range.
pub fn render(result: &RdapFetchResult, view: RdapView, page: i64, footer: &str) -> RenderOutcome {
    let Some(record) = result.record() else {
        return RenderOutcome::Report(RenderedReport::default());
    };

    if view == RdapView::Raw {
        let content = pretty_json(record.raw());
        return RenderOutcome::Raw(FileAttachment::text(RAW_FILE_NAME, content));
    }

    let mut fields = Vec::new();
    let mut components = Vec::new();

    match (view, record) {
        (RdapView::NameServers, RdapRecord::Domain(domain)) => {
            let lines = domain
                .nameservers
                .iter()
                .map(|ns| format!("{} ", ns.ldh_name.to_lowercase()))
                .collect::<Vec<_>>()
                .join("\n");
            fields.push(EmbedField::new(
                "Name Servers",
                format!("```fix\n{}```", lines),
            ));
        }
        (RdapView::IpInfo, RdapRecord::IpNetwork(ip)) => {
            let cidrs = ip.cidrs.iter().map(|c| c.display()).collect::<Vec<_>>();
            let cidrs = if cidrs.is_empty() {
                NO_VALUE.to_string()
            } else {
                format!("`{}`", cidrs.join("`, `"))
            };
            fields.push(EmbedField::new("IP CIDR(s)", cidrs));
            fields.push(EmbedField::inline("Block Name", or_placeholder(&ip.name)));
            fields.push(EmbedField::new("Ip Version", or_placeholder(&ip.ip_version)));
            fields.push(EmbedField::new("Ip Country", or_placeholder(&ip.country)));
        }
        (RdapView::Events, _) => {
            for event in record.events() {
                let name = if event.action.is_empty() {
                    NO_VALUE.to_string()
                } else {
                    event.action.clone()
                };
                fields.push(EmbedField::new(name, timestamp_token(&event.date)));
            }
        }
        (RdapView::Entities, _) => {
            let pages = flatten(record.entities());
            let total = pages.len() as i64;
            let page = page.clamp(1, total.max(1));

            fields.push(EmbedField::new(PAGE_FIELD_NAME, page.to_string()));
            if let Some(entries) = usize::try_from(page - 1).ok().and_then(|i| pages.get(i)) {
                fields.extend(entries.iter().cloned());
            }

            components.push(Component::action_row(vec![
                Component::button(ButtonStyle::Primary, "←", PREVIOUS_BUTTON_ID, page <= 1),
                Component::button(ButtonStyle::Primary, "→", NEXT_BUTTON_ID, page >= total),
            ]));
        }
        // view does not apply to this object class
        _ => {}
    }

    // navigation sits above the view menu
    components.push(Component::action_row(vec![Component::string_select(
        SELECT_MENU_ID,
        menu_options(record),
    )]));

    let embed = Embed {
        title: Some(REPORT_TITLE.to_string()),
        description: None,
        fields: fit_fields(fields),
        footer: Some(EmbedFooter {
            text: footer.to_string(),
        }),
        color: Some(embed_color(record)),
    };

    RenderOutcome::Report(RenderedReport {
        embeds: vec![embed],
        components,
    })
}

/// Page number carried by a rendered entities report, if any
pub fn parse_page_field(embeds: &[Embed]) -> Option<i64> {
    let field = embeds.first()?.fields.first()?;
    if field.name != PAGE_FIELD_NAME {
        return None;
    }
    field.value.trim().parse().ok()
}

fn or_placeholder(value: &Option<String>) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NO_VALUE.to_string(),
    }
}

/// Relative-time token the client renders in the reader's timezone
fn timestamp_token(date: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(date) {
        Ok(ts) => format!("<t:{}>", ts.timestamp()),
        Err(_) if date.is_empty() => NO_VALUE.to_string(),
        Err(_) => date.to_string(),
    }
}

fn pretty_json(value: &serde_json::Value) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    match serde::Serialize::serialize(value, &mut ser) {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => value.to_string(),
    }
}

/// Keep embeds within the platform's size limits
fn fit_fields(mut fields: Vec<EmbedField>) -> Vec<EmbedField> {
    fields.truncate(MAX_FIELDS);
    for field in fields.iter_mut() {
        if field.name.chars().count() > MAX_FIELD_NAME {
            field.name = truncate_name(&field.name, MAX_FIELD_NAME);
        }
        if field.value.chars().count() > MAX_FIELD_VALUE {
            field.value = truncate_name(&field.value, MAX_FIELD_VALUE);
        }
    }
    fields
}

/// Pastel color that stays the same for every render of one record
fn embed_color(record: &RdapRecord) -> u32 {
    let mut hasher = DefaultHasher::new();
    record.handle().unwrap_or_default().hash(&mut hasher);
    let hash = hasher.finish();
    let channel = |shift: u32| 127 + ((hash >> shift) & 0x7f) as u32;
    (channel(0) << 16) | (channel(8) << 8) | channel(16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lens::rdap::normalize::tests::{EXAMPLE_DOMAIN, EXAMPLE_IP};
    use crate::lens::rdap::{normalize, RdapFetchResult};

    fn fetched(raw: &str) -> RdapFetchResult {
        RdapFetchResult::success(normalize(raw).unwrap(), "rdap.example.net")
    }

    fn report(outcome: RenderOutcome) -> RenderedReport {
        match outcome {
            RenderOutcome::Report(report) => report,
            RenderOutcome::Raw(_) => panic!("expected a report"),
        }
    }

    fn values(select: &Component) -> Vec<&str> {
        select.options.iter().map(|o| o.value.as_str()).collect()
    }

    #[test]
    fn test_view_parsing() {
        for view in [
            RdapView::NameServers,
            RdapView::Entities,
            RdapView::Events,
            RdapView::IpInfo,
            RdapView::Raw,
        ] {
            assert_eq!(view.as_str().parse::<RdapView>(), Ok(view));
        }
        assert!("whois".parse::<RdapView>().is_err());
    }

    #[test]
    fn test_domain_initial_view() {
        let result = fetched(EXAMPLE_DOMAIN);
        let record = result.record().unwrap();
        assert_eq!(RdapView::initial_for(record), RdapView::NameServers);

        let report = report(render(&result, RdapView::NameServers, 1, "footer"));
        let embed = &report.embeds[0];
        assert_eq!(embed.title.as_deref(), Some(REPORT_TITLE));
        assert_eq!(embed.footer_text(), "footer");
        assert!(embed.fields[0].value.starts_with("```fix\n"));
        assert!(embed.fields[0].value.contains("a.iana-servers.net \n"));
        assert!(embed.fields[0].value.ends_with("b.iana-servers.net ```"));

        let select = report.components[0].find(SELECT_MENU_ID).unwrap();
        assert_eq!(values(select), vec!["raw", "ns", "events", "entities"]);
    }

    #[test]
    fn test_ip_info_view() {
        let result = fetched(EXAMPLE_IP);
        assert_eq!(
            RdapView::initial_for(result.record().unwrap()),
            RdapView::IpInfo
        );

        let report = report(render(&result, RdapView::IpInfo, 1, ""));
        let fields = &report.embeds[0].fields;
        assert_eq!(fields[0].name, "IP CIDR(s)");
        assert_eq!(fields[0].value, "`8.8.8.0/24`, `8.8.4.0/24`");
        assert_eq!(fields[1].name, "Block Name");
        assert!(fields[1].inline);
        assert_eq!(fields[1].value, "GOGL");
        assert_eq!(fields[3].value, NO_VALUE);

        let select = report.components[0].find(SELECT_MENU_ID).unwrap();
        assert_eq!(values(select), vec!["raw", "ipinfo", "events", "entities"]);
    }

    #[test]
    fn test_events_view() {
        let result = fetched(EXAMPLE_DOMAIN);
        let report = report(render(&result, RdapView::Events, 1, ""));
        let fields = &report.embeds[0].fields;
        assert_eq!(fields[0].name, "registration");
        assert_eq!(fields[0].value, "<t:808372800>");
        assert_eq!(fields[1].name, "expiration");
    }

    #[test]
    fn test_events_keep_unparseable_dates() {
        let result = fetched(
            r#"{"objectClassName":"domain","events":[
                {"eventAction":"last changed","eventDate":"2023-08-14"},
                {"eventAction":"registration","eventDate":""},
                {"eventAction":"expiration","eventDate":"2024-08-13T07:01:44Z"}
            ]}"#,
        );
        let report = report(render(&result, RdapView::Events, 1, ""));
        let fields = &report.embeds[0].fields;
        assert_eq!(fields[0].value, "2023-08-14");
        assert_eq!(fields[1].value, NO_VALUE);
        assert_eq!(fields[2].value, "<t:1723532504>");
    }

    #[test]
    fn test_entities_pages() {
        let result = fetched(EXAMPLE_DOMAIN);

        let first = report(render(&result, RdapView::Entities, 1, ""));
        let fields = &first.embeds[0].fields;
        assert_eq!(fields[0].name, PAGE_FIELD_NAME);
        assert_eq!(fields[0].value, "1");
        assert_eq!(fields[1].value, "registrar");
        let nav = &first.components[0];
        assert!(first.components[1].find(SELECT_MENU_ID).is_some());
        assert!(nav.find(PREVIOUS_BUTTON_ID).unwrap().disabled);
        assert!(!nav.find(NEXT_BUTTON_ID).unwrap().disabled);
        assert_eq!(parse_page_field(&first.embeds), Some(1));

        let second = report(render(&result, RdapView::Entities, 2, ""));
        let fields = &second.embeds[0].fields;
        assert_eq!(fields[1].value, "abuse");
        // empty fn falls back to the placeholder
        assert_eq!(fields[2].value, NO_VALUE);
        let nav = &second.components[0];
        assert!(!nav.find(PREVIOUS_BUTTON_ID).unwrap().disabled);
        assert!(nav.find(NEXT_BUTTON_ID).unwrap().disabled);
    }

    #[test]
    fn test_entities_page_is_clamped() {
        let result = fetched(EXAMPLE_DOMAIN);
        for page in [-5, 0, 1, 2, 3, 99, i64::MIN, i64::MAX] {
            let clamped = page.clamp(1, 2);
            assert_eq!(
                render(&result, RdapView::Entities, page, "f"),
                render(&result, RdapView::Entities, clamped, "f"),
                "page {}",
                page
            );
        }
    }

    #[test]
    fn test_entities_without_entities() {
        let result = fetched(r#"{"objectClassName":"domain"}"#);
        let select = menu_options(result.record().unwrap());
        assert!(select.iter().all(|o| o.value != "entities"));

        let report = report(render(&result, RdapView::Entities, 4, ""));
        assert_eq!(report.embeds[0].fields.len(), 1);
        assert_eq!(report.embeds[0].fields[0].value, "1");
        let nav = &report.components[0];
        assert!(nav.find(PREVIOUS_BUTTON_ID).unwrap().disabled);
        assert!(nav.find(NEXT_BUTTON_ID).unwrap().disabled);
    }

    #[test]
    fn test_raw_export() {
        let result = fetched(EXAMPLE_IP);
        let RenderOutcome::Raw(file) = render(&result, RdapView::Raw, 1, "") else {
            panic!("expected raw export");
        };
        assert_eq!(file.file_name, RAW_FILE_NAME);
        let text = String::from_utf8(file.content).unwrap();
        assert!(text.contains("\n    \"objectClassName\": \"ip network\""));
        let reparsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(&reparsed, result.record().unwrap().raw());
    }

    #[test]
    fn test_failed_result_renders_empty() {
        let result = RdapFetchResult::failure("RDAP server did not respond.");
        assert_eq!(
            render(&result, RdapView::Entities, 1, ""),
            RenderOutcome::Report(RenderedReport::default())
        );
    }

    #[test]
    fn test_color_is_stable_and_pastel() {
        let result = fetched(EXAMPLE_DOMAIN);
        let a = report(render(&result, RdapView::NameServers, 1, ""));
        let b = report(render(&result, RdapView::Events, 1, ""));
        let color = a.embeds[0].color.unwrap();
        assert_eq!(Some(color), b.embeds[0].color);
        for shift in [0, 8, 16] {
            assert!((color >> shift) & 0xff >= 127);
        }
    }

    #[test]
    fn test_long_values_are_truncated() {
        let long = format!(
            r#"{{"objectClassName":"domain","entities":[{{"roles":["r"],"vcardArray":["vcard",[["note",{{}},"text","{}"]]]}}]}}"#,
            "x".repeat(3000)
        );
        let result = fetched(&long);
        let report = report(render(&result, RdapView::Entities, 1, ""));
        let value = &report.embeds[0].fields[2].value;
        assert_eq!(value.chars().count(), MAX_FIELD_VALUE);
        assert!(value.ends_with("..."));
    }

    #[test]
    fn test_parse_page_field_rejects_other_views() {
        let result = fetched(EXAMPLE_DOMAIN);
        let ns = report(render(&result, RdapView::NameServers, 1, ""));
        assert_eq!(parse_page_field(&ns.embeds), None);
        assert_eq!(parse_page_field(&[]), None);
    }
}
