use chrono::DateTime;
use chrono_humanize::HumanTime;
use clap::Args;
use rdapbot::database::{KvStore, MemoryKvStore, SqliteKvStore};
use rdapbot::lens::rdap::{render, RdapLens, RdapView, RenderOutcome, RenderedReport};
use rdapbot::lens::utils::OutputFormat;
use rdapbot::lens::whois::{TcpWhoisClient, WhoisClient};
use rdapbot::message::EmbedField;
use rdapbot::BotConfig;
use serde_json::json;
use std::sync::Arc;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Arguments for the Lookup command
#[derive(Args)]
pub struct LookupArgs {
    /// Domain name or IP address, e.g. "example.com" or "8.8.8.8"
    #[clap(required = true)]
    pub query: Vec<String>,

    /// View to print: ns, ipinfo, events, entities or raw
    #[clap(short, long)]
    pub view: Option<RdapView>,

    /// Entity page to print with `--view entities`
    #[clap(short, long, default_value_t = 1)]
    pub page: i64,

    /// Skip the on-disk lookup cache
    #[clap(long)]
    pub no_cache: bool,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub fn run(config: &BotConfig, args: LookupArgs, output_format: OutputFormat) {
    let LookupArgs {
        query,
        view,
        page,
        no_cache,
    } = args;
    let query = query.join(" ");

    let store: Arc<dyn KvStore> = if no_cache {
        Arc::new(MemoryKvStore::new())
    } else {
        match SqliteKvStore::open_in_dir(&config.data_dir) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                eprintln!("Failed to open cache database: {}", e);
                std::process::exit(1);
            }
        }
    };

    let lens = RdapLens::from_config(config, store);
    let result = lens.fetch(&query);

    let Some(record) = result.record() else {
        let error = result.error().unwrap_or_default().to_string();
        whois_fallback(config, &query, &error, output_format);
        return;
    };

    let view = view.unwrap_or_else(|| RdapView::initial_for(record));
    let source = result.source.clone().unwrap_or_default();
    let footer = format!("Data fetched from {}", source);

    match render(&result, view, page, &footer) {
        RenderOutcome::Raw(file) => {
            println!("{}", String::from_utf8_lossy(&file.content));
        }
        RenderOutcome::Report(report) => print_report(&report, &footer, output_format),
    }
}

fn print_report(report: &RenderedReport, footer: &str, output_format: OutputFormat) {
    let payload = json!({
        "embeds": report.embeds,
        "components": report.components,
    });

    match output_format {
        OutputFormat::Json => println!("{}", payload),
        OutputFormat::JsonPretty => match serde_json::to_string_pretty(&payload) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("Error serializing report: {}", e),
        },
        OutputFormat::Table | OutputFormat::Markdown => {
            let rows: Vec<FieldRow> = report
                .embeds
                .iter()
                .flat_map(|e| e.fields.iter())
                .map(field_row)
                .collect();
            if rows.is_empty() {
                println!("(nothing to show for this view)");
            } else if output_format == OutputFormat::Markdown {
                println!("{}", Table::new(rows).with(Style::markdown()));
            } else {
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
            println!("{}", footer);
        }
    }
}

fn field_row(field: &EmbedField) -> FieldRow {
    FieldRow {
        name: field.name.clone(),
        value: readable_value(&field.value),
    }
}

/// Expand `<t:unix>` tokens, which only a chat client can render
fn readable_value(value: &str) -> String {
    let ts = value
        .strip_prefix("<t:")
        .and_then(|v| v.strip_suffix('>'))
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0));
    match ts {
        Some(ts) => format!("{} ({})", ts.to_rfc3339(), HumanTime::from(ts)),
        None => value.to_string(),
    }
}

fn whois_fallback(config: &BotConfig, query: &str, error: &str, output_format: OutputFormat) {
    eprintln!("RDAP lookup failed: {}", error);

    let client = TcpWhoisClient::new(&config.whois_server).with_timeout(config.http_timeout());
    let answer = match client.query(query) {
        Ok(answer) => answer,
        Err(e) => {
            eprintln!("WHOIS lookup failed: {}", e);
            None
        }
    };

    let Some(text) = answer else {
        eprintln!("Could not find any information for the given query.");
        std::process::exit(1);
    };

    if output_format.is_json() {
        println!("{}", json!({ "rdap_error": error, "whois": text }));
    } else {
        println!("(Defaulted to WHOIS due to an error. `{}`)", error);
        println!("{}", text);
    }
}
