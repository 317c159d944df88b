//! Debugging utility for the Ariadne resolver
//!
//! Runs individual stages of a resolution against the configured
//! upstream services and prints what each stage produced.
//!
//! **Usage:**
//! ```bash
//! ariadne-debug coverage-request '?genre=book&isbn=9780198129103&title=Hamlet'
//! ariadne-debug --catalog-url http://localhost:9000/pnxs catalog-links 'isbn=9780198129103'
//! ```

use anyhow::{Context, Result};
use ariadne_common::api::Link;
use ariadne_common::config::ResolverConfig;
use ariadne_common::logging::init_tracing_stderr;
use ariadne_common::OpenUrlQuery;
use ariadne_resolver::cli::ConfigArgs;
use ariadne_resolver::normalize::to_response;
use ariadne_resolver::{NormalizedLink, Resolver};
use clap::{Parser, Subcommand};
use serde::Serialize;

/// Ariadne resolver debugging utility
#[derive(Parser, Debug)]
#[command(name = "ariadne-debug")]
#[command(about = "Inspect each stage of an OpenURL resolution")]
#[command(version)]
struct Args {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the parsed OpenURL query string as JSON
    Params { query: String },
    /// Print the coverage service request
    CoverageRequest { query: String },
    /// Send the coverage service request and print the raw response body
    CoverageResponse { query: String },
    /// Print the coverage service links and found verdict as JSON
    CoverageTargets { query: String },
    /// Print the initial catalog ISBN search request
    CatalogRequest { query: String },
    /// Print every FRBR member search request issued for the query
    CatalogFrbrRequests { query: String },
    /// Print the raw catalog response bodies in call order
    CatalogResponses { query: String },
    /// Print the reconciled catalog links as JSON
    CatalogLinks { query: String },
    /// Run the full resolution and print the API response JSON
    ApiJson { query: String },
}

#[derive(Serialize)]
struct CoverageTargetsOutput {
    found: bool,
    links: Vec<Link>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Quiet unless asked for
    let mut overrides = args.config.overrides(None);
    if overrides.log_level.is_none() {
        overrides.log_level = Some("error".to_string());
    }
    let config = ResolverConfig::resolve(&overrides).context("Failed to resolve configuration")?;
    init_tracing_stderr(config.log_level);

    let resolver = Resolver::new(&config).context("Failed to initialize resolver")?;
    let output = run(&resolver, args.command).await?;
    println!("{output}");
    Ok(())
}

async fn run(resolver: &Resolver, command: Command) -> Result<String> {
    let output = match command {
        Command::Params { query } => pretty_json(&OpenUrlQuery::parse(&query))?,

        Command::CoverageRequest { query } => {
            let request = resolver.coverage().prepare(&OpenUrlQuery::parse(&query))?;
            request.dump
        }

        Command::CoverageResponse { query } => {
            let response = resolver.coverage().resolve(&OpenUrlQuery::parse(&query)).await?;
            response.raw_body
        }

        Command::CoverageTargets { query } => {
            let response = resolver.coverage().resolve(&OpenUrlQuery::parse(&query)).await?;
            pretty_json(&CoverageTargetsOutput {
                found: response.found,
                links: to_links(response.links),
            })?
        }

        Command::CatalogRequest { query } => {
            let request = resolver.catalog().prepare(&OpenUrlQuery::parse(&query))?;
            request.dump
        }

        Command::CatalogFrbrRequests { query } => {
            let response = resolver.catalog().resolve(&OpenUrlQuery::parse(&query)).await?;
            numbered_entries("FRBR member request", &response.frbr_request_dumps)
        }

        Command::CatalogResponses { query } => {
            let response = resolver.catalog().resolve(&OpenUrlQuery::parse(&query)).await?;
            numbered_entries("Catalog response", &response.response_bodies)
        }

        Command::CatalogLinks { query } => {
            let response = resolver.catalog().resolve(&OpenUrlQuery::parse(&query)).await?;
            pretty_json(&to_links(response.links))?
        }

        Command::ApiJson { query } => {
            let result = resolver.resolve(&query).await?;
            pretty_json(&to_response(result))?
        }
    };

    Ok(output)
}

fn to_links(links: Vec<NormalizedLink>) -> Vec<Link> {
    links.into_iter().map(Link::from).collect()
}

fn pretty_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}

/// Entries framed with numbered BEGIN/END banners
fn numbered_entries(label: &str, entries: &[String]) -> String {
    const RULE: &str = "=============================";

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("{RULE}\n{label} #{i}: BEGIN\n{RULE}\n{entry}\n{RULE}\n{label} #{i}: END\n{RULE}\n"))
        .collect::<Vec<_>>()
        .join("\n")
}
