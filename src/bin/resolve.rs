//! Resolve a URL through its redirects and print the final response as JSON.
//!
//! Usage: `resolve [-v] [--max-redirects N] [--no-meta] [--no-script] [--json-key KEY] URL`
//!
//! With `--json-key`, the final page is parsed and the JSON blob following
//! `KEY` in its scripts is included in the output. Without it, a JSON
//! response is included as decoded.

use std::env;
use std::error::Error;
use std::process;

use scrapekit::{Document, HttpFetcher, JsonMap, JsonShape, Options, Outcome, Resolver};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Serialize)]
struct Output {
    url: String,
    status: u16,
    content_type: Option<String>,
    outcome: String,
    hops: usize,
    content_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    json: Option<JsonMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    json_error: Option<String>,
}

struct Args {
    url: String,
    verbose: bool,
    json_key: Option<String>,
    options: Options,
}

fn usage() -> ! {
    eprintln!(
        "usage: resolve [-v] [--max-redirects N] [--no-meta] [--no-script] [--json-key KEY] URL"
    );
    process::exit(2);
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut url = None;
    let mut verbose = false;
    let mut json_key = None;
    let mut options = Options::default();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-v" | "--verbose" => verbose = true,
            "--no-meta" => options.follow_meta_refresh = false,
            "--no-script" => options.follow_script_redirects = false,
            "--max-redirects" => {
                let value = args.next().ok_or("--max-redirects needs a value")?;
                options.max_redirects = value.parse()?;
            }
            "--json-key" => json_key = Some(args.next().ok_or("--json-key needs a value")?),
            "-h" | "--help" => usage(),
            flag if flag.starts_with('-') => return Err(format!("unknown flag {flag}").into()),
            _ if url.is_none() => url = Some(arg),
            _ => return Err("only one URL may be given".into()),
        }
    }

    let Some(url) = url else { usage() };
    Ok(Args {
        url,
        verbose,
        json_key,
        options,
    })
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "scrapekit=debug" } else { "scrapekit=warn" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn outcome_label(outcome: Outcome) -> String {
    match outcome {
        Outcome::Done => "done".to_string(),
        Outcome::Unusable => "unusable".to_string(),
        Outcome::NoRedirectTarget => "no-redirect-target".to_string(),
        Outcome::UnhandledStatus(status) => format!("unhandled-status-{status}"),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = parse_args()?;
    init_logging(args.verbose);

    let resolver = Resolver::new(HttpFetcher::new(&args.options)?, args.options);
    let resolved = resolver.resolve(&args.url)?;

    let (json, json_error) = match (&args.json_key, resolved.content()) {
        (Some(key), Some(body)) => {
            let doc = Document::parse(&body);
            match doc.find_json_for_script_with_key_shape(key, JsonShape::Unknown) {
                Ok(map) => (Some(map), None),
                Err(e) => (None, Some(e.to_string())),
            }
        }
        (Some(_), None) => (None, None),
        (None, _) => (resolved.json(), None),
    };

    let output = Output {
        url: resolved.url.to_string(),
        status: resolved.status,
        content_type: resolved.content_type.clone(),
        outcome: outcome_label(resolved.outcome),
        hops: resolved.hops,
        content_length: resolved.body.len(),
        json,
        json_error,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
