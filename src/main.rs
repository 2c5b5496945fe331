mod cli;
mod core;
mod http;
mod reporting;
mod sqli;

use anyhow::{Context as _, Result};
use clap::Parser;
use url::Url;

use crate::cli::args::Cli;
use crate::core::cancel::CancelFlag;
use crate::core::context::{AuthRegistry, ScanContext};
use crate::core::kb::KnowledgeBase;
use crate::core::policy::BudgetPolicy;
use crate::core::rate_limit::RateLimiter;
use crate::core::scope::Scope;
use crate::core::tech::{Tech, TechSet};
use crate::http::{HttpClient, HttpRequest};
use crate::reporting::Reporter;
use crate::sqli::dialects::DialectCatalog;
use crate::sqli::SqliScan;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Cli::parse();

    let target = Url::parse(&args.target)
        .with_context(|| format!("invalid target URL: {}", args.target))?;

    let params: Vec<String> = match args.param {
        Some(ref param) => vec![param.clone()],
        None => target.query_pairs().map(|(k, _)| k.into_owned()).collect(),
    };
    anyhow::ensure!(
        !params.is_empty(),
        "the target URL has no query parameters to test; pass one with --param"
    );

    let techs = match args.dbms {
        Some(ref list) => {
            let parsed: Result<Vec<Tech>> = list.split(',').map(str::parse).collect();
            TechSet::of(parsed?)
        }
        None => TechSet::all(),
    };

    let mut login_urls = Vec::with_capacity(args.login_urls.len());
    for raw in &args.login_urls {
        login_urls.push(Url::parse(raw).with_context(|| format!("invalid login URL: {raw}"))?);
    }

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, stopping at the next checkpoint");
                cancel.cancel();
            }
        });
    }

    let ctx = ScanContext {
        policy: BudgetPolicy::derive(args.strength, args.threshold, &techs),
        techs,
        catalog: DialectCatalog::load()?,
        kb: KnowledgeBase::new(),
        cancel,
        auth: AuthRegistry::new(login_urls),
    };

    let headers: Vec<(String, String)> = args
        .headers
        .iter()
        .filter_map(|raw| {
            raw.split_once(':')
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        })
        .collect();
    let client = HttpClient::with_auth(
        Scope::new(&target)?,
        RateLimiter::from_rps(args.rate),
        args.cookies.clone(),
        headers,
    )?;

    let mut reporter = Reporter::new();
    for param in params {
        if ctx.cancel.is_cancelled() {
            break;
        }
        tracing::info!(%param, "scanning parameter");
        let scan = SqliScan::new(
            &client,
            &ctx,
            HttpRequest::get(target.clone()),
            param.as_str(),
            &mut reporter,
        );
        match scan.run().await {
            Ok(outcome) => {
                tracing::info!(%param, found = outcome.found, "parameter scan finished");
            }
            Err(error) => {
                // one broken parameter must not sink the rest of the scan
                tracing::error!(%param, %error, "parameter scan aborted");
            }
        }
    }

    let rendered = match args.format.as_str() {
        "json" => reporting::json::render(target.as_str(), reporter.findings())?,
        "text" => reporting::text::render(target.as_str(), reporter.findings()),
        other => anyhow::bail!("unknown output format: {other} (expected text or json)"),
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("could not write report to {path}"))?;
            tracing::info!(path = %path, "report written");
        }
        None => println!("{rendered}"),
    }

    Ok(())
}
