use clap::Parser;

use crate::core::policy::{AlertThreshold, AttackStrength};

/// sqlprobe – differential SQL injection scanner
#[derive(Parser, Debug)]
#[command(
    name = "sqlprobe",
    version,
    about = "Differential SQL injection detection engine",
    long_about = r#"
sqlprobe tests the query parameters of a target URL for SQL injection using
a sequence of oracle-based probes:

  - error-based fingerprinting against a catalog of RDBMS error fragments
  - numeric expression differentials (n vs "n+2-2")
  - boolean differentials (restrict-first and broaden-first strategies)
  - UNION-specific error matching
  - ORDER BY differentials

Request budgets per probe family are derived from --strength; --threshold
trades coverage against false positives by disabling the noisier checks.
"#
)]
pub struct Cli {
    /// Target URL, including the query string whose parameters are tested
    pub target: String,

    /// Test only this parameter instead of every query parameter
    #[arg(long)]
    pub param: Option<String>,

    /// Attack strength, controls the per-family request ceilings
    #[arg(long, value_enum, default_value_t = AttackStrength::Medium)]
    pub strength: AttackStrength,

    /// Alert threshold; medium drops generic error matching, high disables
    /// error-based probing entirely
    #[arg(long, value_enum, default_value_t = AlertThreshold::Low)]
    pub threshold: AlertThreshold,

    /// Comma separated database scope (mysql, mssql, oracle, postgresql,
    /// db2, sybase, firebird, hypersonic, sqlite, generic); default: all
    #[arg(long)]
    pub dbms: Option<String>,

    /// Requests per second; 0 disables rate limiting
    #[arg(long, default_value_t = 10)]
    pub rate: u32,

    /// Known login page URL; findings there also raise an authentication
    /// bypass alert (repeatable)
    #[arg(long = "login-url")]
    pub login_urls: Vec<String>,

    /// Cookie header value for authenticated scanning
    #[arg(long)]
    pub cookies: Option<String>,

    /// Extra request header, as "Name: value" (repeatable)
    #[arg(long = "header")]
    pub headers: Vec<String>,

    /// Output format: text or json
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Write the report to this file instead of stdout
    #[arg(long)]
    pub output: Option<String>,
}
