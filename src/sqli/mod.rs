//! Differential SQL injection detection engine
//!
//! One scan tests one request parameter. It runs an ordered, short
//! circuiting sequence of detection families: error-based, expression
//! based, boolean-based (restrict-first, then no-data), UNION-based, and
//! ORDER BY-based. The ordering matters for efficiency: the cheap, direct
//! checks come first, and whichever family confirms first ends the scan.
//! The winning attack string is kept for the authentication bypass
//! correlation afterwards.

pub mod boolean;
pub mod compare;
pub mod dialects;
pub mod error_based;
pub mod expression;
pub mod order_by;
pub mod strip;
pub mod union;

#[cfg(test)]
mod tests;

use anyhow::Result;
use regex::Regex;

use crate::core::context::ScanContext;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::reporting::{Finding, Reporter};
use crate::sqli::strip::strip_off;

/// Generic one-line comment; this syntax works with almost every RDBMS.
pub const SQL_ONE_LINE_COMMENT: &str = " -- ";

/// SQL metacharacters ordered so as to maximise the chance of a raw error.
/// Separate probes are made per family of characters: if one family is
/// filtered out by the application, another might still get past.
pub(crate) const SQL_CHECK_ERR: &[&str] = &["'", "\"", ";", "'(", ")", "(", "NULL", "'\""];

/// Always-true AND suffixes for the boolean check. Comment-terminated
/// variants come first: the column under test is usually not in the last
/// WHERE clause, so the rest of the query needs closing off. The last three
/// entries target SQL LIKE statements.
pub(crate) const SQL_LOGIC_AND_TRUE: &[&str] = &[
    " AND 1=1 -- ",
    "' AND '1'='1' -- ",
    "\" AND \"1\"=\"1\" -- ",
    " AND 1=1",
    "' AND '1'='1",
    "\" AND \"1\"=\"1",
    "%",
    "%'  -- ",
    "%\"  -- ",
];

/// Always-false AND suffixes, paired index-for-index with the list above.
pub(crate) const SQL_LOGIC_AND_FALSE: &[&str] = &[
    " AND 1=2 -- ",
    "' AND '1'='2' -- ",
    "\" AND \"1\"=\"2\" -- ",
    " AND 1=2",
    "' AND '1'='2",
    "\" AND \"1\"=\"2",
    "XYZABCDEFGHIJ",
    "XYZABCDEFGHIJ'  -- ",
    "XYZABCDEFGHIJ\"  -- ",
];

/// Always-true OR suffixes, used when the original query appears to return
/// no data at all.
pub(crate) const SQL_LOGIC_OR_TRUE: &[&str] = &[
    " OR 1=1 -- ",
    "' OR '1'='1' -- ",
    "\" OR \"1\"=\"1\" -- ",
    " OR 1=1",
    "' OR '1'='1",
    "\" OR \"1\"=\"1",
    "%",
    "%'  -- ",
    "%\"  -- ",
];

/// Generic UNION appendages, hoping for a recognisable UNION-specific error.
pub(crate) const SQL_UNION_APPENDAGES: &[&str] = &[
    " UNION ALL select NULL -- ",
    "' UNION ALL select NULL -- ",
    "\" UNION ALL select NULL -- ",
    ") UNION ALL select NULL -- ",
    "') UNION ALL select NULL -- ",
    "\") UNION ALL select NULL -- ",
];

/// The detection families, in the fixed order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    ErrorBased,
    ExpressionBased,
    BooleanRestrictFirst,
    BooleanNoData,
    UnionBased,
    OrderByBased,
}

const FAMILIES: [Family; 6] = [
    Family::ErrorBased,
    Family::ExpressionBased,
    Family::BooleanRestrictFirst,
    Family::BooleanNoData,
    Family::UnionBased,
    Family::OrderByBased,
];

/// Comparison anchor rebuilt by families that need a current view of the
/// unmodified page.
#[derive(Debug, Clone)]
pub struct Baseline {
    pub status: u16,
    pub raw: String,
    pub stripped: String,
}

/// Per-parameter mutable state, created fresh for every parameter scan.
/// Once `found` flips, no further requests are issued, and every family's
/// counter stays below its ceiling.
#[derive(Debug, Default)]
pub struct ScanState {
    pub found: bool,
    pub attack_value: Option<String>,
    pub base_body: String,
    pub baseline: Option<Baseline>,
    pub error_requests: usize,
    pub expression_requests: usize,
    pub boolean_requests: usize,
    pub union_requests: usize,
    pub order_by_requests: usize,
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub found: bool,
    pub attack: Option<String>,
}

/// One parameter scan against one target request.
pub struct SqliScan<'a, T: Transport> {
    pub(crate) transport: &'a T,
    pub(crate) ctx: &'a ScanContext,
    pub(crate) request: HttpRequest,
    pub(crate) param: String,
    pub(crate) orig_value: String,
    pub(crate) reporter: &'a mut Reporter,
}

impl<'a, T: Transport> SqliScan<'a, T> {
    pub fn new(
        transport: &'a T,
        ctx: &'a ScanContext,
        request: HttpRequest,
        param: impl Into<String>,
        reporter: &'a mut Reporter,
    ) -> Self {
        let param = param.into();
        let orig_value = request.param_value(&param).unwrap_or_default();
        Self {
            transport,
            ctx,
            request,
            param,
            orig_value,
            reporter,
        }
    }

    pub async fn run(mut self) -> Result<ScanOutcome> {
        if !self.ctx.techs.targets_sql() {
            tracing::debug!(param = %self.param, "no SQL technology in scope, skipping");
            return Ok(ScanOutcome {
                found: false,
                attack: None,
            });
        }
        if self.is_cancelled() {
            return Ok(ScanOutcome {
                found: false,
                attack: None,
            });
        }

        let mut state = ScanState::default();

        // Anchor for the asymmetric-match oracles. Not counted against any
        // family budget.
        match self.send(&self.request).await {
            Ok(response) => state.base_body = response.body_text(),
            Err(error) => {
                tracing::debug!(
                    %error,
                    url = %self.request.url,
                    "could not fetch the base response, abandoning this parameter"
                );
                return Ok(ScanOutcome {
                    found: false,
                    attack: None,
                });
            }
        }

        for family in FAMILIES {
            if state.found || self.is_cancelled() {
                break;
            }
            tracing::debug!(?family, param = %self.param, "running test family");
            match family {
                Family::ErrorBased => error_based::run(&mut self, &mut state).await?,
                Family::ExpressionBased => expression::run(&mut self, &mut state).await?,
                Family::BooleanRestrictFirst => boolean::restrict_first(&mut self, &mut state).await?,
                Family::BooleanNoData => boolean::no_data(&mut self, &mut state).await?,
                Family::UnionBased => union::run(&mut self, &mut state).await?,
                Family::OrderByBased => order_by::run(&mut self, &mut state).await?,
            }
        }

        if state.found && !self.ctx.cancel.is_cancelled() {
            self.raise_login_bypass(&state);
        }

        Ok(ScanOutcome {
            found: state.found,
            attack: state.attack_value,
        })
    }

    pub(crate) async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.transport.send(request).await
    }

    /// The original request with the tested parameter set to `value`.
    pub(crate) fn attacked(&self, value: &str) -> HttpRequest {
        self.request.with_param(&self.param, value)
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        let cancelled = self.ctx.cancel.is_cancelled();
        if cancelled {
            tracing::debug!("stopping the scan, cancellation was requested");
        }
        cancelled
    }

    pub(crate) fn uri(&self) -> String {
        self.request.url.to_string()
    }

    pub(crate) fn emit(&mut self, finding: Finding) {
        self.reporter.add(finding);
    }

    /// Re-issues the unmodified request and rebuilds the comparison anchor.
    /// Earlier families may have modified server-visible data, so every
    /// family that compares against a baseline refreshes it first. Not
    /// counted against any budget. Returns false when the transport failed
    /// and the family should be skipped.
    pub(crate) async fn refresh_baseline(&self, state: &mut ScanState) -> bool {
        match self.send(&self.request).await {
            Ok(response) => {
                let raw = response.body_text();
                let stripped = strip_off(&raw, &self.orig_value);
                state.baseline = Some(Baseline {
                    status: response.status,
                    raw,
                    stripped,
                });
                true
            }
            Err(error) => {
                tracing::debug!(
                    %error,
                    url = %self.request.url,
                    "baseline refresh failed, skipping this family"
                );
                false
            }
        }
    }

    /// An injectable parameter on a known login page also means the login
    /// itself can likely be bypassed with the same attack string.
    fn raise_login_bypass(&mut self, state: &ScanState) {
        if !self.ctx.auth.is_login_url(&self.request.url) {
            return;
        }
        let attack = state.attack_value.clone().unwrap_or_default();
        let finding = Finding::new(
            "SQL Injection - Authentication Bypass",
            self.uri(),
            self.param.clone(),
            attack,
        )
        .other_info(
            "the injectable parameter lives on a configured login page, so the \
             same attack string can likely be used to bypass authentication",
        );
        self.emit(finding);
    }
}

/// First pattern that matches the mutated body but did not match the
/// baseline. The asymmetry is what separates an induced database error from
/// boilerplate error text already present on the page.
pub(crate) fn first_new_match<'p>(
    patterns: &'p [Regex],
    baseline: &str,
    mutated: &str,
) -> Option<(&'p Regex, String)> {
    for pattern in patterns {
        if pattern.is_match(baseline) {
            continue;
        }
        if let Some(found) = pattern.find(mutated) {
            return Some((pattern, found.as_str().to_string()));
        }
    }
    None
}
