//! Engine scenarios driven through a scripted transport

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use url::Url;

use crate::core::cancel::CancelFlag;
use crate::core::context::{AuthRegistry, ScanContext};
use crate::core::kb::KnowledgeBase;
use crate::core::policy::{AlertThreshold, AttackStrength, BudgetPolicy};
use crate::core::tech::{Tech, TechSet};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::reporting::{Finding, Reporter};
use crate::sqli::dialects::DialectCatalog;
use crate::sqli::{
    ScanOutcome, SqliScan, SQL_CHECK_ERR, SQL_LOGIC_AND_FALSE, SQL_LOGIC_AND_TRUE,
    SQL_LOGIC_OR_TRUE, SQL_UNION_APPENDAGES,
};

const PARAM: &str = "id";

/// Maps the logical value of the tested parameter to a scripted response.
/// Unmapped values get the baseline body, mimicking a page that ignores
/// whatever it cannot interpret.
struct FakeTransport {
    responses: HashMap<String, (u16, String)>,
    default: (u16, String),
    failing: Vec<String>,
    log: Mutex<Vec<String>>,
}

impl FakeTransport {
    fn new(baseline: &str) -> Self {
        Self {
            responses: HashMap::new(),
            default: (200, baseline.to_string()),
            failing: Vec::new(),
            log: Mutex::new(Vec::new()),
        }
    }

    fn on(mut self, value: &str, body: &str) -> Self {
        self.responses
            .insert(value.to_string(), (200, body.to_string()));
        self
    }

    fn failing_on(mut self, value: &str) -> Self {
        self.failing.push(value.to_string());
        self
    }

    fn sent_values(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let value = request.param_value(PARAM).unwrap_or_default();
        self.log.lock().unwrap().push(value.clone());
        if self.failing.iter().any(|v| *v == value) {
            anyhow::bail!("connection reset by peer");
        }
        let (status, body) = self.responses.get(&value).unwrap_or(&self.default).clone();
        Ok(HttpResponse::new(status, body.into_bytes()))
    }
}

fn context(strength: AttackStrength, threshold: AlertThreshold) -> ScanContext {
    let techs = TechSet::all();
    ScanContext {
        policy: BudgetPolicy::derive(strength, threshold, &techs),
        techs,
        catalog: DialectCatalog::load().unwrap(),
        kb: KnowledgeBase::new(),
        cancel: CancelFlag::new(),
        auth: AuthRegistry::default(),
    }
}

async fn scan(
    transport: &FakeTransport,
    ctx: &ScanContext,
    orig: &str,
) -> (ScanOutcome, Vec<Finding>) {
    let url = Url::parse(&format!("http://target.test/page?{PARAM}={orig}")).unwrap();
    let mut reporter = Reporter::new();
    let outcome = SqliScan::new(transport, ctx, HttpRequest::get(url), PARAM, &mut reporter)
        .run()
        .await
        .unwrap();
    (outcome, reporter.findings().to_vec())
}

#[tokio::test]
async fn boolean_restrict_first_finds_controllable_query() {
    let baseline = "<h1>No results</h1>";
    let transport = FakeTransport::new(baseline)
        .on("foo AND 1=1 -- ", baseline)
        .on("foo AND 1=2 -- ", "<h1>Error</h1>");
    let ctx = context(AttackStrength::Medium, AlertThreshold::Low);

    let (outcome, findings) = scan(&transport, &ctx, "foo").await;

    assert!(outcome.found);
    assert_eq!(outcome.attack.as_deref(), Some("foo AND 1=1 -- "));
    assert_eq!(findings.len(), 1);
    assert!(findings[0].other_info.contains("foo AND 1=2 -- "));
}

#[tokio::test]
async fn boolean_no_data_broadens_then_restricts() {
    let baseline = "<table></table>";
    // every AND TRUE suffix mismatches the baseline, so the restrict-first
    // strategy passes without a finding and without burning the budget
    let mut transport = FakeTransport::new(baseline);
    for suffix in SQL_LOGIC_AND_TRUE {
        transport = transport.on(&format!("7{suffix}"), "<h1>oops</h1>");
    }
    let transport = transport
        .on("7 OR 1=1 -- ", "<table><tr>a</tr><tr>b</tr></table>")
        .on("7 AND 1=2 -- ", baseline);
    let ctx = context(AttackStrength::High, AlertThreshold::Low);

    let (outcome, findings) = scan(&transport, &ctx, "7").await;

    assert!(outcome.found);
    assert_eq!(outcome.attack.as_deref(), Some("7 OR 1=1 -- "));
    assert!(findings[0].other_info.contains("no data"));
}

#[tokio::test]
async fn error_probe_identifies_dialect_and_records_fact() {
    let transport =
        FakeTransport::new("<p>ok</p>").on("'", "You have an error in your SQL syntax near ''");
    let ctx = context(AttackStrength::Low, AlertThreshold::Low);

    let (outcome, findings) = scan(&transport, &ctx, "5").await;

    assert!(outcome.found);
    assert_eq!(outcome.attack.as_deref(), Some("'"));
    assert_eq!(findings[0].name, "SQL Injection - MySQL");
    let evidence = findings[0].evidence.as_deref().unwrap();
    assert!(evidence.contains("error in your SQL syntax"));

    let url = Url::parse("http://target.test/page?id=5").unwrap();
    assert_eq!(ctx.kb.lookup(&url, "sql/MySQL").as_deref(), Some("true"));
}

#[tokio::test]
async fn boilerplate_error_text_in_baseline_is_not_a_finding() {
    // the fragment is on every page, mutated or not; the asymmetric oracle
    // must not fire
    let body = "this page statically says: You have an error in your SQL syntax";
    let transport = FakeTransport::new(body);
    let ctx = context(AttackStrength::Low, AlertThreshold::Low);

    let (outcome, findings) = scan(&transport, &ctx, "5").await;

    assert!(!outcome.found);
    assert!(findings.is_empty());
}

#[tokio::test]
async fn expression_differential_finds_server_side_evaluation() {
    let transport = FakeTransport::new("row: alice")
        .on("7-2", "row: alice")
        .on("8-2", "no rows");
    let ctx = context(AttackStrength::Low, AlertThreshold::Low);

    let (outcome, findings) = scan(&transport, &ctx, "5").await;

    assert!(outcome.found);
    assert_eq!(outcome.attack.as_deref(), Some("7-2"));
    assert_eq!(findings.len(), 1);
}

#[tokio::test]
async fn expression_probes_without_evaluation_do_not_alert() {
    // the target echoes the expression back instead of evaluating it
    let transport = FakeTransport::new("row: alice")
        .on("7-2", "unknown id: 7-2")
        .on("10/2", "unknown id: 10/2");
    let ctx = context(AttackStrength::Low, AlertThreshold::Low);

    let (outcome, findings) = scan(&transport, &ctx, "5").await;

    assert!(!outcome.found);
    assert!(findings.is_empty());
}

#[tokio::test]
async fn expression_family_skips_non_integer_values() {
    let transport = FakeTransport::new("<p>ok</p>");
    let ctx = context(AttackStrength::Low, AlertThreshold::Low);

    let (outcome, _) = scan(&transport, &ctx, "alice").await;

    assert!(!outcome.found);
    assert!(transport
        .sent_values()
        .iter()
        .all(|v| !v.ends_with("-2") && !v.ends_with("/2")));
}

#[tokio::test]
async fn union_error_fragment_is_detected_asymmetrically() {
    let transport = FakeTransport::new("<p>products</p>").on(
        "5' UNION ALL select NULL -- ",
        "The used SELECT statements have a different number of columns",
    );
    let ctx = context(AttackStrength::Medium, AlertThreshold::Low);

    let (outcome, findings) = scan(&transport, &ctx, "5").await;

    assert!(outcome.found);
    assert_eq!(
        outcome.attack.as_deref(),
        Some("5' UNION ALL select NULL -- ")
    );
    assert_eq!(findings[0].name, "SQL Injection - MySQL");
    assert!(findings[0]
        .evidence
        .as_deref()
        .unwrap()
        .contains("different number of columns"));
}

#[tokio::test]
async fn order_by_divergence_after_matching_asc_probe() {
    let transport = FakeTransport::new("alice,bob,carol")
        .on("name ASC  -- ", "alice,bob,carol")
        .on("name DESC  -- ", "carol,bob,alice");
    let ctx = context(AttackStrength::High, AlertThreshold::Low);

    let (outcome, findings) = scan(&transport, &ctx, "name").await;

    assert!(outcome.found);
    assert_eq!(outcome.attack.as_deref(), Some("name ASC  -- "));
    assert_eq!(findings[0].evidence.as_deref(), Some("name ASC  -- "));
}

#[tokio::test]
async fn order_by_requires_the_flip_to_change_output() {
    // every suffix reproduces the page; ordering is not under our control
    let transport = FakeTransport::new("alice,bob")
        .on("name ASC  -- ", "alice,bob")
        .on("name DESC  -- ", "alice,bob");
    let ctx = context(AttackStrength::High, AlertThreshold::Low);

    let (outcome, findings) = scan(&transport, &ctx, "name").await;

    assert!(!outcome.found);
    assert!(findings.is_empty());
}

#[tokio::test]
async fn low_strength_never_issues_boolean_union_or_order_by_probes() {
    let transport = FakeTransport::new("<p>page</p>");
    let ctx = context(AttackStrength::Low, AlertThreshold::Low);

    let (outcome, _) = scan(&transport, &ctx, "5").await;

    assert!(!outcome.found);
    for value in transport.sent_values() {
        assert!(
            !value.contains("AND 1=1") && !value.contains("UNION") && !value.contains(" ASC "),
            "family disabled at low strength sent a probe: {value:?}"
        );
    }
}

#[tokio::test]
async fn high_threshold_disables_error_probing() {
    let transport = FakeTransport::new("<p>page</p>");
    let ctx = context(AttackStrength::Medium, AlertThreshold::High);

    let (_, _) = scan(&transport, &ctx, "5").await;

    let error_probe = |v: &str| SQL_CHECK_ERR.iter().any(|m| v == *m || v == format!("5{m}"));
    assert!(
        !transport.sent_values().iter().any(|v| error_probe(v)),
        "error probes were sent despite the high threshold"
    );
}

#[tokio::test]
async fn request_counts_respect_every_family_ceiling() {
    // no scripted responses, so no family ever confirms and each runs to
    // its ceiling: error 8, boolean 6, union 5 at medium strength
    let transport = FakeTransport::new("<p>page</p>");
    let ctx = context(AttackStrength::Medium, AlertThreshold::Low);

    let (outcome, _) = scan(&transport, &ctx, "5").await;
    assert!(!outcome.found);

    let sent = transport.sent_values();
    let error_probes = sent
        .iter()
        .filter(|v| SQL_CHECK_ERR.iter().any(|m| **v == **m || **v == format!("5{m}")))
        .count();
    assert_eq!(error_probes, 8);

    let boolean_probes = sent
        .iter()
        .filter(|v| {
            SQL_LOGIC_AND_TRUE
                .iter()
                .chain(SQL_LOGIC_AND_FALSE)
                .chain(SQL_LOGIC_OR_TRUE)
                .any(|s| **v == format!("5{s}"))
        })
        .count();
    assert_eq!(boolean_probes, 6);

    let union_probes = sent
        .iter()
        .filter(|v| SQL_UNION_APPENDAGES.iter().any(|s| **v == format!("5{s}")))
        .count();
    assert_eq!(union_probes, 5);
}

#[tokio::test]
async fn transport_failures_skip_to_the_next_probe() {
    let transport = FakeTransport::new("<p>ok</p>")
        .failing_on("'")
        .failing_on("5'")
        .on("\"", "error [Microsoft] ODBC driver fault");
    let ctx = context(AttackStrength::Low, AlertThreshold::Low);

    let (outcome, findings) = scan(&transport, &ctx, "5").await;

    assert!(outcome.found);
    assert_eq!(outcome.attack.as_deref(), Some("\""));
    assert_eq!(findings[0].name, "SQL Injection - Microsoft SQL Server");
}

#[tokio::test]
async fn cancellation_stops_the_scan_before_any_request() {
    let transport = FakeTransport::new("<p>ok</p>");
    let ctx = context(AttackStrength::Insane, AlertThreshold::Low);
    ctx.cancel.cancel();

    let (outcome, findings) = scan(&transport, &ctx, "5").await;

    assert!(!outcome.found);
    assert!(findings.is_empty());
    assert!(transport.sent_values().is_empty());
}

#[tokio::test]
async fn login_page_findings_also_raise_authentication_bypass() {
    let transport =
        FakeTransport::new("<p>ok</p>").on("'", "ORA-00933: SQL command not properly ended");
    let mut ctx = context(AttackStrength::Low, AlertThreshold::Low);
    ctx.auth = AuthRegistry::new(vec![Url::parse("http://target.test/page").unwrap()]);

    let (outcome, findings) = scan(&transport, &ctx, "5").await;

    assert!(outcome.found);
    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0].name, "SQL Injection - Oracle");
    assert_eq!(findings[1].name, "SQL Injection - Authentication Bypass");
    assert_eq!(findings[1].attack, "'");
}

#[tokio::test]
async fn out_of_scope_dialects_are_not_reported() {
    let transport =
        FakeTransport::new("<p>ok</p>").on("'", "You have an error in your SQL syntax");
    let techs = TechSet::of([Tech::PostgreSql]);
    let ctx = ScanContext {
        policy: BudgetPolicy::derive(AttackStrength::Medium, AlertThreshold::Low, &techs),
        techs,
        catalog: DialectCatalog::load().unwrap(),
        kb: KnowledgeBase::new(),
        cancel: CancelFlag::new(),
        auth: AuthRegistry::default(),
    };

    let (outcome, findings) = scan(&transport, &ctx, "5").await;

    assert!(!outcome.found);
    assert!(findings.is_empty());
}

#[tokio::test]
async fn repeated_scans_reach_the_same_verdict() {
    let make = || {
        FakeTransport::new("row: alice")
            .on("7-2", "row: alice")
            .on("8-2", "no rows")
    };
    let ctx = context(AttackStrength::Low, AlertThreshold::Low);

    let first_transport = make();
    let (first, _) = scan(&first_transport, &ctx, "5").await;
    let second_transport = make();
    let (second, _) = scan(&second_transport, &ctx, "5").await;

    assert_eq!(first.found, second.found);
    assert_eq!(first.attack, second.attack);
    assert_eq!(
        first_transport.sent_values(),
        second_transport.sent_values()
    );
}
