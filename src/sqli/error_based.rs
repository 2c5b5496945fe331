//! Error-based test: inject SQL metacharacters and look for database error
//! fragments that were absent from the base response.

use anyhow::Result;

use crate::http::Transport;
use crate::reporting::Finding;
use crate::sqli::{first_new_match, ScanState, SqliScan, SQL_CHECK_ERR};

pub(super) async fn run<T: Transport>(
    scan: &mut SqliScan<'_, T>,
    state: &mut ScanState,
) -> Result<()> {
    let ctx = scan.ctx;
    if !ctx.policy.specific_error {
        return Ok(());
    }

    let orig_value = scan.orig_value.clone();
    // Each metacharacter is tried bare and appended to the original value;
    // some injections only trigger behind a valid-looking value.
    let prefixes: Vec<String> = if orig_value.is_empty() {
        vec![String::new()]
    } else {
        vec![String::new(), orig_value]
    };

    'probes: for metachar in SQL_CHECK_ERR {
        for prefix in &prefixes {
            if state.found || state.error_requests >= ctx.policy.error_max {
                break 'probes;
            }
            if scan.is_cancelled() {
                return Ok(());
            }

            let attack = format!("{prefix}{metachar}");
            let request = scan.attacked(&attack);
            let response = match scan.send(&request).await {
                Ok(response) => response,
                Err(error) => {
                    tracing::debug!(%error, url = %request.url, "probe failed, trying the next prefix");
                    continue;
                }
            };
            state.error_requests += 1;
            // Do not filter on the status code here: induced errors come
            // back with all sorts of codes.
            let body = response.body_text();

            for dialect in ctx.catalog.dialects() {
                if scan.is_cancelled() {
                    return Ok(());
                }
                if dialect.is_generic() || !ctx.techs.includes(dialect.tech()) {
                    continue;
                }
                if let Some((pattern, evidence)) =
                    first_new_match(dialect.error_patterns(), &state.base_body, &body)
                {
                    let finding = Finding::new(
                        format!("SQL Injection - {}", dialect.name()),
                        scan.uri(),
                        scan.param.clone(),
                        attack.clone(),
                    )
                    .evidence(evidence)
                    .other_info(format!(
                        "RDBMS [{}] likely, given the error fragment [{pattern}] in the \
                         mutated response, absent from the original response",
                        dialect.name()
                    ));
                    // The dialect may be useful to later, RDBMS specific checks
                    ctx.kb
                        .record(&scan.request.url, &format!("sql/{}", dialect.name()), "true");
                    scan.emit(finding);
                    state.found = true;
                    state.attack_value = Some(attack.clone());
                    break;
                }
            }

            if ctx.policy.generic_error && !state.found {
                if let Some(generic) = ctx.catalog.generic() {
                    if scan.is_cancelled() {
                        return Ok(());
                    }
                    if let Some((pattern, evidence)) =
                        first_new_match(generic.error_patterns(), &state.base_body, &body)
                    {
                        let finding = Finding::new(
                            format!("SQL Injection - {}", generic.name()),
                            scan.uri(),
                            scan.param.clone(),
                            attack.clone(),
                        )
                        .evidence(evidence)
                        .other_info(format!(
                            "the error fragment [{pattern}] appears in the mutated response, \
                             absent from the original response; no specific RDBMS identified"
                        ));
                        ctx.kb.record(
                            &scan.request.url,
                            &format!("sql/{}", generic.name()),
                            "true",
                        );
                        scan.emit(finding);
                        state.found = true;
                        state.attack_value = Some(attack.clone());
                    }
                }
            }
        }
    }
    Ok(())
}
