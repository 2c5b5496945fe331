//! UNION-based test: append a deliberately mis-shaped UNION clause and look
//! for the UNION-specific error fragments a dialect produces for it.

use anyhow::Result;

use crate::http::Transport;
use crate::reporting::Finding;
use crate::sqli::strip::strip_original_and_attack;
use crate::sqli::{first_new_match, ScanState, SqliScan, SQL_UNION_APPENDAGES};

pub(super) async fn run<T: Transport>(
    scan: &mut SqliScan<'_, T>,
    state: &mut ScanState,
) -> Result<()> {
    let ctx = scan.ctx;
    if !ctx.policy.union {
        return Ok(());
    }
    if state.baseline.is_none() && !scan.refresh_baseline(state).await {
        return Ok(());
    }
    let Some(normal) = state.baseline.clone() else {
        return Ok(());
    };
    let orig_value = scan.orig_value.clone();

    for appendage in SQL_UNION_APPENDAGES {
        if state.found || state.union_requests >= ctx.policy.union_max {
            break;
        }
        if scan.is_cancelled() {
            return Ok(());
        }

        let attack = format!("{orig_value}{appendage}");
        let request = scan.attacked(&attack);
        let response = match scan.send(&request).await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(%error, url = %request.url, "probe failed, trying the next appendage");
                continue;
            }
        };
        state.union_requests += 1;

        let raw = response.body_text();
        let mutated_stripped = strip_original_and_attack(&raw, &orig_value, &attack);

        for dialect in ctx.catalog.dialects() {
            if scan.is_cancelled() {
                return Ok(());
            }
            if !ctx.techs.includes(dialect.tech()) {
                continue;
            }
            if let Some((pattern, evidence)) =
                first_new_match(dialect.union_patterns(), &normal.stripped, &mutated_stripped)
            {
                let finding = Finding::new(
                    format!("SQL Injection - {}", dialect.name()),
                    scan.uri(),
                    scan.param.clone(),
                    attack.clone(),
                )
                .evidence(evidence)
                .other_info(format!(
                    "RDBMS [{}] likely, given the UNION-specific error fragment \
                     [{pattern}] in the mutated response, absent from the original",
                    dialect.name()
                ));
                ctx.kb
                    .record(&scan.request.url, &format!("sql/{}", dialect.name()), "true");
                scan.emit(finding);
                state.found = true;
                state.attack_value = Some(attack.clone());
                break;
            }
        }
    }
    Ok(())
}
