//! Boolean-based tests: steer the query with always-true and always-false
//! conditions and watch whether the page follows.
//!
//! Two complementary strategies. The restrict-first variant assumes the
//! original query returned data: an appended always-true condition must
//! reproduce the page, and an always-false one must then change it. The
//! no-data variant assumes the opposite: an always-true OR must broaden an
//! empty result set, and re-restricting must collapse it back.

use anyhow::Result;

use crate::http::Transport;
use crate::reporting::Finding;
use crate::sqli::strip::strip_original_and_attack;
use crate::sqli::{
    ScanState, SqliScan, SQL_LOGIC_AND_FALSE, SQL_LOGIC_AND_TRUE, SQL_LOGIC_OR_TRUE,
};

pub(super) async fn restrict_first<T: Transport>(
    scan: &mut SqliScan<'_, T>,
    state: &mut ScanState,
) -> Result<()> {
    let ctx = scan.ctx;
    if !ctx.policy.boolean {
        return Ok(());
    }
    if !scan.refresh_baseline(state).await {
        return Ok(());
    }
    let Some(normal) = state.baseline.clone() else {
        return Ok(());
    };
    let orig_value = scan.orig_value.clone();

    // Which suffix syntax succeeds depends on the column type being
    // injected into, so each is tried in turn.
    for index in 0..SQL_LOGIC_AND_TRUE.len() {
        if state.found || state.boolean_requests >= ctx.policy.boolean_max {
            break;
        }
        if scan.is_cancelled() {
            return Ok(());
        }

        let and_true_value = format!("{orig_value}{}", SQL_LOGIC_AND_TRUE[index]);
        let and_false_value = format!("{orig_value}{}", SQL_LOGIC_AND_FALSE[index]);

        let request = scan.attacked(&and_true_value);
        let response = match scan.send(&request).await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(%error, url = %request.url, "probe failed, trying the next suffix");
                continue;
            }
        };
        state.boolean_requests += 1;

        let true_raw = response.body_text();
        let true_stripped = strip_original_and_attack(&true_raw, &orig_value, &and_true_value);

        // compare the raw body first, then the noise-stripped body
        for stripped in [false, true] {
            if scan.is_cancelled() {
                return Ok(());
            }
            let normal_body = if stripped { &normal.stripped } else { &normal.raw };
            let true_body = if stripped { &true_stripped } else { &true_raw };
            if true_body != normal_body {
                tracing::debug!(
                    stripped,
                    payload = %and_true_value,
                    "AND TRUE output does not match the baseline in this form"
                );
                continue;
            }

            // The page survived an extra always-true constraint. Rule out a
            // fluke: an always-false constraint must now change it.
            if state.boolean_requests >= ctx.policy.boolean_max {
                break;
            }
            let false_request = scan.attacked(&and_false_value);
            let false_response = match scan.send(&false_request).await {
                Ok(response) => response,
                Err(error) => {
                    tracing::debug!(%error, url = %false_request.url, "probe failed, trying the next form");
                    continue;
                }
            };
            state.boolean_requests += 1;
            let false_raw = false_response.body_text();
            let false_stripped =
                strip_original_and_attack(&false_raw, &orig_value, &and_false_value);
            let false_body = if stripped { &false_stripped } else { &false_raw };

            if false_body != normal_body {
                // restricting the result set changed the page: the query is
                // under our control
                let finding = Finding::new(
                    "SQL Injection",
                    scan.uri(),
                    scan.param.clone(),
                    and_true_value.clone(),
                )
                .other_info(info(&and_true_value, &and_false_value, stripped, true));
                scan.emit(finding);
                state.found = true;
                state.attack_value = Some(and_true_value.clone());
                break;
            }

            // The always-false page equals the original: the original query
            // may return no rows, so restriction changes nothing. Try
            // broadening with an always-true OR instead.
            let or_true_value = format!("{orig_value}{}", SQL_LOGIC_OR_TRUE[index]);
            if state.boolean_requests >= ctx.policy.boolean_max {
                break;
            }
            if scan.is_cancelled() {
                return Ok(());
            }
            let or_request = scan.attacked(&or_true_value);
            let or_response = match scan.send(&or_request).await {
                Ok(response) => response,
                Err(error) => {
                    tracing::debug!(%error, url = %or_request.url, "probe failed, trying the next form");
                    continue;
                }
            };
            state.boolean_requests += 1;
            let or_raw = or_response.body_text();
            let or_stripped = strip_original_and_attack(&or_raw, &orig_value, &or_true_value);
            let or_body = if stripped { &or_stripped } else { &or_raw };

            if or_body != normal_body {
                let finding = Finding::new(
                    "SQL Injection",
                    scan.uri(),
                    scan.param.clone(),
                    or_true_value.clone(),
                )
                .other_info(info(&and_true_value, &or_true_value, stripped, false));
                scan.emit(finding);
                state.found = true;
                state.attack_value = Some(or_true_value.clone());
                break;
            }
        }
    }
    Ok(())
}

/// Strategy for the case where the original query returns no data, so the
/// restrict-first comparison never finds a baseline match.
pub(super) async fn no_data<T: Transport>(
    scan: &mut SqliScan<'_, T>,
    state: &mut ScanState,
) -> Result<()> {
    let ctx = scan.ctx;
    if !ctx.policy.boolean {
        return Ok(());
    }
    if state.baseline.is_none() && !scan.refresh_baseline(state).await {
        return Ok(());
    }
    let Some(normal) = state.baseline.clone() else {
        return Ok(());
    };
    let orig_value = scan.orig_value.clone();

    for index in 0..SQL_LOGIC_OR_TRUE.len() {
        if state.found || state.boolean_requests >= ctx.policy.boolean_max {
            break;
        }
        if scan.is_cancelled() {
            return Ok(());
        }

        let or_true_value = format!("{orig_value}{}", SQL_LOGIC_OR_TRUE[index]);
        let and_false_value = format!("{orig_value}{}", SQL_LOGIC_AND_FALSE[index]);

        let or_request = scan.attacked(&or_true_value);
        let or_response = match scan.send(&or_request).await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(%error, url = %or_request.url, "probe failed, trying the next suffix");
                continue;
            }
        };
        state.boolean_requests += 1;
        let or_raw = or_response.body_text();

        // noticeably more output suggests the OR broadened an empty result
        // set into something
        if or_raw.len() as f64 <= normal.raw.len() as f64 * 1.2 {
            continue;
        }
        tracing::debug!(
            payload = %or_true_value,
            "OR TRUE output is sufficiently larger than the baseline"
        );

        if state.boolean_requests >= ctx.policy.boolean_max {
            break;
        }
        if scan.is_cancelled() {
            return Ok(());
        }
        let false_request = scan.attacked(&and_false_value);
        let false_response = match scan.send(&false_request).await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(%error, url = %false_request.url, "probe failed, trying the next suffix");
                continue;
            }
        };
        state.boolean_requests += 1;
        let false_raw = false_response.body_text();
        let false_stripped = strip_original_and_attack(&false_raw, &orig_value, &and_false_value);

        // restricting back must reproduce the original page exactly
        let matched_raw = false_raw == normal.raw;
        let matched_stripped = false_stripped == normal.stripped;
        if matched_raw || matched_stripped {
            let finding = Finding::new(
                "SQL Injection",
                scan.uri(),
                scan.param.clone(),
                or_true_value.clone(),
            )
            .other_info(info(&or_true_value, &and_false_value, matched_stripped, false));
            scan.emit(finding);
            state.found = true;
            state.attack_value = Some(or_true_value.clone());
            break;
        }
    }
    Ok(())
}

fn info(first_payload: &str, second_payload: &str, stripped: bool, data_exists: bool) -> String {
    let form = if stripped { "noise-stripped" } else { "raw" };
    let data = if data_exists {
        "the original query appears to return data"
    } else {
        "the original query appears to return no data"
    };
    format!(
        "the page results were successfully controlled using [{first_payload}] \
         and [{second_payload}], comparing the {form} response body; {data}"
    )
}
