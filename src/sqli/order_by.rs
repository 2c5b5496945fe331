//! ORDER BY test: parameters used in an ORDER BY clause slip past the
//! earlier checks, because neither error fragments nor boolean logic apply.
//!
//! Appending ` ASC -- ` must reproduce the page, and flipping to ` DESC -- `
//! must then change it. Requiring the flip to diverge guards against pages
//! that render identically for any arbitrary suffix.

use anyhow::Result;

use crate::http::Transport;
use crate::reporting::Finding;
use crate::sqli::strip::strip_original_and_attack;
use crate::sqli::{ScanState, SqliScan, SQL_ONE_LINE_COMMENT};

pub(super) async fn run<T: Transport>(
    scan: &mut SqliScan<'_, T>,
    state: &mut ScanState,
) -> Result<()> {
    let ctx = scan.ctx;
    if !ctx.policy.order_by {
        return Ok(());
    }
    if !scan.refresh_baseline(state).await {
        return Ok(());
    }
    let Some(normal) = state.baseline.clone() else {
        return Ok(());
    };
    let orig_value = scan.orig_value.clone();

    if state.found || state.order_by_requests >= ctx.policy.order_by_max {
        return Ok(());
    }
    if scan.is_cancelled() {
        return Ok(());
    }

    let ascending = format!("{orig_value} ASC {SQL_ONE_LINE_COMMENT}");
    let request = scan.attacked(&ascending);
    let response = match scan.send(&request).await {
        Ok(response) => response,
        Err(error) => {
            tracing::debug!(%error, url = %request.url, "probe failed, skipping the family");
            return Ok(());
        }
    };
    state.order_by_requests += 1;

    let asc_raw = response.body_text();
    let asc_stripped = strip_original_and_attack(&asc_raw, &orig_value, &ascending);

    for stripped in [false, true] {
        if scan.is_cancelled() {
            return Ok(());
        }
        let normal_body = if stripped { &normal.stripped } else { &normal.raw };
        let asc_body = if stripped { &asc_stripped } else { &asc_raw };
        if asc_body != normal_body {
            continue;
        }

        // The ordering suffix reproduced the page. Flip the direction and
        // require a change, so that arbitrary suffixes yielding the same
        // page are not mistaken for control.
        if state.order_by_requests >= ctx.policy.order_by_max {
            break;
        }
        let descending = format!("{orig_value} DESC {SQL_ONE_LINE_COMMENT}");
        let confirm_request = scan.attacked(&descending);
        let confirm_response = match scan.send(&confirm_request).await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(%error, url = %confirm_request.url, "confirm probe failed, trying the next form");
                continue;
            }
        };
        state.order_by_requests += 1;

        let desc_raw = confirm_response.body_text();
        let desc_stripped = strip_original_and_attack(&desc_raw, &orig_value, &descending);
        let desc_body = if stripped { &desc_stripped } else { &desc_raw };

        if desc_body != normal_body {
            let form = if stripped { "noise-stripped" } else { "raw" };
            let finding = Finding::new(
                "SQL Injection",
                scan.uri(),
                scan.param.clone(),
                ascending.clone(),
            )
            .evidence(ascending.clone())
            .other_info(format!(
                "the page is reproduced with [{ascending}] and changes when the \
                 sort direction is flipped, comparing the {form} response body"
            ));
            scan.emit(finding);
            state.found = true;
            state.attack_value = Some(ascending.clone());
            break;
        }
    }
    Ok(())
}
