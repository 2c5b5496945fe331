//! Expression-based test: replace a numeric parameter with an expression
//! that evaluates to the same value.
//!
//! If "2-1" produces the same page as "1", and "3-1" produces a different
//! one, something server-side is doing the arithmetic. Only integer
//! parameters are eligible; everything else silently skips the family.

use anyhow::Result;

use crate::http::Transport;
use crate::reporting::Finding;
use crate::sqli::compare::ComparableResponse;
use crate::sqli::{ScanState, SqliScan};

/// `(n+2)-2` and its deliberately unequal confirmation `(n+3)-2`.
fn additive_payloads(value: i64) -> Option<(String, String)> {
    Some((
        format!("{}-2", value.checked_add(2)?),
        format!("{}-2", value.checked_add(3)?),
    ))
}

/// `(n*2)/2` and its deliberately unequal confirmation `(n*4)/2`.
fn multiplicative_payloads(value: i64) -> Option<(String, String)> {
    Some((
        format!("{}/2", value.checked_mul(2)?),
        format!("{}/2", value.checked_mul(4)?),
    ))
}

pub(super) async fn run<T: Transport>(
    scan: &mut SqliScan<'_, T>,
    state: &mut ScanState,
) -> Result<()> {
    let ctx = scan.ctx;
    if !ctx.policy.expression {
        return Ok(());
    }

    let value: i64 = match scan.orig_value.parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::debug!(
                value = %scan.orig_value,
                "parameter is not an integer, skipping the expression family"
            );
            return Ok(());
        }
    };

    if !scan.refresh_baseline(state).await {
        return Ok(());
    }
    let Some(baseline) = state.baseline.clone() else {
        return Ok(());
    };
    let orig_value = scan.orig_value.clone();
    let normal = ComparableResponse::from_parts(baseline.status, baseline.raw, &orig_value);

    match additive_payloads(value) {
        Some((equal, confirm)) => attack(scan, state, &normal, &equal, &confirm).await?,
        None => tracing::debug!(value, "offset overflow, skipping the additive probe"),
    }

    if scan.is_cancelled()
        || state.found
        || state.expression_requests >= ctx.policy.expression_max
    {
        return Ok(());
    }

    match multiplicative_payloads(value) {
        Some((equal, confirm)) => attack(scan, state, &normal, &equal, &confirm).await?,
        None => tracing::debug!(value, "overflow while doubling, skipping the multiplicative probe"),
    }
    Ok(())
}

async fn attack<T: Transport>(
    scan: &mut SqliScan<'_, T>,
    state: &mut ScanState,
    normal: &ComparableResponse,
    equal_value: &str,
    confirm_value: &str,
) -> Result<()> {
    let max = scan.ctx.policy.expression_max;
    if state.expression_requests >= max || scan.is_cancelled() {
        return Ok(());
    }

    let request = scan.attacked(equal_value);
    let response = match scan.send(&request).await {
        Ok(response) => response,
        Err(error) => {
            tracing::debug!(%error, url = %request.url, "probe failed, skipping this variant");
            return Ok(());
        }
    };
    state.expression_requests += 1;
    let probe = ComparableResponse::new(&response, equal_value);

    if state.found || state.expression_requests >= max {
        return Ok(());
    }

    // the equivalent expression must reproduce the page exactly
    if probe.compare_with(normal) < 1.0 {
        return Ok(());
    }
    if scan.is_cancelled() {
        return Ok(());
    }

    let confirm_request = scan.attacked(confirm_value);
    let confirm_response = match scan.send(&confirm_request).await {
        Ok(response) => response,
        Err(error) => {
            tracing::debug!(%error, url = %confirm_request.url, "confirm probe failed, skipping this variant");
            return Ok(());
        }
    };
    state.expression_requests += 1;
    let confirm = ComparableResponse::new(&confirm_response, confirm_value);

    // A deliberately inequivalent value must change the page, though not
    // unrecognisably, and must not simply be echoed back into it.
    let similarity = confirm.compare_with(normal);
    let reflection = ComparableResponse::input_reflection(&confirm, normal);
    if similarity > 0.0 && similarity < 1.0 && reflection >= 1.0 {
        let finding = Finding::new("SQL Injection", scan.uri(), scan.param.clone(), equal_value)
            .other_info(format!(
                "the original page is reproduced by the equivalent expression \
                 [{equal_value}] and changes with the inequivalent [{confirm_value}], \
                 suggesting the parameter is evaluated as SQL"
            ));
        scan.emit(finding);
        state.found = true;
        state.attack_value = Some(equal_value.to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Evaluates a payload of the form "<int>-2" or "<int>/2".
    fn eval(payload: &str) -> i64 {
        if let Some(lhs) = payload.strip_suffix("-2") {
            lhs.parse::<i64>().unwrap() - 2
        } else if let Some(lhs) = payload.strip_suffix("/2") {
            lhs.parse::<i64>().unwrap() / 2
        } else {
            panic!("unexpected payload shape: {payload}")
        }
    }

    #[test]
    fn additive_payloads_are_equal_and_off_by_one() {
        for n in [-1_000_000, -17, -1, 0, 1, 5, 42, 1_000_000] {
            let (equal, confirm) = additive_payloads(n).unwrap();
            assert_eq!(eval(&equal), n, "equal payload for {n}: {equal}");
            assert_eq!(eval(&confirm), n + 1, "confirm payload for {n}: {confirm}");
        }
    }

    #[test]
    fn multiplicative_payloads_are_equal_and_double() {
        for n in [-40, -2, 0, 3, 1234] {
            let (equal, confirm) = multiplicative_payloads(n).unwrap();
            assert_eq!(eval(&equal), n);
            assert_eq!(eval(&confirm), 2 * n);
        }
    }

    #[test]
    fn overflow_is_caught_not_propagated() {
        assert!(additive_payloads(i64::MAX - 1).is_none());
        assert!(multiplicative_payloads(i64::MAX / 2 + 1).is_none());
        // boundary values that still fit
        assert!(additive_payloads(i64::MAX - 3).is_some());
        assert!(multiplicative_payloads(i64::MIN / 4).is_some());
    }
}
