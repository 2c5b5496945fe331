//! Attack budget policy: which test families run, and how many requests each
//! may issue per parameter

use clap::ValueEnum;

use crate::core::tech::{Tech, TechSet};

/// Coarse intensity of the scan. Request ceilings scale monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AttackStrength {
    Low,
    Medium,
    High,
    Insane,
}

/// Confidence threshold. Stricter settings disable the error-based family,
/// which is the one most prone to false positives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlertThreshold {
    Low,
    Medium,
    High,
}

/// Per-family enablement and request ceilings, fixed for the whole scan.
#[derive(Debug, Clone)]
pub struct BudgetPolicy {
    pub specific_error: bool,
    pub generic_error: bool,
    pub expression: bool,
    pub boolean: bool,
    pub union: bool,
    pub order_by: bool,
    pub error_max: usize,
    pub expression_max: usize,
    pub boolean_max: usize,
    pub union_max: usize,
    pub order_by_max: usize,
}

impl BudgetPolicy {
    pub fn derive(strength: AttackStrength, threshold: AlertThreshold, techs: &TechSet) -> Self {
        let mut policy = match strength {
            AttackStrength::Low => Self {
                specific_error: true,
                generic_error: true,
                expression: true,
                boolean: false,
                union: false,
                order_by: false,
                error_max: 4,
                expression_max: 4,
                boolean_max: 0,
                union_max: 0,
                order_by_max: 0,
            },
            AttackStrength::Medium => Self {
                specific_error: true,
                generic_error: true,
                expression: true,
                boolean: true,
                union: true,
                order_by: false,
                error_max: 8,
                expression_max: 8,
                boolean_max: 6,
                union_max: 5,
                order_by_max: 0,
            },
            AttackStrength::High => Self {
                specific_error: true,
                generic_error: true,
                expression: true,
                boolean: true,
                union: true,
                order_by: true,
                error_max: 16,
                expression_max: 16,
                boolean_max: 20,
                union_max: 10,
                order_by_max: 5,
            },
            AttackStrength::Insane => Self {
                specific_error: true,
                generic_error: true,
                expression: true,
                boolean: true,
                union: true,
                order_by: true,
                error_max: 100,
                expression_max: 100,
                boolean_max: 100,
                union_max: 100,
                order_by_max: 100,
            },
        };

        match threshold {
            AlertThreshold::Low => {}
            AlertThreshold::Medium => {
                policy.generic_error = false;
            }
            AlertThreshold::High => {
                tracing::debug!(
                    "disabling error based checks, they are notably prone to false positives"
                );
                policy.specific_error = false;
                policy.generic_error = false;
                policy.error_max = 0;
            }
        }

        // Generic error matching only makes sense when no specific dialect is
        // being targeted.
        policy.generic_error &= techs.includes(Tech::Db);

        tracing::debug!(
            specific_error = policy.specific_error,
            generic_error = policy.generic_error,
            error_max = policy.error_max,
            expression_max = policy.expression_max,
            boolean_max = policy.boolean_max,
            union_max = policy.union_max,
            order_by_max = policy.order_by_max,
            "derived attack budget policy"
        );
        policy
    }
}
