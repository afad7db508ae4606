//! Cost accounting (§4.6 "Cost accounting"): estimates USD spend for a run
//! from per-provider token usage. Routing on cost remains a documented
//! Non-goal (spec.md §1); only estimation is in scope.

use std::collections::HashMap;

use council_providers::Usage;

/// Cost in USD per 1000 tokens, split by input/output since most providers
/// price them differently.
#[derive(Debug, Clone, Copy)]
pub struct CostWeights {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

/// Built-in fallback table, matched by provider-name prefix. Not exhaustive
/// of every model a provider might serve; a role that cares about exact
/// pricing supplies `RunConfig::cost_overrides` keyed by provider name.
pub const DEFAULT_COST_PER_1K: &[(&str, CostWeights)] = &[
    (
        "anthropic",
        CostWeights {
            input_per_1k: 0.003,
            output_per_1k: 0.015,
        },
    ),
    (
        "claude-cli",
        CostWeights {
            input_per_1k: 0.003,
            output_per_1k: 0.015,
        },
    ),
    (
        "openai",
        CostWeights {
            input_per_1k: 0.0025,
            output_per_1k: 0.01,
        },
    ),
    (
        "openrouter",
        CostWeights {
            input_per_1k: 0.0025,
            output_per_1k: 0.01,
        },
    ),
    (
        "gemini",
        CostWeights {
            input_per_1k: 0.00125,
            output_per_1k: 0.005,
        },
    ),
    (
        "gemini-cli",
        CostWeights {
            input_per_1k: 0.00125,
            output_per_1k: 0.005,
        },
    ),
];

const FALLBACK_WEIGHTS: CostWeights = CostWeights {
    input_per_1k: 0.002,
    output_per_1k: 0.008,
};

fn weights_for(provider: &str, overrides: &HashMap<String, CostWeights>) -> CostWeights {
    if let Some(w) = overrides.get(provider) {
        return *w;
    }
    DEFAULT_COST_PER_1K
        .iter()
        .find(|(prefix, _)| provider == *prefix || provider.starts_with(prefix))
        .map(|(_, w)| *w)
        .unwrap_or(FALLBACK_WEIGHTS)
}

/// Sum estimated USD cost across every provider call recorded in `usage`.
#[must_use]
pub fn estimate_total_usd(
    usage: &HashMap<String, Usage>,
    overrides: &HashMap<String, CostWeights>,
) -> f64 {
    usage
        .iter()
        .map(|(provider, u)| {
            let weights = weights_for(provider, overrides);
            (u.input_tokens as f64 / 1000.0) * weights.input_per_1k
                + (u.output_tokens as f64 / 1000.0) * weights.output_per_1k
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_prefix_matches_dated_provider_name() {
        let overrides = HashMap::new();
        let mut usage = HashMap::new();
        usage.insert(
            "anthropic".to_string(),
            Usage {
                input_tokens: 1000,
                output_tokens: 1000,
                total_tokens: 2000,
            },
        );
        let cost = estimate_total_usd(&usage, &overrides);
        assert!((cost - 0.018).abs() < 1e-9);
    }

    #[test]
    fn override_takes_precedence_over_default_table() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "anthropic".to_string(),
            CostWeights {
                input_per_1k: 1.0,
                output_per_1k: 1.0,
            },
        );
        let mut usage = HashMap::new();
        usage.insert(
            "anthropic".to_string(),
            Usage {
                input_tokens: 1000,
                output_tokens: 0,
                total_tokens: 1000,
            },
        );
        assert!((estimate_total_usd(&usage, &overrides) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_provider_falls_back_to_default_weights() {
        let overrides = HashMap::new();
        let mut usage = HashMap::new();
        usage.insert(
            "some-new-vendor".to_string(),
            Usage {
                input_tokens: 1000,
                output_tokens: 1000,
                total_tokens: 2000,
            },
        );
        let cost = estimate_total_usd(&usage, &overrides);
        assert!((cost - 0.01).abs() < 1e-9);
    }
}
