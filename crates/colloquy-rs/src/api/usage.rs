//! Token-usage accounting for a session.
//!
//! The [`UsageTracker`] is owned by the session driver and passed by
//! mutable borrow into the gateway-call wrapper; there is no global
//! counter. Counters are strictly additive, so the record is monotonically
//! non-decreasing across a run, and a tracker that never recorded anything
//! summarizes to all zeros.

use crate::UsageInfo;

/// Cost rates in USD per 1K tokens.
#[derive(Debug, Clone, Copy)]
pub struct CostRates {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl Default for CostRates {
    fn default() -> Self {
        Self {
            input_per_1k: 0.001,
            output_per_1k: 0.002,
        }
    }
}

impl CostRates {
    /// Estimated cost for the given cumulative token counts.
    pub fn estimate(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        (prompt_tokens as f64 / 1000.0) * self.input_per_1k
            + (completion_tokens as f64 / 1000.0) * self.output_per_1k
    }
}

/// Cumulative token counters across one session.
#[derive(Debug, Default)]
pub struct UsageTracker {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
    call_count: u32,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the counters reported for one gateway call.
    ///
    /// `total_tokens` accumulates the API-reported total verbatim; it is
    /// never re-derived from the other two counters.
    pub fn record(&mut self, usage: &UsageInfo) {
        self.prompt_tokens += u64::from(usage.prompt_tokens.unwrap_or(0));
        self.completion_tokens += u64::from(usage.completion_tokens.unwrap_or(0));
        self.total_tokens += u64::from(usage.total_tokens.unwrap_or(0));
        self.call_count += 1;
    }

    pub fn call_count(&self) -> u32 {
        self.call_count
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    /// Snapshot the accumulated figures plus a derived cost estimate.
    pub fn summary(&self, rates: &CostRates) -> UsageSummary {
        UsageSummary {
            prompt_tokens: self.prompt_tokens,
            completion_tokens: self.completion_tokens,
            total_tokens: self.total_tokens,
            call_count: self.call_count,
            estimated_cost_usd: rates.estimate(self.prompt_tokens, self.completion_tokens),
        }
    }
}

/// Final usage figures for a session, shown on every terminal path.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageSummary {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub call_count: u32,
    pub estimated_cost_usd: f64,
}

impl std::fmt::Display for UsageSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} call(s), tokens: {} prompt + {} completion = {} total, est. cost: ${:.6}",
            self.call_count,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            self.estimated_cost_usd,
        )
    }
}
