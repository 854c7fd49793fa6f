//! Core data models for the wealth coaching agent

use crate::memory::ConversationHistory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

//
// ================= Profile =================
//

/// Bounds enforced per collection stage. Out-of-range turns re-prompt
/// instead of erroring (user-correctable input).
pub const AGE_MIN: u8 = 18;
pub const AGE_MAX: u8 = 100;
pub const INCREASE_MAX: f64 = 500.0;
pub const BONUS_MAX: f64 = 10_000.0;

/// Profile under construction, one field per dialogue stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialProfile {
    pub age: Option<u8>,
    pub annual_income: Option<f64>,
    pub current_savings: Option<f64>,
    pub monthly_savings: Option<f64>,
    pub monthly_investment: Option<f64>,
    pub increase_percentage: Option<f64>,
    pub bonus_savings: Option<f64>,
}

impl PartialProfile {
    /// Freeze into an immutable profile. A missing field here means the
    /// stage ordering contract was broken upstream, so fail loudly.
    pub fn freeze(&self) -> crate::Result<FinancialProfile> {
        use crate::error::AgentError::IncompleteProfile;

        Ok(FinancialProfile {
            age: self.age.ok_or(IncompleteProfile("age"))?,
            annual_income: self.annual_income.ok_or(IncompleteProfile("annual_income"))?,
            current_savings: self
                .current_savings
                .ok_or(IncompleteProfile("current_savings"))?,
            monthly_savings: self
                .monthly_savings
                .ok_or(IncompleteProfile("monthly_savings"))?,
            monthly_investment: self
                .monthly_investment
                .ok_or(IncompleteProfile("monthly_investment"))?,
            increase_percentage: self
                .increase_percentage
                .ok_or(IncompleteProfile("increase_percentage"))?,
            bonus_savings: self.bonus_savings.ok_or(IncompleteProfile("bonus_savings"))?,
        })
    }
}

/// Completed financial profile. Immutable once frozen; the projection
/// engine only ever sees this form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialProfile {
    pub age: u8,
    pub annual_income: f64,
    pub current_savings: f64,
    pub monthly_savings: f64,
    pub monthly_investment: f64,
    pub increase_percentage: f64,
    pub bonus_savings: f64,
}

//
// ================= Projection =================
//

/// Summary amounts at one checkpoint year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub baseline: f64,
    pub with_bonus: f64,
    pub bonus_contribution: f64,
}

/// One simulated year of the projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    pub year: i32,
    pub age: u32,
    pub baseline: f64,
    pub with_bonus: f64,
    pub total_contributions: f64,
    pub total_earnings: f64,
    pub bonus_contribution: f64,
}

/// Output of the projection engine. Created once per frozen profile and
/// never mutated; a restart recomputes a fresh value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionResult {
    /// Checkpoint year-offset → amounts, ordered by offset.
    pub milestones: BTreeMap<u32, Milestone>,
    /// One record per integer year from 1 to the horizon.
    pub year_by_year: Vec<YearRecord>,
    /// Final simulated year offset.
    pub horizon_years: u32,
}

impl ProjectionResult {
    /// Compact milestone summary handed to the external responder as
    /// conversation context.
    pub fn summary_lines(&self) -> Vec<String> {
        self.milestones
            .iter()
            .map(|(year, m)| {
                format!(
                    "year {}: baseline {:.0}, with bonus {:.0} (+{:.0})",
                    year, m.baseline, m.with_bonus, m.bonus_contribution
                )
            })
            .collect()
    }

    /// Milestone at the horizon (always present).
    pub fn final_milestone(&self) -> Option<&Milestone> {
        self.milestones.get(&self.horizon_years)
    }
}

//
// ================= Guardrail =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GuardCategory {
    Allowed,
    OffTopic,
    Inappropriate,
    JailbreakAttempt,
    PiiRequest,
    FinancialAdvice,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Allow/block decision for one free-text turn. Computed fresh per
/// message, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailVerdict {
    pub allowed: bool,
    pub category: GuardCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// Canned redirect text; empty when the caller produces its own reply.
    pub response: String,
}

impl GuardrailVerdict {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            category: GuardCategory::Allowed,
            severity: None,
            response: String::new(),
        }
    }

    pub fn blocked(category: GuardCategory, severity: Severity, response: &str) -> Self {
        Self {
            allowed: false,
            category,
            severity: Some(severity),
            response: response.to_string(),
        }
    }
}

/// Coarse purpose of a free-text turn, used to pick a specific local
/// reply. Variant order mirrors the rule evaluation order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    Restart,
    ProductInfo,
    Education,
    Retirement,
    SavingsTips,
    Investment,
    Closing,
    Help,
    General,
}

//
// ================= Conversation =================
//

/// Named step of the slot-filling dialogue, in fixed forward order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Greeting,
    Age,
    Income,
    CurrentSavings,
    MonthlySavings,
    MonthlyInvestment,
    IncreaseGoal,
    BonusSavings,
    Projection,
    FreeChat,
}

impl Stage {
    /// The stage that consumes the next turn after this one's field is
    /// filled.
    pub fn next(self) -> Stage {
        match self {
            Stage::Greeting => Stage::Age,
            Stage::Age => Stage::Income,
            Stage::Income => Stage::CurrentSavings,
            Stage::CurrentSavings => Stage::MonthlySavings,
            Stage::MonthlySavings => Stage::MonthlyInvestment,
            Stage::MonthlyInvestment => Stage::IncreaseGoal,
            Stage::IncreaseGoal => Stage::BonusSavings,
            Stage::BonusSavings => Stage::Projection,
            Stage::Projection => Stage::FreeChat,
            Stage::FreeChat => Stage::FreeChat,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Greeting => "greeting",
            Stage::Age => "age",
            Stage::Income => "income",
            Stage::CurrentSavings => "currentSavings",
            Stage::MonthlySavings => "monthlySavings",
            Stage::MonthlyInvestment => "monthlyInvestment",
            Stage::IncreaseGoal => "increaseGoal",
            Stage::BonusSavings => "bonusSavings",
            Stage::Projection => "projection",
            Stage::FreeChat => "freeChat",
        };
        write!(f, "{}", s)
    }
}

/// Conversation state owned by the caller and threaded through every
/// dialogue call. No hidden storage: dropping the value ends the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub stage: Stage,
    pub profile: PartialProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<ProjectionResult>,
    pub history: ConversationHistory,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            stage: Stage::Greeting,
            profile: PartialProfile::default(),
            projection: None,
            history: ConversationHistory::new(),
        }
    }

    /// Fresh profile at the `age` stage; a restart skips the greeting.
    pub fn restarted(&self) -> Self {
        Self {
            stage: Stage::Age,
            profile: PartialProfile::default(),
            projection: None,
            history: ConversationHistory::new(),
        }
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a reply came from, mirrored into API responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ReplySource {
    Prompt,
    Reprompt,
    Guardrail,
    Redirect,
    Projection,
    Responder,
    Fallback,
}

/// One dialogue turn's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    pub source: ReplySource,
}

impl ChatReply {
    pub fn new(text: impl Into<String>, source: ReplySource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }
}
