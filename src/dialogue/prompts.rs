//! Prompt and canned-reply text for every dialogue stage
//!
//! All user-facing wording lives here so the state machine stays free of
//! string literals.

use crate::error::ResponderError;
use crate::models::{FinancialProfile, Intent, ProjectionResult, Stage};

pub const GREETING: &str = "Hi, I'm your wealth coach! I'll ask a few quick questions about \
     your finances, then show you how your savings could grow over the decades. First up: how \
     old are you?";

pub const RESTART: &str = "No problem, let's start fresh. How old are you?";

pub const OFF_TOPIC_REDIRECT: &str = "That's outside what I can help with — I'm focused on \
     your savings and wealth projection. Want to dig into your milestones, retirement outlook, \
     or ways to save more?";

pub const ADVICE_DISCLAIMER: &str = "Keep in mind this is an illustrative projection, not \
     financial advice — for buy or sell decisions, please talk to a licensed advisor.";

/// Question asked when entering a data-collection stage.
pub fn prompt(stage: Stage) -> &'static str {
    match stage {
        Stage::Greeting => GREETING,
        Stage::Age => "How old are you?",
        Stage::Income => "What's your annual income, before tax?",
        Stage::CurrentSavings => "How much do you currently have saved up?",
        Stage::MonthlySavings => "How much do you put into savings each month?",
        Stage::MonthlyInvestment => "And how much do you invest each month?",
        Stage::IncreaseGoal => {
            "By what percentage would you like to increase your monthly contributions? (0 is fine)"
        }
        Stage::BonusSavings => {
            "Last one: how much extra per month does our spending-control bonus free up for you? \
             (up to 10,000)"
        }
        Stage::Projection | Stage::FreeChat => {
            "Your projection is ready — ask me anything about it."
        }
    }
}

/// Correction request when a turn fails validation; the stage does not
/// advance.
pub fn reprompt(stage: Stage) -> &'static str {
    match stage {
        Stage::Age => "I need an age between 18 and 100 — could you give me a whole number?",
        Stage::Income => "That doesn't look like an amount. What's your annual income? (0 or more)",
        Stage::CurrentSavings => {
            "Hmm, I couldn't read that. How much do you have saved right now? (0 or more)"
        }
        Stage::MonthlySavings => {
            "Could you give me a number? How much goes into savings each month? (0 or more)"
        }
        Stage::MonthlyInvestment => {
            "Could you give me a number? How much do you invest monthly? (0 or more)"
        }
        Stage::IncreaseGoal => {
            "I need a percentage between 0 and 500 — how much would you like to increase \
             contributions by?"
        }
        Stage::BonusSavings => {
            "I need an amount between 0 and 10,000 — how much does the bonus free up monthly?"
        }
        Stage::Greeting | Stage::Projection | Stage::FreeChat => prompt(stage),
    }
}

/// Local canned answer per intent, used when the external responder is
/// unavailable so the conversation never dead-ends.
pub fn fallback_reply(intent: Intent) -> &'static str {
    match intent {
        Intent::Restart => RESTART,
        Intent::ProductInfo => {
            "The bonus in your projection is the monthly amount our spending controls free up; \
             it keeps compounding even after regular contributions stop at 70."
        }
        Intent::Education => {
            "In short: your money grows by compounding — each month's growth earns its own \
             growth. That's why starting early matters so much in your projection."
        }
        Intent::Retirement => {
            "Your projection assumes contributions stop at age 70 and growth continues at a \
             gentler rate to age 90. The milestone table shows where that lands you."
        }
        Intent::SavingsTips => {
            "Small recurring amounts beat occasional big ones: even a modest monthly increase \
             shifts every later milestone. Try a higher increase percentage and compare."
        }
        Intent::Investment => {
            "The projection treats savings and investments together as one monthly \
             contribution compounding at a fixed rate. It illustrates growth, not any \
             specific product."
        }
        Intent::Closing => "Glad I could help — come back anytime to revisit your projection!",
        Intent::Help => {
            "You can ask about your milestones, retirement outlook, the bonus effect, or say \
             \"start over\" to rebuild your profile."
        }
        Intent::General => {
            "Happy to help with anything about your savings plan or projection — what would \
             you like to know?"
        }
    }
}

/// Distinct, non-technical notice per responder failure category. Retry
/// details stay out of the message body.
pub fn responder_failure_notice(error: &ResponderError) -> &'static str {
    match error {
        ResponderError::Timeout => "That took longer than expected, so here's a quick answer:",
        ResponderError::RateLimited => {
            "I'm getting a lot of questions right now, so here's a quick answer:"
        }
        ResponderError::InvalidCredential => {
            "My assistant service isn't available at the moment, so here's a quick answer:"
        }
        ResponderError::Failed(_) => "I couldn't reach my assistant service, so here's a quick answer:",
    }
}

/// Reply shown when the projection completes and free chat opens.
pub fn projection_reply(profile: &FinancialProfile, projection: &ProjectionResult) -> String {
    let mut out = format!(
        "Here's your projection, {} years out to age {}:\n",
        projection.horizon_years,
        profile.age as u32 + projection.horizon_years
    );

    for (year, milestone) in &projection.milestones {
        out.push_str(&format!(
            "  year {:>2}: {:>12.0} on your own, {:>12.0} with the bonus (+{:.0})\n",
            year, milestone.baseline, milestone.with_bonus, milestone.bonus_contribution
        ));
    }

    if let Some(final_milestone) = projection.final_milestone() {
        out.push_str(&format!(
            "The monthly bonus alone accounts for {:.0} by the end. Ask me anything about it!",
            final_milestone.bonus_contribution
        ));
    }

    out
}
