//! Two-phase compound-growth projection engine
//!
//! Pure computation: a frozen profile in, a ProjectionResult out.
//! Deterministic for a given reference clock, no side effects, and the
//! only failure mode is malformed numeric input.

use crate::error::AgentError;
use crate::models::{FinancialProfile, Milestone, ProjectionResult, YearRecord};
use crate::Result;
use chrono::{DateTime, Datelike, Utc};
use std::collections::BTreeMap;

/// Annual growth rate while the saver is still contributing (age ≤ 70).
pub const PRE_TRANSITION_ANNUAL_RATE: f64 = 0.11;
/// Annual growth rate after the phase-transition age.
pub const POST_TRANSITION_ANNUAL_RATE: f64 = 0.06;
/// Age at which the rate and contribution behavior switch.
pub const TRANSITION_AGE: u32 = 70;
/// Fixed life-expectancy constant bounding the simulation.
pub const HORIZON_AGE: u32 = 90;
/// Shortest projection shown regardless of starting age.
pub const MIN_HORIZON_YEARS: u32 = 5;

const MONTHS_PER_YEAR: u32 = 12;

/// Fixed checkpoint offsets; the horizon year is appended when it falls
/// between checkpoints so the age-90 outcome is always reported.
const CHECKPOINT_YEARS: [u32; 15] = [0, 5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55, 60, 65, 70];

/// Amounts are reported in whole currency units; accumulation stays
/// unrounded.
fn round_unit(amount: f64) -> f64 {
    amount.round()
}

fn ensure_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AgentError::InvalidProfile(format!(
            "{} is not a finite number",
            name
        )))
    }
}

fn ensure_non_negative(name: &str, value: f64) -> Result<()> {
    ensure_finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(AgentError::InvalidProfile(format!(
            "{} must be non-negative, got {}",
            name, value
        )))
    }
}

fn validate(profile: &FinancialProfile) -> Result<()> {
    if !(crate::models::AGE_MIN..=crate::models::AGE_MAX).contains(&profile.age) {
        return Err(AgentError::InvalidProfile(format!(
            "age {} outside {}..={}",
            profile.age,
            crate::models::AGE_MIN,
            crate::models::AGE_MAX
        )));
    }
    ensure_non_negative("annual_income", profile.annual_income)?;
    ensure_non_negative("current_savings", profile.current_savings)?;
    ensure_non_negative("monthly_savings", profile.monthly_savings)?;
    ensure_non_negative("monthly_investment", profile.monthly_investment)?;
    ensure_non_negative("increase_percentage", profile.increase_percentage)?;
    if profile.increase_percentage > crate::models::INCREASE_MAX {
        return Err(AgentError::InvalidProfile(format!(
            "increase_percentage {} above {}",
            profile.increase_percentage,
            crate::models::INCREASE_MAX
        )));
    }
    ensure_non_negative("bonus_savings", profile.bonus_savings)?;
    if profile.bonus_savings > crate::models::BONUS_MAX {
        return Err(AgentError::InvalidProfile(format!(
            "bonus_savings {} above {}",
            profile.bonus_savings,
            crate::models::BONUS_MAX
        )));
    }
    Ok(())
}

/// Years to simulate for a given starting age.
pub fn horizon_years(age: u8) -> u32 {
    let remaining = HORIZON_AGE.saturating_sub(age as u32);
    remaining.max(MIN_HORIZON_YEARS)
}

/// Run the projection.
///
/// Two trajectories are tracked in one pass: `baseline` never receives
/// the bonus contribution; `with_bonus` receives it in both phases. The
/// contribution amount and rate both change at the transition age, which
/// is why this is a month-by-month loop rather than a closed-form
/// annuity.
pub fn project(profile: &FinancialProfile, now: DateTime<Utc>) -> Result<ProjectionResult> {
    validate(profile)?;

    let horizon = horizon_years(profile.age);
    let work_contribution = (profile.monthly_savings + profile.monthly_investment)
        * (1.0 + profile.increase_percentage / 100.0);
    let bonus = profile.bonus_savings;

    let mut baseline = profile.current_savings;
    let mut with_bonus = profile.current_savings;
    // Principal plus every monthly inflow of the with-bonus trajectory.
    let mut total_contributions = profile.current_savings;

    let mut year_by_year = Vec::with_capacity(horizon as usize);
    let mut milestones = BTreeMap::new();

    // Year 0 anchors the series at the starting point.
    let anchor = round_unit(profile.current_savings);
    milestones.insert(
        0,
        Milestone {
            baseline: anchor,
            with_bonus: anchor,
            bonus_contribution: 0.0,
        },
    );

    for year in 1..=horizon {
        let age_reached = profile.age as u32 + year;

        let (monthly_rate, baseline_inflow, bonus_inflow) = if age_reached <= TRANSITION_AGE {
            (
                PRE_TRANSITION_ANNUAL_RATE / MONTHS_PER_YEAR as f64,
                work_contribution,
                work_contribution + bonus,
            )
        } else {
            // Work contributions stop; only the bonus keeps flowing into
            // the with-bonus trajectory.
            (POST_TRANSITION_ANNUAL_RATE / MONTHS_PER_YEAR as f64, 0.0, bonus)
        };

        for _ in 0..MONTHS_PER_YEAR {
            baseline = baseline * (1.0 + monthly_rate) + baseline_inflow;
            with_bonus = with_bonus * (1.0 + monthly_rate) + bonus_inflow;
            total_contributions += bonus_inflow;
        }

        let baseline_out = round_unit(baseline);
        let with_bonus_out = round_unit(with_bonus);
        let contributions_out = round_unit(total_contributions);

        year_by_year.push(YearRecord {
            year: now.year() + year as i32,
            age: age_reached,
            baseline: baseline_out,
            with_bonus: with_bonus_out,
            total_contributions: contributions_out,
            total_earnings: round_unit(with_bonus - total_contributions),
            bonus_contribution: with_bonus_out - baseline_out,
        });

        let is_checkpoint = CHECKPOINT_YEARS.contains(&year);
        if is_checkpoint || year == horizon {
            milestones.insert(
                year,
                Milestone {
                    baseline: baseline_out,
                    with_bonus: with_bonus_out,
                    bonus_contribution: with_bonus_out - baseline_out,
                },
            );
        }
    }

    Ok(ProjectionResult {
        milestones,
        year_by_year,
        horizon_years: horizon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(age: u8, bonus: f64) -> FinancialProfile {
        FinancialProfile {
            age,
            annual_income: 50_000.0,
            current_savings: 100_000.0,
            monthly_savings: 600.0,
            monthly_investment: 400.0,
            increase_percentage: 0.0,
            bonus_savings: bonus,
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        "2026-01-15T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_year_zero_anchor() {
        let result = project(&profile(68, 200.0), fixed_now()).unwrap();
        let anchor = result.milestones.get(&0).unwrap();
        assert_eq!(anchor.baseline, 100_000.0);
        assert_eq!(anchor.with_bonus, 100_000.0);
        assert_eq!(anchor.bonus_contribution, 0.0);
    }

    #[test]
    fn test_scenario_near_transition() {
        // Age 68: horizon max(5, 90-68) = 22, transition crossed at year 2.
        let result = project(&profile(68, 200.0), fixed_now()).unwrap();
        assert_eq!(result.horizon_years, 22);
        assert_eq!(result.year_by_year.len(), 22);

        // Year 2 (age 70) still uses the pre-transition phase.
        let year2 = &result.year_by_year[1];
        assert_eq!(year2.age, 70);

        // From year 3 onward the baseline receives no inflow and grows at
        // 6%: each year is the prior balance compounded monthly at 0.5%.
        for pair in result.year_by_year.windows(2) {
            if pair[1].age > TRANSITION_AGE {
                let expected = pair[0].baseline * (1.0_f64 + 0.06 / 12.0).powi(12);
                assert!(
                    (pair[1].baseline - expected).abs() <= 1.5,
                    "age {}: {} vs expected {}",
                    pair[1].age,
                    pair[1].baseline,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_with_bonus_dominates_baseline() {
        let result = project(&profile(30, 150.0), fixed_now()).unwrap();
        for record in &result.year_by_year {
            assert!(record.with_bonus >= record.baseline);
            assert!(record.bonus_contribution > 0.0);
        }
    }

    #[test]
    fn test_zero_bonus_trajectories_coincide() {
        let result = project(&profile(30, 0.0), fixed_now()).unwrap();
        for record in &result.year_by_year {
            assert_eq!(record.with_bonus, record.baseline);
            assert_eq!(record.bonus_contribution, 0.0);
        }
    }

    #[test]
    fn test_bonus_contribution_is_exact_difference() {
        let result = project(&profile(45, 350.0), fixed_now()).unwrap();
        for record in &result.year_by_year {
            assert_eq!(record.bonus_contribution, record.with_bonus - record.baseline);
        }
        for milestone in result.milestones.values() {
            assert_eq!(
                milestone.bonus_contribution,
                milestone.with_bonus - milestone.baseline
            );
        }
    }

    #[test]
    fn test_trajectories_non_decreasing() {
        let result = project(&profile(25, 100.0), fixed_now()).unwrap();
        let mut prev_baseline = 100_000.0;
        let mut prev_bonus = 100_000.0;
        for record in &result.year_by_year {
            assert!(record.baseline >= prev_baseline);
            assert!(record.with_bonus >= prev_bonus);
            prev_baseline = record.baseline;
            prev_bonus = record.with_bonus;
        }
    }

    #[test]
    fn test_minimum_horizon() {
        // 90 - 88 = 2, clamped up to 5.
        let result = project(&profile(88, 50.0), fixed_now()).unwrap();
        assert_eq!(result.horizon_years, 5);
        assert_eq!(result.year_by_year.len(), 5);
    }

    #[test]
    fn test_horizon_milestone_always_present() {
        // Horizon 22 is not a checkpoint; it must be reported anyway.
        let result = project(&profile(68, 200.0), fixed_now()).unwrap();
        assert!(result.milestones.contains_key(&22));
        // Checkpoints past the horizon are absent.
        assert!(!result.milestones.contains_key(&25));

        let offsets: Vec<u32> = result.milestones.keys().copied().collect();
        assert_eq!(offsets, vec![0, 5, 10, 15, 20, 22]);
    }

    #[test]
    fn test_increase_percentage_scales_contribution() {
        let mut boosted = profile(40, 0.0);
        boosted.increase_percentage = 100.0;
        let flat = project(&profile(40, 0.0), fixed_now()).unwrap();
        let doubled = project(&boosted, fixed_now()).unwrap();

        // Doubling the contribution strictly raises every year's balance.
        for (a, b) in flat.year_by_year.iter().zip(doubled.year_by_year.iter()) {
            assert!(b.baseline > a.baseline);
        }
    }

    #[test]
    fn test_contributions_and_earnings_accounting() {
        let result = project(&profile(68, 200.0), fixed_now()).unwrap();

        // Year 1 is pre-transition: 12 months of (1000 + 200) on top of
        // the 100k principal.
        let year1 = &result.year_by_year[0];
        assert_eq!(year1.total_contributions, 100_000.0 + 12.0 * 1_200.0);
        assert!((year1.total_earnings - (year1.with_bonus - year1.total_contributions)).abs() <= 1.0);
    }

    #[test]
    fn test_calendar_year_stamp() {
        let result = project(&profile(30, 100.0), fixed_now()).unwrap();
        assert_eq!(result.year_by_year[0].year, 2027);
        assert_eq!(result.year_by_year.last().unwrap().year, 2026 + 60);
    }

    #[test]
    fn test_rejects_non_finite_and_out_of_range() {
        let mut bad = profile(30, 100.0);
        bad.current_savings = f64::NAN;
        assert!(project(&bad, fixed_now()).is_err());

        let mut negative = profile(30, 100.0);
        negative.monthly_savings = -1.0;
        assert!(project(&negative, fixed_now()).is_err());

        let mut oversized_bonus = profile(30, 100.0);
        oversized_bonus.bonus_savings = 10_001.0;
        assert!(project(&oversized_bonus, fixed_now()).is_err());
    }

    #[test]
    fn test_deterministic() {
        let a = project(&profile(30, 100.0), fixed_now()).unwrap();
        let b = project(&profile(30, 100.0), fixed_now()).unwrap();
        assert_eq!(a.year_by_year, b.year_by_year);
    }
}
