//! Report export boundary
//!
//! Document formatting happens in an external service; the core only
//! hands over the finished projection and receives an opaque location.

use crate::models::{FinancialProfile, ProjectionResult};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque reference to an exported document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportLocation {
    pub reference: String,
}

/// Trait for the document-export collaborator.
#[async_trait]
pub trait ReportExporter: Send + Sync {
    async fn export(
        &self,
        profile: &FinancialProfile,
        projection: &ProjectionResult,
        display_name: &str,
    ) -> Result<ReportLocation>;
}

/// Exporter that fabricates a location without leaving the process.
/// Used in tests and keyless deployments.
pub struct NoopExporter;

#[async_trait]
impl ReportExporter for NoopExporter {
    async fn export(
        &self,
        _profile: &FinancialProfile,
        projection: &ProjectionResult,
        display_name: &str,
    ) -> Result<ReportLocation> {
        Ok(ReportLocation {
            reference: format!(
                "local://reports/{}-{}y-{}",
                display_name.to_lowercase().replace(' ', "-"),
                projection.horizon_years,
                Uuid::new_v4()
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_noop_exporter_returns_location() {
        let profile = FinancialProfile {
            age: 40,
            annual_income: 50_000.0,
            current_savings: 5_000.0,
            monthly_savings: 200.0,
            monthly_investment: 100.0,
            increase_percentage: 0.0,
            bonus_savings: 50.0,
        };
        let projection = crate::projection::project(&profile, Utc::now()).unwrap();

        let location = NoopExporter
            .export(&profile, &projection, "Jamie Doe")
            .await
            .unwrap();
        assert!(location.reference.starts_with("local://reports/jamie-doe-50y-"));
    }
}
