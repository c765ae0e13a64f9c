//! Domain analyzer
//!
//! One invocation walks a fixed state machine: resolve schema, build and
//! execute the analytical query, request a structured assessment, validate
//! it. Every failure terminates in a degraded decision; nothing an
//! analyzer does can raise an error past its boundary.

use crate::profile::AnalyzerProfile;
use crate::query::build_query;
use crate::synthesis::consolidate;
use std::sync::Arc;
use vigil_core::{bounded, CallPolicy, Decision, EntitySet, LlmError, StoreError, Thresholds};
use vigil_llm::{parse_payload, CompletionProvider, CompletionRequest, Payload};
use vigil_schema::{SchemaCatalog, SqlRow, SqlStore};

/// Shared services every analyzer runs against. Analyzers are stateless
/// beyond this context, so any number of them may run concurrently.
#[derive(Clone)]
pub struct AnalyzerContext {
    pub catalog: Arc<SchemaCatalog>,
    pub store: Arc<dyn SqlStore>,
    pub provider: Arc<dyn CompletionProvider>,
    pub thresholds: Thresholds,
    pub policy: CallPolicy,
}

/// A risk analyzer for one domain, fully described by its profile.
pub struct DomainAnalyzer {
    profile: AnalyzerProfile,
    ctx: AnalyzerContext,
}

impl DomainAnalyzer {
    pub fn new(profile: AnalyzerProfile, ctx: AnalyzerContext) -> Self {
        Self { profile, ctx }
    }

    pub fn profile(&self) -> &AnalyzerProfile {
        &self.profile
    }

    /// Run one analysis. Total: always returns a decision.
    pub async fn run(&self, query: &str, entities: &EntitySet) -> Decision {
        tracing::info!(analyzer = self.profile.name, query, "running analysis");

        // Schema resolution. Missing tables and missing required columns
        // degrade with distinct diagnostics.
        let catalog = self.ctx.catalog.catalog().await;
        let built = match build_query(
            &self.profile.shape,
            &catalog,
            entities,
            &self.ctx.thresholds,
        ) {
            Ok(built) => built,
            Err(e) => {
                tracing::warn!(analyzer = self.profile.name, error = ?e, "schema resolution failed");
                return self.degraded(e.message());
            }
        };

        // Query execution, bounded by the call policy.
        let rows = match bounded(
            &self.ctx.policy,
            |timeout_ms| StoreError::Timeout { timeout_ms },
            || self.ctx.store.query(&built.sql, &built.params),
        )
        .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(analyzer = self.profile.name, error = %e, "query execution failed");
                return self.degraded(format!("Query execution failed: {}", e));
            }
        };
        tracing::info!(analyzer = self.profile.name, rows = rows.len(), "query executed");

        // Assessment request.
        let request = CompletionRequest::new(self.assessment_prompt(&rows), 1000);
        let text = match bounded(
            &self.ctx.policy,
            |timeout_ms| LlmError::Timeout { timeout_ms },
            || self.ctx.provider.complete(&request),
        )
        .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(analyzer = self.profile.name, error = %e, "assessment generation failed");
                return self.degraded(format!("Assessment generation failed: {}", e));
            }
        };

        // Validation. A well-formed response is trusted as-is; an
        // array-shaped one collapses to its most critical element.
        match parse_payload::<Decision>(&text) {
            Ok(Payload::One(decision)) => decision,
            Ok(Payload::Many(candidates)) => {
                tracing::warn!(
                    analyzer = self.profile.name,
                    candidates = candidates.len(),
                    "assessment returned an array; consolidating"
                );
                consolidate(candidates)
                    .unwrap_or_else(|_| self.degraded("Assessment returned no findings"))
            }
            Err(e) => {
                tracing::warn!(analyzer = self.profile.name, error = %e, "assessment parse failed");
                self.degraded(format!("Assessment response could not be parsed: {}", e))
            }
        }
    }

    fn degraded(&self, message: impl Into<String>) -> Decision {
        Decision::degraded(self.profile.risk_type, self.profile.source_tables, message)
    }

    fn assessment_prompt(&self, rows: &[SqlRow]) -> String {
        let data = serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string());
        let tables = serde_json::to_string(self.profile.source_tables)
            .unwrap_or_else(|_| "[]".to_string());
        format!(
            "You are a {name} analysis agent.\n\n\
             Task: {task}\n\n\
             Rules:\n{rules}\n\n\
             Data:\n{data}\n\n\
             Return ONLY a JSON object with this exact structure:\n\
             {{\n\
             \x20   \"decision\": \"YES or NO\",\n\
             \x20   \"severity\": \"CRITICAL or HIGH or MEDIUM\",\n\
             \x20   \"risk_type\": \"{risk_type}\",\n\
             \x20   \"weeks_of_cover\": number or null,\n\
             \x20   \"reasoning\": {{\n\
             \x20       \"technical\": \"detailed analysis\",\n\
             \x20       \"regulatory\": \"N/A or relevant info\",\n\
             \x20       \"logistical\": \"N/A or relevant info\"\n\
             \x20   }},\n\
             \x20   \"source_tables\": {tables},\n\
             \x20   \"recommended_action\": \"specific action to take\"\n\
             }}\n\n\
             Return only JSON, no markdown or explanation.",
            name = self.profile.name,
            task = self.profile.task,
            rules = (self.profile.guidance)(&self.ctx.thresholds),
            data = data,
            risk_type = self.profile.risk_type,
            tables = tables,
        )
    }
}

/// The five analyzers over one shared context.
pub struct AnalyzerSet {
    pub inventory: DomainAnalyzer,
    pub demand: DomainAnalyzer,
    pub logistics: DomainAnalyzer,
    pub regulatory: DomainAnalyzer,
    pub qa: DomainAnalyzer,
}

impl AnalyzerSet {
    pub fn new(ctx: AnalyzerContext) -> Self {
        Self {
            inventory: DomainAnalyzer::new(crate::profile::inventory(), ctx.clone()),
            demand: DomainAnalyzer::new(crate::profile::demand(), ctx.clone()),
            logistics: DomainAnalyzer::new(crate::profile::logistics(), ctx.clone()),
            regulatory: DomainAnalyzer::new(crate::profile::regulatory(), ctx.clone()),
            qa: DomainAnalyzer::new(crate::profile::qa(), ctx),
        }
    }

    /// The analyzer for a domain, or `None` for GENERAL.
    pub fn for_domain(&self, domain: vigil_core::Domain) -> Option<&DomainAnalyzer> {
        use vigil_core::Domain;
        match domain {
            Domain::Stock => Some(&self.inventory),
            Domain::Demand => Some(&self.demand),
            Domain::Logistics => Some(&self.logistics),
            Domain::Regulatory => Some(&self.regulatory),
            Domain::Qa => Some(&self.qa),
            Domain::General => None,
        }
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
