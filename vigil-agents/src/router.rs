//! Intent routing
//!
//! Classifies free text into a risk domain plus extracted entities, then
//! dispatches to the matching analyzer. Classification parse failure is
//! the single error this subsystem lets the caller see; everything an
//! analyzer does wrong becomes a degraded decision instead.

use crate::analyzer::{AnalyzerContext, AnalyzerSet};
use crate::synthesis::merge;
use futures_util::future::join_all;
use serde::Deserialize;
use std::sync::Arc;
use vigil_core::{
    bounded, CallPolicy, Classification, Decision, Domain, EntitySet, LlmError, MergeError,
    Reasoning, ReasoningSlot, RiskType, RouteError, Severity, Verdict,
};
use vigil_llm::{parse_payload, CompletionProvider, CompletionRequest, Payload};

/// Wire shape of the classification response.
#[derive(Debug, Deserialize)]
struct RawClassification {
    intent: String,
    #[serde(default)]
    entities: EntitySet,
    #[serde(default)]
    confidence: f64,
}

/// Routes user queries to domain analyzers.
pub struct Router {
    provider: Arc<dyn CompletionProvider>,
    policy: CallPolicy,
    analyzers: AnalyzerSet,
}

impl Router {
    pub fn new(ctx: AnalyzerContext) -> Self {
        Self {
            provider: Arc::clone(&ctx.provider),
            policy: ctx.policy,
            analyzers: AnalyzerSet::new(ctx),
        }
    }

    /// Classify a query into domain, entities and confidence.
    ///
    /// # Returns
    /// * `Err(RouteError::ClassificationFailed)` - provider failure or
    ///   malformed classification output; callers wanting the GENERAL
    ///   fallback use [`Classification::unclassified`].
    pub async fn classify(&self, query: &str) -> Result<Classification, RouteError> {
        let request = CompletionRequest::new(classification_prompt(query), 500);
        let text = bounded(
            &self.policy,
            |timeout_ms| LlmError::Timeout { timeout_ms },
            || self.provider.complete(&request),
        )
        .await
        .map_err(|e| RouteError::ClassificationFailed {
            reason: e.to_string(),
        })?;

        let raw: RawClassification = match parse_payload(&text) {
            Ok(Payload::One(raw)) => raw,
            Ok(Payload::Many(_)) => {
                return Err(RouteError::ClassificationFailed {
                    reason: "classification returned an array".to_string(),
                })
            }
            Err(e) => {
                return Err(RouteError::ClassificationFailed {
                    reason: e.to_string(),
                })
            }
        };

        let domain: Domain = raw.intent.parse().unwrap_or(Domain::General);
        let classification = Classification {
            domain,
            entities: raw.entities.normalized(),
            confidence: raw.confidence.clamp(0.0, 1.0),
        };
        tracing::info!(
            domain = %classification.domain,
            confidence = classification.confidence,
            "query classified"
        );
        Ok(classification)
    }

    /// Dispatch a classified query to exactly one analyzer. GENERAL (or
    /// anything without an analyzer) returns the fixed intent-unclear
    /// decision without touching the store or the provider.
    pub async fn dispatch(
        &self,
        domain: Domain,
        query: &str,
        entities: &EntitySet,
    ) -> Decision {
        match self.analyzers.for_domain(domain) {
            Some(analyzer) => {
                tracing::info!(analyzer = analyzer.profile().name, "dispatching");
                analyzer.run(query, entities).await
            }
            None => {
                tracing::info!(%domain, "no analyzer for domain");
                intent_unclear()
            }
        }
    }

    /// Classify then dispatch: the whole pipeline for one query.
    pub async fn handle(&self, query: &str) -> Result<Decision, RouteError> {
        let classification = self.classify(query).await?;
        Ok(self
            .dispatch(classification.domain, query, &classification.entities)
            .await)
    }

    /// Fan a query out to several domains concurrently and merge the
    /// results. Analyzers share only read state, so they run in parallel.
    pub async fn run_many(
        &self,
        domains: &[Domain],
        query: &str,
        entities: &EntitySet,
    ) -> Result<Decision, MergeError> {
        let runs = domains
            .iter()
            .map(|domain| self.dispatch(*domain, query, entities));
        let decisions = join_all(runs).await;
        merge(&decisions)
    }
}

/// The fixed decision returned when no analyzer matches the intent.
pub fn intent_unclear() -> Decision {
    Decision {
        decision: Verdict::No,
        severity: Severity::Medium,
        risk_type: RiskType::General,
        weeks_of_cover: None,
        reasoning: Reasoning::with_slot(
            ReasoningSlot::Technical,
            "Unable to classify query intent",
        ),
        source_tables: Vec::new(),
        recommended_action: "Please rephrase your query".to_string(),
        uncertainty: Some("Query intent unclear".to_string()),
    }
}

fn classification_prompt(query: &str) -> String {
    format!(
        "You are an intent classification agent for a clinical supply chain system.\n\n\
         Analyze this user query and return ONLY a JSON object with this structure:\n\
         {{\n\
         \x20   \"intent\": \"STOCK\" | \"DEMAND\" | \"LOGISTICS\" | \"REGULATORY\" | \"QA\" | \"GENERAL\",\n\
         \x20   \"entities\": {{\n\
         \x20       \"trial_id\": \"extracted trial name or null\",\n\
         \x20       \"country\": \"extracted country or null\",\n\
         \x20       \"batch_id\": \"extracted batch ID or null\"\n\
         \x20   }},\n\
         \x20   \"confidence\": 0.0 to 1.0\n\
         }}\n\n\
         User Query: {}\n\n\
         Return only the JSON object, no explanation.",
        query
    )
}

// ============================================================================
// UNIT TESTS
// ============================================================================
