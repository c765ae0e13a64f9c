//! Decision model and classification types
//!
//! A `Decision` is the single structured output of every risk analysis,
//! whether produced by one analyzer, by the synthesizer, or by a degraded
//! fallback path. Decisions are immutable once constructed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// SEVERITY
// ============================================================================

/// Risk severity, totally ordered: `Critical > High > Medium`.
///
/// Variant order matters: `Ord` derives from declaration order, and every
/// threshold rule and the synthesizer's max-selection compare through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Numeric rank used in audit records and logs.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Medium => 1,
            Severity::High => 2,
            Severity::Critical => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

// ============================================================================
// VERDICT
// ============================================================================

/// Binary outcome of an analysis: does the risk condition hold?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Yes,
    No,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Yes => write!(f, "YES"),
            Verdict::No => write!(f, "NO"),
        }
    }
}

// ============================================================================
// RISK TYPE
// ============================================================================

/// Tag identifying which risk category a decision belongs to.
///
/// `Multiple` is the union tag used when merged inputs disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskType {
    Shortfall,
    Expiry,
    Logistics,
    Regulatory,
    Qa,
    General,
    Multiple,
}

impl RiskType {
    /// Which reasoning field carries failure messages for this risk type.
    ///
    /// Degraded decisions place their diagnostic in the domain-relevant
    /// reasoning slot and "N/A" in the others.
    pub fn reasoning_slot(&self) -> ReasoningSlot {
        match self {
            RiskType::Logistics => ReasoningSlot::Logistical,
            RiskType::Regulatory => ReasoningSlot::Regulatory,
            _ => ReasoningSlot::Technical,
        }
    }
}

impl fmt::Display for RiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            RiskType::Shortfall => "SHORTFALL",
            RiskType::Expiry => "EXPIRY",
            RiskType::Logistics => "LOGISTICS",
            RiskType::Regulatory => "REGULATORY",
            RiskType::Qa => "QA",
            RiskType::General => "GENERAL",
            RiskType::Multiple => "MULTIPLE",
        };
        write!(f, "{}", tag)
    }
}

/// Selector for one of the three reasoning fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningSlot {
    Technical,
    Regulatory,
    Logistical,
}

// ============================================================================
// REASONING
// ============================================================================

/// Three-perspective justification attached to every decision.
/// Fields are always present; "N/A" marks a perspective with nothing to say.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reasoning {
    pub technical: String,
    pub regulatory: String,
    pub logistical: String,
}

impl Reasoning {
    /// All three fields set to "N/A".
    pub fn na() -> Self {
        Self {
            technical: "N/A".to_string(),
            regulatory: "N/A".to_string(),
            logistical: "N/A".to_string(),
        }
    }

    /// "N/A" everywhere except the given slot, which carries `message`.
    pub fn with_slot(slot: ReasoningSlot, message: impl Into<String>) -> Self {
        let mut reasoning = Self::na();
        match slot {
            ReasoningSlot::Technical => reasoning.technical = message.into(),
            ReasoningSlot::Regulatory => reasoning.regulatory = message.into(),
            ReasoningSlot::Logistical => reasoning.logistical = message.into(),
        }
        reasoning
    }

    pub fn slot_mut(&mut self, slot: ReasoningSlot) -> &mut String {
        match slot {
            ReasoningSlot::Technical => &mut self.technical,
            ReasoningSlot::Regulatory => &mut self.regulatory,
            ReasoningSlot::Logistical => &mut self.logistical,
        }
    }
}

// ============================================================================
// DECISION
// ============================================================================

/// The structured risk assessment returned by an analyzer or by synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub decision: Verdict,
    pub severity: Severity,
    pub risk_type: RiskType,
    /// Weeks of remaining supply cover. Meaningful only for SHORTFALL
    /// decisions; serialized as null otherwise.
    #[serde(default)]
    pub weeks_of_cover: Option<f64>,
    pub reasoning: Reasoning,
    /// Tables consulted to reach this decision. Set semantics; serialized
    /// as an ordered, deduplicated array.
    pub source_tables: Vec<String>,
    pub recommended_action: String,
    /// Present only when confidence in the decision is impaired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<String>,
}

impl Decision {
    /// The uniform non-throwing fallback for every analyzer failure path.
    ///
    /// `message` lands in the risk type's reasoning slot and in
    /// `uncertainty`; the analyzer's declared table list is preserved so a
    /// degraded decision still names its provenance.
    pub fn degraded(
        risk_type: RiskType,
        source_tables: &[&str],
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        Self {
            decision: Verdict::No,
            severity: Severity::Medium,
            risk_type,
            weeks_of_cover: None,
            reasoning: Reasoning::with_slot(risk_type.reasoning_slot(), message.clone()),
            source_tables: source_tables.iter().map(|t| t.to_string()).collect(),
            recommended_action: "Check database connectivity and table schema".to_string(),
            uncertainty: Some(message),
        }
    }

    /// Whether this decision came out of a degraded fallback path.
    pub fn is_degraded(&self) -> bool {
        self.uncertainty.is_some()
    }
}

// ============================================================================
// DOMAIN AND ENTITIES
// ============================================================================

/// Risk domain a user query is classified into. One analyzer per domain;
/// `General` short-circuits to a fixed "intent unclear" decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Domain {
    Stock,
    Demand,
    Logistics,
    Regulatory,
    Qa,
    General,
}

impl FromStr for Domain {
    type Err = ();

    /// Case-insensitive; anything unrecognized maps to `General` rather
    /// than failing, so a sloppy classifier cannot break routing.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "STOCK" => Domain::Stock,
            "DEMAND" => Domain::Demand,
            "LOGISTICS" => Domain::Logistics,
            "REGULATORY" => Domain::Regulatory,
            "QA" => Domain::Qa,
            _ => Domain::General,
        })
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Domain::Stock => "STOCK",
            Domain::Demand => "DEMAND",
            Domain::Logistics => "LOGISTICS",
            Domain::Regulatory => "REGULATORY",
            Domain::Qa => "QA",
            Domain::General => "GENERAL",
        };
        write!(f, "{}", tag)
    }
}

/// Entities extracted from free text, used to filter analytical queries.
/// Classifiers return literal "null"/"" for absent values; `normalized`
/// folds those into `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySet {
    #[serde(default)]
    pub trial_id: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub batch_id: Option<String>,
}

impl EntitySet {
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value.and_then(|v| {
                let trimmed = v.trim().to_string();
                if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
                    None
                } else {
                    Some(trimmed)
                }
            })
        }
        Self {
            trial_id: clean(self.trial_id),
            country: clean(self.country),
            batch_id: clean(self.batch_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trial_id.is_none() && self.country.is_none() && self.batch_id.is_none()
    }
}

/// Result of intent classification over a user query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub domain: Domain,
    pub entities: EntitySet,
    pub confidence: f64,
}

impl Classification {
    /// The fallback returned when classification output cannot be parsed.
    pub fn unclassified() -> Self {
        Self {
            domain: Domain::General,
            entities: EntitySet::default(),
            confidence: 0.0,
        }
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
