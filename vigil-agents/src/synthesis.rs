//! Decision synthesis
//!
//! Deterministic reduction of several decisions to one. The highest
//! severity drives the outcome; ties break toward the first occurrence,
//! so input order matters and the result is reproducible.

use vigil_core::{Decision, MergeError, Reasoning, RiskType};

/// Index of the maximal-severity element, first occurrence winning ties.
fn winner_index(decisions: &[Decision]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, decision) in decisions.iter().enumerate() {
        match best {
            None => best = Some(index),
            Some(current) if decision.severity > decisions[current].severity => {
                best = Some(index)
            }
            _ => {}
        }
    }
    best
}

/// Deduplicating union preserving first-seen order.
fn union_tables(decisions: &[Decision]) -> Vec<String> {
    let mut seen = Vec::new();
    for decision in decisions {
        for table in &decision.source_tables {
            if !seen.contains(table) {
                seen.push(table.clone());
            }
        }
    }
    seen
}

/// Aggregate one reasoning field across inputs: values other than "N/A"
/// joined in order, or "N/A" when no input had anything to say.
fn merge_field(decisions: &[Decision], pick: fn(&Reasoning) -> &String) -> String {
    let parts: Vec<&str> = decisions
        .iter()
        .map(|d| pick(&d.reasoning).as_str())
        .filter(|text| !text.is_empty() && *text != "N/A")
        .collect();
    if parts.is_empty() {
        "N/A".to_string()
    } else {
        parts.join("; ")
    }
}

/// Merge several per-domain decisions into one consolidated decision.
///
/// - severity and verdict come from the maximal-severity input;
/// - `source_tables` is the deduplicated union of all inputs;
/// - each reasoning field aggregates independently;
/// - `weeks_of_cover` survives only when the winning input is a
///   SHORTFALL finding;
/// - uncertainty is present iff any input carries one.
pub fn merge(decisions: &[Decision]) -> Result<Decision, MergeError> {
    let winner_index = winner_index(decisions).ok_or(MergeError::EmptyInput)?;
    let winner = &decisions[winner_index];

    let risk_type = if decisions
        .iter()
        .all(|d| d.risk_type == winner.risk_type)
    {
        winner.risk_type
    } else {
        RiskType::Multiple
    };

    let uncertainties: Vec<&str> = decisions
        .iter()
        .filter_map(|d| d.uncertainty.as_deref())
        .collect();

    Ok(Decision {
        decision: winner.decision,
        severity: winner.severity,
        risk_type,
        weeks_of_cover: if winner.risk_type == RiskType::Shortfall {
            winner.weeks_of_cover
        } else {
            None
        },
        reasoning: Reasoning {
            technical: merge_field(decisions, |r| &r.technical),
            regulatory: merge_field(decisions, |r| &r.regulatory),
            logistical: merge_field(decisions, |r| &r.logistical),
        },
        source_tables: union_tables(decisions),
        recommended_action: winner.recommended_action.clone(),
        uncertainty: if uncertainties.is_empty() {
            None
        } else {
            Some(uncertainties.join("; "))
        },
    })
}

/// Collapse an array-shaped assessment response to its single most
/// critical element, annotating the winner's domain reasoning slot with
/// the consolidation note.
///
/// The generation capability sometimes answers a one-object request with
/// one candidate per row; this is where that shape is reduced.
pub fn consolidate(mut candidates: Vec<Decision>) -> Result<Decision, MergeError> {
    let index = winner_index(&candidates).ok_or(MergeError::EmptyInput)?;
    let count = candidates.len();
    let mut winner = candidates.swap_remove(index);

    let slot = winner.risk_type.reasoning_slot();
    let field = winner.reasoning.slot_mut(slot);
    let existing = field.clone();
    *field = if existing.is_empty() || existing == "N/A" {
        format!("Consolidated from {} findings.", count)
    } else {
        format!("Consolidated from {} findings. Most critical: {}", count, existing)
    };

    Ok(winner)
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{Severity, Verdict};

    fn decision(
        severity: Severity,
        risk_type: RiskType,
        tables: &[&str],
    ) -> Decision {
        Decision {
            decision: Verdict::Yes,
            severity,
            risk_type,
            weeks_of_cover: None,
            reasoning: Reasoning::na(),
            source_tables: tables.iter().map(|t| t.to_string()).collect(),
            recommended_action: format!("act on {}", risk_type),
            uncertainty: None,
        }
    }

    #[test]
    fn test_merge_empty_is_rejected() {
        assert_eq!(merge(&[]).unwrap_err(), MergeError::EmptyInput);
    }

    #[test]
    fn test_merge_takes_max_severity_and_unions_tables() {
        let merged = merge(&[
            decision(Severity::Medium, RiskType::Expiry, &["a", "b"]),
            decision(Severity::Critical, RiskType::Regulatory, &["b", "c"]),
        ])
        .unwrap();
        assert_eq!(merged.severity, Severity::Critical);
        assert_eq!(merged.source_tables, vec!["a", "b", "c"]);
        assert_eq!(merged.risk_type, RiskType::Multiple);
        assert_eq!(merged.recommended_action, "act on REGULATORY");
    }

    #[test]
    fn test_merge_tie_breaks_to_first_occurrence() {
        let mut first = decision(Severity::High, RiskType::Expiry, &["x"]);
        first.decision = Verdict::No;
        let second = decision(Severity::High, RiskType::Logistics, &["y"]);
        let merged = merge(&[first, second]).unwrap();
        assert_eq!(merged.decision, Verdict::No);
        assert_eq!(merged.recommended_action, "act on EXPIRY");
    }

    #[test]
    fn test_merge_preserves_common_risk_type() {
        let merged = merge(&[
            decision(Severity::Medium, RiskType::Qa, &["a"]),
            decision(Severity::High, RiskType::Qa, &["b"]),
        ])
        .unwrap();
        assert_eq!(merged.risk_type, RiskType::Qa);
    }

    #[test]
    fn test_merge_weeks_of_cover_only_from_shortfall_winner() {
        let mut shortfall = decision(Severity::Critical, RiskType::Shortfall, &["inv"]);
        shortfall.weeks_of_cover = Some(1.25);
        let other = decision(Severity::Medium, RiskType::Logistics, &["ship"]);
        let merged = merge(&[shortfall.clone(), other.clone()]).unwrap();
        assert_eq!(merged.weeks_of_cover, Some(1.25));

        // When a non-shortfall input wins, cover is dropped even if
        // present somewhere in the inputs.
        let mut logistics = decision(Severity::Critical, RiskType::Logistics, &["ship"]);
        logistics.weeks_of_cover = Some(9.0);
        let merged = merge(&[shortfall, logistics]).unwrap();
        assert_eq!(merged.severity, Severity::Critical);
        assert_eq!(merged.weeks_of_cover, Some(1.25));
    }

    #[test]
    fn test_merge_aggregates_reasoning_fields_independently() {
        let mut a = decision(Severity::Medium, RiskType::Expiry, &[]);
        a.reasoning.technical = "12 lots expiring".to_string();
        let mut b = decision(Severity::High, RiskType::Regulatory, &[]);
        b.reasoning.regulatory = "two pending filings".to_string();
        let merged = merge(&[a, b]).unwrap();
        assert_eq!(merged.reasoning.technical, "12 lots expiring");
        assert_eq!(merged.reasoning.regulatory, "two pending filings");
        assert_eq!(merged.reasoning.logistical, "N/A");
    }

    #[test]
    fn test_merge_concatenates_uncertainty() {
        let mut a = decision(Severity::Medium, RiskType::Expiry, &[]);
        a.uncertainty = Some("stale snapshot".to_string());
        let b = decision(Severity::Medium, RiskType::Qa, &[]);
        let mut c = decision(Severity::Medium, RiskType::Logistics, &[]);
        c.uncertainty = Some("carrier data missing".to_string());
        let merged = merge(&[a, b, c]).unwrap();
        assert_eq!(
            merged.uncertainty.as_deref(),
            Some("stale snapshot; carrier data missing")
        );
    }

    #[test]
    fn test_consolidate_picks_most_critical_and_annotates() {
        let mut low = decision(Severity::Medium, RiskType::Regulatory, &["rim"]);
        low.reasoning.regulatory = "pending in one market".to_string();
        let mut high = decision(Severity::Critical, RiskType::Regulatory, &["rim"]);
        high.reasoning.regulatory = "rejected in Brazil".to_string();
        let tail = decision(Severity::High, RiskType::Regulatory, &["rim"]);

        let result = consolidate(vec![low, high, tail]).unwrap();
        assert_eq!(result.severity, Severity::Critical);
        assert!(result
            .reasoning
            .regulatory
            .contains("Consolidated from 3 findings."));
        assert!(result.reasoning.regulatory.contains("rejected in Brazil"));
    }

    #[test]
    fn test_consolidate_annotates_empty_slot() {
        let result = consolidate(vec![decision(
            Severity::Medium,
            RiskType::Regulatory,
            &["rim"],
        )])
        .unwrap();
        assert_eq!(
            result.reasoning.regulatory,
            "Consolidated from 1 findings."
        );
    }

    #[test]
    fn test_consolidate_empty_is_rejected() {
        assert_eq!(consolidate(vec![]).unwrap_err(), MergeError::EmptyInput);
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
