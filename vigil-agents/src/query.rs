//! Parametrized analytical query construction
//!
//! Queries are assembled from catalog-resolved column names and the
//! extracted entity set. Identifier text comes only from the live catalog;
//! entity values are always carried as positional bind parameters with
//! fuzzy `ILIKE '%' || $n || '%'` matching. The partial, case-insensitive
//! match is deliberate semantics, not an accident.

use crate::profile::{roles, FilterEntity, QueryShape};
use vigil_core::{EntitySet, Thresholds};
use vigil_schema::TableCatalog;

/// A query ready for the store: SQL text plus positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<String>,
}

/// Why a query could not be built. The two cases produce distinct
/// degraded reasoning so operators can tell a missing table from an
/// incompatible one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryBuildError {
    TableMissing { table: String },
    ColumnsMissing { table: String, detail: String },
}

impl QueryBuildError {
    pub fn message(&self) -> String {
        match self {
            QueryBuildError::TableMissing { table } => format!("Table {} not found", table),
            QueryBuildError::ColumnsMissing { detail, .. } => detail.clone(),
        }
    }
}

/// Append a fuzzy entity filter when both the value and the column are
/// present; otherwise the clause is omitted entirely.
fn push_fuzzy_filter(
    sql: &mut String,
    params: &mut Vec<String>,
    column: Option<&str>,
    value: Option<&str>,
) {
    if let (Some(column), Some(value)) = (column, value) {
        params.push(value.to_string());
        sql.push_str(&format!(
            " AND \"{}\" ILIKE '%' || ${} || '%'",
            column,
            params.len()
        ));
    }
}

/// Build the SQL for a query shape against the catalog snapshot.
pub fn build_query(
    shape: &QueryShape,
    catalog: &TableCatalog,
    entities: &EntitySet,
    thresholds: &Thresholds,
) -> Result<BuiltQuery, QueryBuildError> {
    match shape {
        QueryShape::Scan {
            table,
            filter_entity,
            filter_role,
            limit,
        } => {
            let resolved =
                catalog
                    .resolve_table(table)
                    .ok_or_else(|| QueryBuildError::TableMissing {
                        table: table.to_string(),
                    })?;

            let value = match filter_entity {
                FilterEntity::Trial => entities.trial_id.as_deref(),
                FilterEntity::Country => entities.country.as_deref(),
                FilterEntity::Batch => entities.batch_id.as_deref(),
            };
            let column = filter_role.resolve(&resolved.columns);

            let mut params = Vec::new();
            let mut sql = format!("SELECT * FROM \"{}\" WHERE 1=1", resolved.name);
            push_fuzzy_filter(&mut sql, &mut params, column.as_deref(), value);
            sql.push_str(&format!(" LIMIT {}", limit));

            Ok(BuiltQuery { sql, params })
        }

        QueryShape::ExpiryWindow { table } => {
            let resolved =
                catalog
                    .resolve_table(table)
                    .ok_or_else(|| QueryBuildError::TableMissing {
                        table: table.to_string(),
                    })?;

            let lot_col = roles::LOT.resolve(&resolved.columns);
            let expiry_col = roles::EXPIRY.resolve(&resolved.columns);
            let (Some(lot_col), Some(expiry_col)) = (lot_col, expiry_col) else {
                return Err(QueryBuildError::ColumnsMissing {
                    table: resolved.name.clone(),
                    detail: format!("Required columns not found in table {}", resolved.name),
                });
            };

            let trial_col = roles::TRIAL.resolve(&resolved.columns);
            let location_col = roles::LOCATION.resolve(&resolved.columns);
            let qty_col = roles::QUANTITY.resolve(&resolved.columns);

            let mut sql = format!(
                "SELECT \"{}\" AS batch_id, \"{}\" AS expiry_date",
                lot_col, expiry_col
            );
            if let Some(col) = &trial_col {
                sql.push_str(&format!(", \"{}\" AS trial_id", col));
            }
            if let Some(col) = &location_col {
                sql.push_str(&format!(", \"{}\" AS country", col));
            }
            if let Some(col) = &qty_col {
                sql.push_str(&format!(", \"{}\" AS available_quantity", col));
            }
            sql.push_str(&format!(" FROM \"{}\" WHERE 1=1", resolved.name));

            let mut params = Vec::new();
            push_fuzzy_filter(
                &mut sql,
                &mut params,
                trial_col.as_deref(),
                entities.trial_id.as_deref(),
            );
            push_fuzzy_filter(
                &mut sql,
                &mut params,
                location_col.as_deref(),
                entities.country.as_deref(),
            );

            sql.push_str(&format!(
                " AND \"{}\"::date <= CURRENT_DATE + INTERVAL '{} days'",
                expiry_col, thresholds.expiry_warning_days
            ));

            Ok(BuiltQuery { sql, params })
        }

        QueryShape::DemandCover {
            enrollment_table,
            inventory_table,
        } => {
            let enroll = catalog.resolve_table(enrollment_table).ok_or_else(|| {
                QueryBuildError::TableMissing {
                    table: enrollment_table.to_string(),
                }
            })?;

            let rate_col = roles::ENROLLMENT_RATE.resolve(&enroll.columns).ok_or_else(|| {
                QueryBuildError::ColumnsMissing {
                    table: enroll.name.clone(),
                    detail: format!(
                        "Enrollment rate column not found in {}; available columns: {}. Demand forecasting is not supported by this schema",
                        enroll.name,
                        enroll.columns.iter().take(5).cloned().collect::<Vec<_>>().join(", ")
                    ),
                }
            })?;
            let country_col = roles::COUNTRY.resolve(&enroll.columns);
            let trial_col = roles::TRIAL.resolve(&enroll.columns);
            let date_col = roles::REPORT_DATE.resolve(&enroll.columns);
            let (Some(country_col), Some(trial_col), Some(date_col)) =
                (country_col, trial_col, date_col)
            else {
                return Err(QueryBuildError::ColumnsMissing {
                    table: enroll.name.clone(),
                    detail: format!(
                        "Required columns (country, trial, date) not found in {}",
                        enroll.name
                    ),
                });
            };

            // The inventory side is optional: without a joinable table the
            // cover computation degrades to a literal zero.
            let inventory = catalog.resolve_table(inventory_table).and_then(|inv| {
                let inv_country = roles::INVENTORY_COUNTRY.resolve(&inv.columns)?;
                let inv_trial = roles::INVENTORY_TRIAL.resolve(&inv.columns)?;
                let qty = roles::AVAILABLE_QUANTITY.resolve(&inv.columns);
                Some((inv, inv_country, inv_trial, qty))
            });

            let mut params = Vec::new();
            let mut sql = format!(
                "WITH weekly_demand AS (\
                 SELECT \"{country}\" AS country, \"{trial}\" AS trial_id, \
                 AVG(\"{rate}\") * 7 AS weekly_consumption \
                 FROM \"{table}\" \
                 WHERE \"{date}\"::date >= CURRENT_DATE - INTERVAL '28 days'",
                country = country_col,
                trial = trial_col,
                rate = rate_col,
                date = date_col,
                table = enroll.name,
            );
            push_fuzzy_filter(
                &mut sql,
                &mut params,
                Some(trial_col.as_str()),
                entities.trial_id.as_deref(),
            );
            push_fuzzy_filter(
                &mut sql,
                &mut params,
                Some(country_col.as_str()),
                entities.country.as_deref(),
            );
            sql.push_str(" GROUP BY 1, 2)");

            match inventory {
                Some((inv, inv_country, inv_trial, qty)) => {
                    let qty_expr = match &qty {
                        Some(col) => format!("SUM(\"{}\")", col),
                        None => "0".to_string(),
                    };
                    sql.push_str(&format!(
                        ", available_stock AS (\
                         SELECT \"{country}\" AS country, \"{trial}\" AS trial_id, \
                         {qty} AS total_inventory \
                         FROM \"{table}\" \
                         WHERE 1=1",
                        country = inv_country,
                        trial = inv_trial,
                        qty = qty_expr,
                        table = inv.name,
                    ));
                    push_fuzzy_filter(
                        &mut sql,
                        &mut params,
                        Some(inv_trial.as_str()),
                        entities.trial_id.as_deref(),
                    );
                    push_fuzzy_filter(
                        &mut sql,
                        &mut params,
                        Some(inv_country.as_str()),
                        entities.country.as_deref(),
                    );
                    sql.push_str(" GROUP BY 1, 2)");

                    sql.push_str(&format!(
                        " SELECT d.country, d.trial_id, \
                         COALESCE(a.total_inventory, 0) AS total_inventory, \
                         d.weekly_consumption, \
                         CASE WHEN d.weekly_consumption > 0 \
                         THEN COALESCE(a.total_inventory, 0) / d.weekly_consumption \
                         ELSE NULL END AS weeks_of_cover \
                         FROM weekly_demand d \
                         LEFT JOIN available_stock a \
                         ON d.country = a.country AND d.trial_id = a.trial_id \
                         WHERE COALESCE(a.total_inventory, 0) / NULLIF(d.weekly_consumption, 0) <= {}",
                        thresholds.demand_forecast_weeks
                    ));
                }
                None => {
                    // No usable inventory source: zero cover everywhere,
                    // which is always inside the horizon.
                    sql.push_str(
                        " SELECT d.country, d.trial_id, 0 AS total_inventory, \
                         d.weekly_consumption, \
                         CASE WHEN d.weekly_consumption > 0 THEN 0 ELSE NULL END AS weeks_of_cover \
                         FROM weekly_demand d",
                    );
                }
            }

            Ok(BuiltQuery { sql, params })
        }
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile;
    use vigil_schema::TableCatalog;

    fn catalog() -> TableCatalog {
        TableCatalog::new(vec![
            (
                "enrollment_rate_report".to_string(),
                vec![
                    "trial_id".to_string(),
                    "country".to_string(),
                    "enrollment_rate".to_string(),
                    "report_date".to_string(),
                ],
            ),
            (
                "available_inventory_report".to_string(),
                vec![
                    "trial_id".to_string(),
                    "country".to_string(),
                    "available_quantity".to_string(),
                    "batch_id".to_string(),
                    "expiry_date".to_string(),
                ],
            ),
            (
                "ip_shipping_timelines_report".to_string(),
                vec![
                    "order_id".to_string(),
                    "origin".to_string(),
                    "destination".to_string(),
                    "lead_time_days".to_string(),
                ],
            ),
            (
                "Re_Evaluation".to_string(),
                vec![
                    "batch_id".to_string(),
                    "evaluation_date".to_string(),
                    "result".to_string(),
                ],
            ),
        ])
    }

    fn placeholder_count(sql: &str) -> usize {
        (1..=9).filter(|n| sql.contains(&format!("${}", n))).count()
    }

    #[test]
    fn test_scan_without_entities_has_no_filter() {
        let built = build_query(
            &profile::logistics().shape,
            &catalog(),
            &EntitySet::default(),
            &Thresholds::default(),
        )
        .unwrap();
        assert_eq!(
            built.sql,
            "SELECT * FROM \"ip_shipping_timelines_report\" WHERE 1=1 LIMIT 50"
        );
        assert!(built.params.is_empty());
    }

    #[test]
    fn test_scan_with_country_binds_fuzzy_filter() {
        let entities = EntitySet {
            country: Some("Germany".to_string()),
            ..EntitySet::default()
        };
        let built = build_query(
            &profile::logistics().shape,
            &catalog(),
            &entities,
            &Thresholds::default(),
        )
        .unwrap();
        assert!(built
            .sql
            .contains("\"destination\" ILIKE '%' || $1 || '%'"));
        assert_eq!(built.params, vec!["Germany".to_string()]);
        // The user value never appears in the SQL text.
        assert!(!built.sql.contains("Germany"));
    }

    #[test]
    fn test_scan_entity_without_column_is_ignored() {
        let entities = EntitySet {
            batch_id: Some("B-77".to_string()),
            ..EntitySet::default()
        };
        // Logistics filters on country, so a batch entity is not bound.
        let built = build_query(
            &profile::logistics().shape,
            &catalog(),
            &entities,
            &Thresholds::default(),
        )
        .unwrap();
        assert!(built.params.is_empty());
    }

    #[test]
    fn test_scan_missing_table() {
        let err = build_query(
            &profile::regulatory().shape,
            &catalog(),
            &EntitySet::default(),
            &Thresholds::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            QueryBuildError::TableMissing {
                table: "rim".to_string()
            }
        );
        assert!(err.message().contains("rim"));
    }

    #[test]
    fn test_qa_scan_resolves_hyphenated_table() {
        let entities = EntitySet {
            batch_id: Some("LOT-9".to_string()),
            ..EntitySet::default()
        };
        let built = build_query(
            &profile::qa().shape,
            &catalog(),
            &entities,
            &Thresholds::default(),
        )
        .unwrap();
        assert!(built.sql.contains("FROM \"Re_Evaluation\""));
        assert!(built.sql.contains("\"batch_id\" ILIKE"));
        assert_eq!(built.params, vec!["LOT-9".to_string()]);
    }

    #[test]
    fn test_expiry_window_projection_and_window() {
        let built = build_query(
            &profile::inventory().shape,
            &catalog(),
            &EntitySet::default(),
            &Thresholds::default(),
        )
        .unwrap();
        assert!(built.sql.contains("\"batch_id\" AS batch_id"));
        assert!(built.sql.contains("\"expiry_date\" AS expiry_date"));
        assert!(built.sql.contains("\"available_quantity\" AS available_quantity"));
        assert!(built.sql.contains("INTERVAL '90 days'"));
    }

    #[test]
    fn test_expiry_window_missing_required_columns() {
        let sparse = TableCatalog::new(vec![(
            "available_inventory_report".to_string(),
            vec!["trial_id".to_string(), "country".to_string()],
        )]);
        let err = build_query(
            &profile::inventory().shape,
            &sparse,
            &EntitySet::default(),
            &Thresholds::default(),
        )
        .unwrap_err();
        match &err {
            QueryBuildError::ColumnsMissing { detail, .. } => {
                assert!(detail.contains("Required columns not found in table"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_demand_cover_full_join() {
        let entities = EntitySet {
            trial_id: Some("TRIAL-042".to_string()),
            country: Some("France".to_string()),
            batch_id: None,
        };
        let built = build_query(
            &profile::demand().shape,
            &catalog(),
            &entities,
            &Thresholds::default(),
        )
        .unwrap();
        assert!(built.sql.starts_with("WITH weekly_demand AS ("));
        assert!(built.sql.contains("available_stock AS ("));
        assert!(built.sql.contains("LEFT JOIN available_stock"));
        assert!(built.sql.contains("<= 8"));
        // trial + country on both CTE sides, in order.
        assert_eq!(
            built.params,
            vec![
                "TRIAL-042".to_string(),
                "France".to_string(),
                "TRIAL-042".to_string(),
                "France".to_string(),
            ]
        );
        assert_eq!(placeholder_count(&built.sql), 4);
    }

    #[test]
    fn test_demand_cover_without_inventory_table() {
        let sparse = TableCatalog::new(vec![(
            "enrollment_rate_report".to_string(),
            vec![
                "trial_id".to_string(),
                "country".to_string(),
                "enrollment_rate".to_string(),
                "report_date".to_string(),
            ],
        )]);
        let built = build_query(
            &profile::demand().shape,
            &sparse,
            &EntitySet::default(),
            &Thresholds::default(),
        )
        .unwrap();
        assert!(!built.sql.contains("available_stock"));
        assert!(built.sql.contains("0 AS total_inventory"));
    }

    #[test]
    fn test_demand_cover_missing_rate_column() {
        let sparse = TableCatalog::new(vec![(
            "enrollment_rate_report".to_string(),
            vec!["trial_id".to_string(), "country".to_string(), "report_date".to_string()],
        )]);
        let err = build_query(
            &profile::demand().shape,
            &sparse,
            &EntitySet::default(),
            &Thresholds::default(),
        )
        .unwrap_err();
        match &err {
            QueryBuildError::ColumnsMissing { detail, .. } => {
                assert!(detail.contains("Enrollment rate column not found"));
                assert!(detail.contains("enrollment_rate_report"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_demand_cover_missing_dimension_columns() {
        let sparse = TableCatalog::new(vec![(
            "enrollment_rate_report".to_string(),
            vec!["enrollment_rate".to_string()],
        )]);
        let err = build_query(
            &profile::demand().shape,
            &sparse,
            &EntitySet::default(),
            &Thresholds::default(),
        )
        .unwrap_err();
        match &err {
            QueryBuildError::ColumnsMissing { detail, .. } => {
                assert!(detail.contains("Required columns (country, trial, date)"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
