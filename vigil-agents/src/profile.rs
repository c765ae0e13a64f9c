//! Domain analyzer profiles
//!
//! One analyzer implementation serves five risk domains. Everything that
//! differs between domains is data in an `AnalyzerProfile`: the risk tag,
//! the declared source tables, the semantic column roles the domain's
//! query needs, the query shape, and the threshold guidance embedded in
//! the assessment request.

use vigil_core::{Domain, RiskType, Thresholds};
use vigil_schema::ColumnRole;

// ============================================================================
// COLUMN ROLES
// ============================================================================

/// Shared role vocabulary. Term order is priority order.
pub mod roles {
    use super::ColumnRole;

    pub const COUNTRY: ColumnRole =
        ColumnRole::new("country", &["country", "location", "region", "site"]);
    pub const TRIAL: ColumnRole =
        ColumnRole::new("trial", &["trial", "study", "trial_id", "study_id"]);
    pub const ENROLLMENT_RATE: ColumnRole = ColumnRole::new(
        "enrollment rate",
        &["enrollment_rate", "rate", "enrollment", "enrolled", "patients"],
    );
    pub const REPORT_DATE: ColumnRole = ColumnRole::new(
        "report date",
        &["report_date", "date", "timestamp", "time", "week", "month"],
    );
    pub const LOT: ColumnRole = ColumnRole::new("lot", &["lot", "batch"]);
    pub const EXPIRY: ColumnRole = ColumnRole::new("expiry", &["expiry", "expiration"]);
    pub const LOCATION: ColumnRole =
        ColumnRole::new("location", &["location", "country", "site"]);
    pub const QUANTITY: ColumnRole =
        ColumnRole::new("quantity", &["qty", "quantity", "initial"]);
    pub const AVAILABLE_QUANTITY: ColumnRole = ColumnRole::new(
        "available quantity",
        &["available_quantity", "quantity", "qty", "available"],
    );
    pub const INVENTORY_COUNTRY: ColumnRole =
        ColumnRole::new("inventory country", &["country", "location", "region"]);
    pub const INVENTORY_TRIAL: ColumnRole =
        ColumnRole::new("inventory trial", &["trial", "study", "trial_id"]);
    pub const DESTINATION: ColumnRole =
        ColumnRole::new("destination", &["destination", "location", "country"]);
    pub const BATCH: ColumnRole =
        ColumnRole::new("batch", &["batch", "lot", "batch_id", "lot_id"]);
}

// ============================================================================
// QUERY SHAPES
// ============================================================================

/// Which entity an optional scan filter binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterEntity {
    Trial,
    Country,
    Batch,
}

/// The analytical query each domain runs, in schema-independent terms.
/// The query builder turns a shape plus resolved columns into SQL.
#[derive(Debug, Clone, Copy)]
pub enum QueryShape {
    /// Weeks-of-cover CTE: trailing-window average enrollment rate joined
    /// against summed available inventory, filtered server-side to rows at
    /// or under the forecast horizon. The inventory side is optional and
    /// degrades to a literal zero.
    DemandCover {
        enrollment_table: &'static str,
        inventory_table: &'static str,
    },
    /// Expiring-lot projection bounded by the warning window. Requires lot
    /// and expiry roles; trial, location and quantity are appended only
    /// when resolved.
    ExpiryWindow { table: &'static str },
    /// `SELECT *` over one table with an optional fuzzy entity filter.
    Scan {
        table: &'static str,
        filter_entity: FilterEntity,
        filter_role: ColumnRole,
        limit: u32,
    },
}

impl QueryShape {
    /// The table this shape cannot run without.
    pub fn primary_table(&self) -> &'static str {
        match *self {
            QueryShape::DemandCover {
                enrollment_table, ..
            } => enrollment_table,
            QueryShape::ExpiryWindow { table } => table,
            QueryShape::Scan { table, .. } => table,
        }
    }
}

// ============================================================================
// ANALYZER PROFILE
// ============================================================================

/// Complete description of one domain analyzer.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerProfile {
    pub domain: Domain,
    pub risk_type: RiskType,
    /// Short name used in logs.
    pub name: &'static str,
    /// Tables this analyzer declares as provenance, degraded paths
    /// included.
    pub source_tables: &'static [&'static str],
    pub shape: QueryShape,
    /// One-line task statement for the assessment request.
    pub task: &'static str,
    /// Threshold rules embedded in the assessment request.
    pub guidance: fn(&Thresholds) -> String,
}

/// Inventory expiry analyzer.
pub fn inventory() -> AnalyzerProfile {
    AnalyzerProfile {
        domain: Domain::Stock,
        risk_type: RiskType::Expiry,
        name: "inventory",
        source_tables: &["affiliate_warehouse_inventory", "available_inventory_report"],
        shape: QueryShape::ExpiryWindow {
            table: "available_inventory_report",
        },
        task: "Analyze the following inventory data and classify expiry risk.",
        guidance: |t| {
            format!(
                "- CRITICAL if expiry <= {} days\n- HIGH if expiry <= {} days\n- MEDIUM if expiry <= {} days",
                t.critical_expiry_days, t.high_expiry_days, t.expiry_warning_days
            )
        },
    }
}

/// Demand shortfall analyzer.
pub fn demand() -> AnalyzerProfile {
    AnalyzerProfile {
        domain: Domain::Demand,
        risk_type: RiskType::Shortfall,
        name: "demand",
        source_tables: &[
            "enrollment_rate_report",
            "country_level_enrollment_report",
            "available_inventory_report",
        ],
        shape: QueryShape::DemandCover {
            enrollment_table: "enrollment_rate_report",
            inventory_table: "available_inventory_report",
        },
        task: "Analyze enrollment velocity and project supply shortfall risk.",
        guidance: |t| {
            format!(
                "- CRITICAL if weeks_of_cover < 2\n- HIGH if weeks_of_cover < 4\n- MEDIUM if weeks_of_cover < {}",
                t.demand_forecast_weeks
            )
        },
    }
}

/// Logistics lead-time analyzer.
pub fn logistics() -> AnalyzerProfile {
    AnalyzerProfile {
        domain: Domain::Logistics,
        risk_type: RiskType::Logistics,
        name: "logistics",
        source_tables: &["distribution_order_report", "ip_shipping_timelines_report"],
        shape: QueryShape::Scan {
            table: "ip_shipping_timelines_report",
            filter_entity: FilterEntity::Country,
            filter_role: roles::DESTINATION,
            limit: 50,
        },
        task: "Analyze shipping timelines and lead time feasibility.",
        guidance: |_| {
            "- CRITICAL if lead_time > 30 days\n- HIGH if lead_time > 21 days\n- MEDIUM if lead_time > 14 days"
                .to_string()
        },
    }
}

/// Regulatory approval analyzer. The assessment must reduce the full
/// result set to one record, never one decision per row.
pub fn regulatory() -> AnalyzerProfile {
    AnalyzerProfile {
        domain: Domain::Regulatory,
        risk_type: RiskType::Regulatory,
        name: "regulatory",
        source_tables: &["rim", "material_country_requirements"],
        shape: QueryShape::Scan {
            table: "rim",
            filter_entity: FilterEntity::Country,
            filter_role: roles::COUNTRY,
            limit: 50,
        },
        task: "Analyze ALL the regulatory data and provide ONE SINGLE consolidated decision.",
        guidance: |_| {
            "- CRITICAL if ANY status = \"REJECTED\"\n- HIGH if ANY status = \"PENDING\" and urgent\n- MEDIUM if ANY status = \"PENDING\"\n- Decision = \"NO\" if there are ANY issues, \"YES\" if all clear"
                .to_string()
        },
    }
}

/// Quality-assurance re-evaluation analyzer.
pub fn qa() -> AnalyzerProfile {
    AnalyzerProfile {
        domain: Domain::Qa,
        risk_type: RiskType::Qa,
        name: "qa",
        source_tables: &["re-evaluation", "qdocs"],
        shape: QueryShape::Scan {
            table: "re-evaluation",
            filter_entity: FilterEntity::Batch,
            filter_role: roles::BATCH,
            limit: 50,
        },
        task: "Analyze re-evaluation history and stability data.",
        guidance: |_| {
            "- Decision = \"YES\" if past re-evaluation successful\n- HIGH if re-evaluation required but not done\n- MEDIUM if stability data inconclusive"
                .to_string()
        },
    }
}

/// All five profiles in dispatch order.
pub fn all_profiles() -> [AnalyzerProfile; 5] {
    [inventory(), demand(), logistics(), regulatory(), qa()]
}

// ============================================================================
// UNIT TESTS
// ============================================================================
