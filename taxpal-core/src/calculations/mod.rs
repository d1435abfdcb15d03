//! The tax estimate engine.
//!
//! Every calculator borrows an immutable [`TaxTable`](crate::TaxTable) and is
//! otherwise stateless, so one table can serve any number of concurrent
//! callers.

pub mod common;
pub mod dashboard;
pub mod estimate;
pub mod federal;
pub mod recommendations;
pub mod report;
pub mod scenario;
pub mod schedule;

pub use dashboard::{
    DashboardOverview, DashboardSummary, MonthTrend, MonthlyTrends, monthly_trends, overview,
    summary,
};
pub use estimate::{EstimateCalculator, EstimateError, TaxEstimate, TaxProjection};
pub use federal::FederalTaxCalculator;
pub use recommendations::{Rule, WELL_OPTIMIZED, estimate_recommendations, evaluate};
pub use report::{
    AnnualReport, ExpenseCategoryTotal, IncomeCategoryTotal, MonthlyTotal, ReportGenerator,
    YearOverYearSummary, year_over_year,
};
pub use scenario::{ScenarioComparator, ScenarioComparison, ScenarioDelta, ScenarioDifference};
pub use schedule::{
    DeadlineKind, Quarter, QuarterlyPayment, QuarterlySchedule, TaxDeadline, quarterly_schedule,
    tax_deadlines, year_range,
};
