//! Domain models for Spendcast

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Expense category (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Travel,
    Entertainment,
    Utilities,
    Healthcare,
    Shopping,
    Education,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Travel => "travel",
            Self::Entertainment => "entertainment",
            Self::Utilities => "utilities",
            Self::Healthcare => "healthcare",
            Self::Shopping => "shopping",
            Self::Education => "education",
            Self::Other => "other",
        }
    }

    /// All categories, in declaration order
    pub fn all() -> &'static [Category] {
        &[
            Self::Food,
            Self::Travel,
            Self::Entertainment,
            Self::Utilities,
            Self::Healthcare,
            Self::Shopping,
            Self::Education,
            Self::Other,
        ]
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "food" => Ok(Self::Food),
            "travel" => Ok(Self::Travel),
            "entertainment" => Ok(Self::Entertainment),
            "utilities" => Ok(Self::Utilities),
            "healthcare" => Ok(Self::Healthcare),
            "shopping" => Ok(Self::Shopping),
            "education" => Ok(Self::Education),
            "other" => Ok(Self::Other),
            _ => Err(format!(
                "Unknown category: {}. Available: food, travel, entertainment, utilities, healthcare, shopping, education, other",
                s
            )),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A ledger owner (resolved from the authenticated identity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A single expense record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub owner_id: i64,
    pub amount: f64,
    pub category: Category,
    pub occurred_at: DateTime<Utc>,
    pub notes: Option<String>,
    /// Opaque pointer to a receipt kept elsewhere (URL, file name, ...)
    pub receipt_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New expense for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    pub amount: f64,
    pub category: Category,
    /// Defaults to now when absent
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub receipt_reference: Option<String>,
}

impl NewExpense {
    pub fn new(amount: f64, category: Category, occurred_at: DateTime<Utc>) -> Self {
        Self {
            amount,
            category,
            occurred_at: Some(occurred_at),
            notes: None,
            receipt_reference: None,
        }
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_amount(self.amount)?;
        if let Some(occurred_at) = &self.occurred_at {
            validate_occurred_at(occurred_at)?;
        }
        Ok(())
    }
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidData(format!(
            "Amount must be a non-negative number, got {}",
            amount
        )));
    }
    Ok(())
}

fn validate_occurred_at(occurred_at: &DateTime<Utc>) -> Result<()> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&occurred_at.year()) {
        return Err(Error::InvalidData(format!(
            "occurred_at must fall in years {}..={}, got {}",
            MIN_YEAR,
            MAX_YEAR,
            occurred_at.year()
        )));
    }
    Ok(())
}

/// Partial update of an expense
///
/// Only the fields listed in [`ExpenseUpdate::ALLOWED_FIELDS`] can change.
/// `notes` and `receipt_reference` use a nested option so they can be cleared
/// (`Some(None)`) as well as set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseUpdate {
    pub amount: Option<f64>,
    pub category: Option<Category>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub notes: Option<Option<String>>,
    pub receipt_reference: Option<Option<String>>,
}

impl ExpenseUpdate {
    pub const ALLOWED_FIELDS: &'static [&'static str] = &[
        "amount",
        "category",
        "occurred_at",
        "notes",
        "receipt_reference",
    ];

    /// Build an update from a JSON object, rejecting keys outside the allowlist
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::InvalidData("Update must be a JSON object".into()))?;

        let mut update = Self::default();
        for (key, field) in object {
            match key.as_str() {
                "amount" => {
                    let amount = field
                        .as_f64()
                        .ok_or_else(|| Error::InvalidData("amount must be a number".into()))?;
                    update.amount = Some(amount);
                }
                "category" => {
                    let category = field
                        .as_str()
                        .ok_or_else(|| Error::InvalidData("category must be a string".into()))?
                        .parse::<Category>()
                        .map_err(Error::InvalidData)?;
                    update.category = Some(category);
                }
                "occurred_at" => {
                    let raw = field
                        .as_str()
                        .ok_or_else(|| Error::InvalidData("occurred_at must be a string".into()))?;
                    update.occurred_at = Some(parse_timestamp(raw)?);
                }
                "notes" => update.notes = Some(optional_string(key, field)?),
                "receipt_reference" => {
                    update.receipt_reference = Some(optional_string(key, field)?)
                }
                other => {
                    return Err(Error::InvalidData(format!(
                        "Field '{}' cannot be updated (allowed: {})",
                        other,
                        Self::ALLOWED_FIELDS.join(", ")
                    )))
                }
            }
        }
        Ok(update)
    }

    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.category.is_none()
            && self.occurred_at.is_none()
            && self.notes.is_none()
            && self.receipt_reference.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        if let Some(occurred_at) = &self.occurred_at {
            validate_occurred_at(occurred_at)?;
        }
        Ok(())
    }

    /// Apply the update to a record in place
    pub fn apply(&self, expense: &mut Expense) {
        if let Some(amount) = self.amount {
            expense.amount = amount;
        }
        if let Some(category) = self.category {
            expense.category = category;
        }
        if let Some(occurred_at) = self.occurred_at {
            expense.occurred_at = occurred_at;
        }
        if let Some(notes) = &self.notes {
            expense.notes = notes.clone();
        }
        if let Some(reference) = &self.receipt_reference {
            expense.receipt_reference = reference.clone();
        }
    }
}

fn optional_string(key: &str, value: &serde_json::Value) -> Result<Option<String>> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s.clone())),
        _ => Err(Error::InvalidData(format!(
            "{} must be a string or null",
            key
        ))),
    }
}

/// Parse a timestamp given as `YYYY-MM-DD` (midnight UTC) or RFC 3339
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(start_of_day(date));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            Error::InvalidData(format!(
                "Invalid date '{}' (use YYYY-MM-DD or RFC 3339)",
                raw
            ))
        })
}

pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// Earliest year a stored timestamp or window bound may fall in
pub const MIN_YEAR: i32 = 1;

/// Latest year a stored timestamp or window may cover
///
/// Timestamps are compared as `YYYY-MM-DD HH:MM:SS` text, which stops sorting
/// correctly once a bound needs a fifth year digit.
pub const MAX_YEAR: i32 = 9998;

fn check_year(year: i32) -> Result<()> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(Error::InvalidWindow(format!(
            "year {} is outside {}..={}",
            year, MIN_YEAR, MAX_YEAR
        )));
    }
    Ok(())
}

/// Half-open time interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end <= start {
            return Err(Error::InvalidWindow(format!(
                "window end {} must be after start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// `[first day of month, first day of next month)`
    pub fn month(year: i32, month: u32) -> Result<Self> {
        check_year(year)?;
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::InvalidWindow(format!("invalid month {}-{}", year, month)))?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .ok_or_else(|| Error::InvalidWindow(format!("invalid month {}-{}", year, month)))?;
        Self::new(start_of_day(start), start_of_day(end))
    }

    /// `[Jan 1, Jan 1 of next year)`
    pub fn year(year: i32) -> Result<Self> {
        check_year(year)?;
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| Error::InvalidWindow(format!("invalid year {}", year)))?;
        let end = NaiveDate::from_ymd_opt(year + 1, 1, 1)
            .ok_or_else(|| Error::InvalidWindow(format!("invalid year {}", year)))?;
        Self::new(start_of_day(start), start_of_day(end))
    }

    /// Window covering whole days from `from` through `to` inclusive
    pub fn days(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        check_year(from.year())?;
        check_year(to.year())?;
        let end = to
            .succ_opt()
            .ok_or_else(|| Error::InvalidWindow(format!("invalid end date {}", to)))?;
        Self::new(start_of_day(from), start_of_day(end))
    }

    /// Whole-day window with optional bounds; `None` when both are missing
    ///
    /// Open bounds extend to the first and last storable days.
    pub fn between(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Option<Self>> {
        if from.is_none() && to.is_none() {
            return Ok(None);
        }
        let earliest = NaiveDate::from_ymd_opt(MIN_YEAR, 1, 1).unwrap_or(NaiveDate::MIN);
        let latest = NaiveDate::from_ymd_opt(MAX_YEAR, 12, 31).unwrap_or(NaiveDate::MAX);
        Self::days(from.unwrap_or(earliest), to.unwrap_or(latest)).map(Some)
    }

    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        *ts >= self.start && *ts < self.end
    }
}

/// Ordering of ledger results by occurrence date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

// ============================================================================
// Report types
// ============================================================================

/// Per-category aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: Category,
    pub total: f64,
    pub count: i64,
    /// total / count, 0 when count is 0
    pub average: f64,
}

/// Category totals for one calendar month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub categories: Vec<CategorySummary>,
    pub grand_total: f64,
}

/// Category totals for an arbitrary window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSummary {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub categories: Vec<CategorySummary>,
    pub grand_total: f64,
}

/// Spending in one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub year: i32,
    pub month: u32,
    pub total: f64,
    pub count: i64,
}

impl MonthlyBucket {
    /// `YYYY-MM`
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Month-by-month totals for one year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearlySummary {
    pub year: i32,
    /// Only months with at least one expense, in calendar order
    pub months: Vec<MonthlyBucket>,
    pub grand_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: Category,
    pub count: i64,
    pub total: f64,
}

/// Descriptive statistics over an owner's whole ledger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverallStatistics {
    pub count: i64,
    pub total: f64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub category_breakdown: Vec<CategoryBreakdown>,
}

/// Trajectory of a category's monthly spending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
    NoData,
    Error,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
            Self::InsufficientData => "insufficient_data",
            Self::NoData => "no_data",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendResult {
    pub category: Category,
    pub trend: Trend,
    /// Bucket totals in chronological order
    pub monthly_totals: Vec<f64>,
    pub months: Vec<MonthlyBucket>,
    pub total_spent: f64,
    pub months_analyzed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResult {
    pub category: Category,
    pub predicted_overspend: f64,
    pub confidence: f64,
    pub data_points: usize,
    pub predicted_amount: f64,
    pub recent_average: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ForecastResult {
    /// Zero prediction with an explanatory message (not an error)
    pub fn insufficient(category: Category, data_points: usize) -> Self {
        Self {
            category,
            predicted_overspend: 0.0,
            confidence: 0.0,
            data_points,
            predicted_amount: 0.0,
            recent_average: 0.0,
            message: Some("Insufficient historical data".to_string()),
            error: None,
        }
    }

    /// Zero prediction carrying a diagnostic
    pub fn failed(category: Category, error: &str) -> Self {
        Self {
            category,
            predicted_overspend: 0.0,
            confidence: 0.0,
            data_points: 0,
            predicted_amount: 0.0,
            recent_average: 0.0,
            message: None,
            error: Some(error.to_string()),
        }
    }
}

/// Calendar (year, month) of a timestamp
pub(crate) fn year_month(ts: &DateTime<Utc>) -> (i32, u32) {
    (ts.year(), ts.month())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_round_trip_names() {
        for cat in Category::all() {
            assert_eq!(cat.as_str().parse::<Category>().unwrap(), *cat);
        }
        assert_eq!("  FOOD ".parse::<Category>().unwrap(), Category::Food);
        assert!("groceries".parse::<Category>().is_err());
    }

    #[test]
    fn test_month_window_december_rolls_year() {
        let window = TimeWindow::month(2024, 12).unwrap();
        assert_eq!(window.start.to_rfc3339(), "2024-12-01T00:00:00+00:00");
        assert_eq!(window.end.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_invalid_windows_rejected() {
        assert!(matches!(
            TimeWindow::month(2024, 13),
            Err(Error::InvalidWindow(_))
        ));
        assert!(matches!(
            TimeWindow::month(2024, 0),
            Err(Error::InvalidWindow(_))
        ));
        let now = Utc::now();
        assert!(matches!(
            TimeWindow::new(now, now),
            Err(Error::InvalidWindow(_))
        ));
    }

    #[test]
    fn test_window_is_half_open() {
        let window = TimeWindow::month(2024, 3).unwrap();
        assert!(window.contains(&window.start));
        assert!(!window.contains(&window.end));
    }

    #[test]
    fn test_between_open_bounds() {
        assert!(TimeWindow::between(None, None).unwrap().is_none());

        let from = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let window = TimeWindow::between(Some(from), None).unwrap().unwrap();
        assert_eq!(window.start, start_of_day(from));
        assert_eq!(window.end.format("%Y").to_string(), "9999");

        let to = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let window = TimeWindow::between(None, Some(to)).unwrap().unwrap();
        assert!(window.contains(&parse_timestamp("2024-03-31T23:59:59Z").unwrap()));
        assert!(!window.contains(&parse_timestamp("2024-04-01").unwrap()));

        assert!(matches!(
            TimeWindow::between(Some(to), Some(from)),
            Err(Error::InvalidWindow(_))
        ));
    }

    #[test]
    fn test_windows_limited_to_storable_years() {
        assert!(matches!(TimeWindow::year(9999), Err(Error::InvalidWindow(_))));
        assert!(matches!(TimeWindow::month(9999, 3), Err(Error::InvalidWindow(_))));
        assert!(matches!(TimeWindow::year(0), Err(Error::InvalidWindow(_))));

        // The last storable year still ends on a four-digit date
        let window = TimeWindow::month(MAX_YEAR, 12).unwrap();
        assert_eq!(window.end.format("%Y-%m-%d").to_string(), "9999-01-01");

        let far = NaiveDate::from_ymd_opt(9999, 6, 1).unwrap();
        assert!(matches!(
            TimeWindow::between(None, Some(far)),
            Err(Error::InvalidWindow(_))
        ));
    }

    #[test]
    fn test_occurred_at_limited_to_storable_years() {
        let far = parse_timestamp("9999-03-05").unwrap();
        let expense = NewExpense::new(42.0, Category::Food, far);
        assert!(matches!(expense.validate(), Err(Error::InvalidData(_))));

        let update = ExpenseUpdate::from_json(&json!({"occurred_at": "9999-03-05"})).unwrap();
        assert!(matches!(update.validate(), Err(Error::InvalidData(_))));

        let last = parse_timestamp("9998-12-31T23:59:59Z").unwrap();
        assert!(NewExpense::new(42.0, Category::Food, last).validate().is_ok());
    }

    #[test]
    fn test_update_from_json_allowlist() {
        let update = ExpenseUpdate::from_json(&json!({
            "amount": 12.5,
            "category": "travel",
            "notes": null
        }))
        .unwrap();
        assert_eq!(update.amount, Some(12.5));
        assert_eq!(update.category, Some(Category::Travel));
        assert_eq!(update.notes, Some(None));
        assert!(update.receipt_reference.is_none());

        for forbidden in ["id", "owner_id", "created_at", "bogus"] {
            let err = ExpenseUpdate::from_json(&json!({ forbidden: 1 })).unwrap_err();
            assert!(err.to_string().contains("cannot be updated"));
        }
    }

    #[test]
    fn test_update_apply() {
        let ts = parse_timestamp("2024-03-05").unwrap();
        let mut expense = Expense {
            id: 1,
            owner_id: 7,
            amount: 10.0,
            category: Category::Food,
            occurred_at: ts,
            notes: Some("lunch".into()),
            receipt_reference: None,
            created_at: ts,
        };
        let update = ExpenseUpdate {
            amount: Some(20.0),
            notes: Some(None),
            ..Default::default()
        };
        update.apply(&mut expense);
        assert_eq!(expense.amount, 20.0);
        assert_eq!(expense.notes, None);
        assert_eq!(expense.owner_id, 7);
        assert_eq!(expense.category, Category::Food);
    }

    #[test]
    fn test_negative_amount_rejected() {
        let expense = NewExpense::new(-1.0, Category::Food, Utc::now());
        assert!(expense.validate().is_err());
        let update = ExpenseUpdate {
            amount: Some(f64::NAN),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let a = parse_timestamp("2024-03-05").unwrap();
        let b = parse_timestamp("2024-03-05T00:00:00Z").unwrap();
        assert_eq!(a, b);
        assert!(parse_timestamp("05/03/2024").is_err());
    }

    #[test]
    fn test_bucket_key() {
        let bucket = MonthlyBucket {
            year: 2024,
            month: 3,
            total: 1.0,
            count: 1,
        };
        assert_eq!(bucket.key(), "2024-03");
    }
}
