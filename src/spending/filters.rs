//! Filter state and the pure filtering pipeline for the spending view.
//!
//! The four pieces of view state (date range, group-by mode, category
//! selection, display currency) live in an immutable [FilterState]; filtering
//! is a pure function of the expense list and that state, so it can be tested
//! without any rendering surface.

use serde::Deserialize;
use time::{Date, Duration};

use crate::{
    category::{Category, GENERAL_CATEGORY_ID},
    currency::Currency,
    database_id::CategoryId,
    expense::Expense,
};

/// How the spending chart buckets the filtered expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// Stacked bars, one per calendar day.
    Day,
    /// Stacked bars, one per Monday-start week.
    Week,
    /// A single pie chart over the whole range.
    Total,
}

impl GroupBy {
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Total => "total",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Day => "Day",
            Self::Week => "Week",
            Self::Total => "Total",
        }
    }
}

/// The category filter: everything (minus the reserved "General" category) or
/// a single category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategorySelection {
    /// Every category except [GENERAL_CATEGORY_ID].
    All,
    /// Exactly one category.
    Single(CategoryId),
}

impl CategorySelection {
    /// Parse the category selector's form value.
    ///
    /// IDs are canonically `i64`; string coercion happens only here, at the
    /// selector boundary. A value that is neither "all" nor an integer falls
    /// back to [CategorySelection::All].
    pub fn parse(value: &str) -> Self {
        if value == "all" {
            Self::All
        } else {
            value.parse().map(Self::Single).unwrap_or(Self::All)
        }
    }

    fn keeps(self, category_id: CategoryId) -> bool {
        match self {
            Self::All => category_id != GENERAL_CATEGORY_ID,
            Self::Single(id) => category_id == id,
        }
    }
}

/// An optionally bounded date range.
///
/// The date filter only applies when both endpoints are present; a range with
/// either endpoint absent keeps every expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub from: Option<Date>,
    pub to: Option<Date>,
}

impl DateRange {
    fn contains(&self, date: Date) -> bool {
        match (self.from, self.to) {
            (Some(from), Some(to)) => from <= date && date <= to,
            _ => true,
        }
    }
}

/// The view state of the spending chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    pub date_range: DateRange,
    pub grouped_by: GroupBy,
    pub category: CategorySelection,
    pub currency: Currency,
}

impl FilterState {
    /// The state used on first page load: the 7 days ending today, grouped by
    /// day, all categories, USD.
    pub fn default_for(today: Date) -> Self {
        Self {
            date_range: DateRange {
                from: Some(today - Duration::days(7)),
                to: Some(today),
            },
            grouped_by: GroupBy::Day,
            category: CategorySelection::All,
            currency: Currency::Usd,
        }
    }
}

/// Filter `expenses` down to the selected date range and categories.
///
/// Applies the date filter (inclusive at both ends, disabled when either
/// endpoint is absent) followed by the category filter. Pure and
/// order-preserving: the output holds references to the kept expenses in
/// their original relative order.
pub(super) fn filter_expenses<'a>(
    expenses: &'a [Expense],
    date_range: DateRange,
    selection: CategorySelection,
) -> Vec<&'a Expense> {
    expenses
        .iter()
        .filter(|expense| date_range.contains(expense.date))
        .filter(|expense| selection.keeps(expense.category.id))
        .collect()
}

/// The distinct categories present in `expenses`, in order of first appearance.
///
/// Drives the stacked-bar series so that every category in the full expense
/// list gets a segment (and a stable color), whether or not the current
/// filter keeps any of its expenses.
pub(super) fn distinct_categories(expenses: &[Expense]) -> Vec<Category> {
    let mut categories: Vec<Category> = Vec::new();

    for expense in expenses {
        if !categories
            .iter()
            .any(|category| category.id == expense.category.id)
        {
            categories.push(expense.category.clone());
        }
    }

    categories
}
