//! Expense aggregation and transformation for the spending charts.
//!
//! Provides functions to total filtered expenses by category (with currency
//! conversion, for the pie chart and its table) and to bucket them by day or
//! week (for the stacked bar chart). Everything here is recomputed on every
//! render from the filtered expense list.

use std::collections::BTreeMap;

use time::{Date, Duration, Month};

use crate::{
    category::Category,
    currency::{Currency, ExchangeRates},
    database_id::CategoryId,
    expense::Expense,
};

use super::filters::GroupBy;

/// A category's total over the current filtered set.
///
/// Derived data with no identity beyond its category ID within one
/// computation.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct CategoryInsight {
    pub(super) id: CategoryId,
    pub(super) name: String,
    pub(super) total: f64,
}

/// Sum expenses per category, converting each amount to `currency`.
///
/// # Returns
/// One insight per distinct category present in `expenses`, ascending by
/// category ID.
pub(super) fn group_by_category(
    expenses: &[&Expense],
    currency: Currency,
    rates: &ExchangeRates,
) -> Vec<CategoryInsight> {
    let mut totals: BTreeMap<CategoryId, CategoryInsight> = BTreeMap::new();

    for expense in expenses {
        let converted = rates.convert(expense.amount, expense.currency, currency);
        totals
            .entry(expense.category.id)
            .and_modify(|insight| insight.total += converted)
            .or_insert_with(|| CategoryInsight {
                id: expense.category.id,
                name: expense.category.name.clone(),
                total: converted,
            });
    }

    totals.into_values().collect()
}

/// Bucket expenses by calendar day.
///
/// Amounts are summed in their native currency. Iterating the result yields
/// buckets in ascending date order.
pub(super) fn group_by_category_by_day(
    expenses: &[&Expense],
) -> BTreeMap<Date, Vec<CategoryInsight>> {
    group_by_category_by(expenses, |date| date)
}

/// Bucket expenses by Monday-start week, keyed by the week's Monday.
pub(super) fn group_by_category_by_week(
    expenses: &[&Expense],
) -> BTreeMap<Date, Vec<CategoryInsight>> {
    group_by_category_by(expenses, week_start)
}

fn group_by_category_by(
    expenses: &[&Expense],
    bucket_of: impl Fn(Date) -> Date,
) -> BTreeMap<Date, Vec<CategoryInsight>> {
    let mut buckets: BTreeMap<Date, BTreeMap<CategoryId, CategoryInsight>> = BTreeMap::new();

    for expense in expenses {
        buckets
            .entry(bucket_of(expense.date))
            .or_default()
            .entry(expense.category.id)
            .and_modify(|insight| insight.total += expense.amount)
            .or_insert_with(|| CategoryInsight {
                id: expense.category.id,
                name: expense.category.name.clone(),
                total: expense.amount,
            });
    }

    buckets
        .into_iter()
        .map(|(date, by_category)| (date, by_category.into_values().collect()))
        .collect()
}

/// The Monday starting the week that contains `date`.
pub(super) fn week_start(date: Date) -> Date {
    let weekday_number = date.weekday().number_from_monday() as i64;

    date - Duration::days(weekday_number - 1)
}

/// The x-axis label for a bar-chart bucket.
///
/// The bucket containing `today` is called out as "Today" (day mode) or
/// "This week" (week mode); every other bucket shows its formatted start
/// date.
pub(super) fn bucket_label(bucket_start: Date, grouped_by: GroupBy, today: Date) -> String {
    match grouped_by {
        GroupBy::Day if bucket_start == today => "Today".to_owned(),
        GroupBy::Week if bucket_start == week_start(today) => "This week".to_owned(),
        _ => format_date_label(bucket_start),
    }
}

/// Project bucketed insights into stacked-bar series.
///
/// # Returns
/// One series per category in `categories` (order preserved), each with one
/// value slot per bucket in ascending date order and `None` where the
/// category spent nothing that bucket.
pub(super) fn bar_chart_series(
    categories: &[Category],
    buckets: &BTreeMap<Date, Vec<CategoryInsight>>,
) -> Vec<(Category, Vec<Option<f64>>)> {
    categories
        .iter()
        .map(|category| {
            let values = buckets
                .values()
                .map(|insights| {
                    insights
                        .iter()
                        .find(|insight| insight.id == category.id)
                        .map(|insight| insight.total)
                })
                .collect();

            (category.clone(), values)
        })
        .collect()
}

fn format_date_label(date: Date) -> String {
    format!(
        "{} {} {}",
        date.day(),
        month_abbrev(date.month()),
        date.year()
    )
}

fn month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}
