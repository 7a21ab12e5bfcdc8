//! Table views for the spending page.

use maud::{Markup, html};

use crate::html::{CATEGORY_BADGE_STYLE, TABLE_CELL_STYLE, TABLE_ROW_STYLE, format_currency};

use super::{aggregation::CategoryInsight, charts::category_color};

/// Renders the legend table shown beside the pie chart in total mode.
///
/// One row per category insight: a name badge in the category's chart color,
/// the converted total and the category's share of the grand total, followed
/// by a grand-total row. Percentages are rounded for display only and are not
/// redistributed to sum to exactly 100.
pub(super) fn category_summary_table(insights: &[CategoryInsight]) -> Markup {
    let sum: f64 = insights.iter().map(|insight| insight.total).sum();

    html! {
        div class="overflow-x-auto rounded-lg shadow self-center w-full max-w-md" {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400" {
                tbody {
                    @for insight in insights {
                        tr class=(TABLE_ROW_STYLE) {
                            td class=(TABLE_CELL_STYLE) {
                                span
                                    class=(CATEGORY_BADGE_STYLE)
                                    style=(format!("background-color: {}", category_color(insight.id)))
                                {
                                    (insight.name)
                                }
                            }
                            td class=(TABLE_CELL_STYLE) { (format_currency(insight.total)) }
                            td class=(TABLE_CELL_STYLE) { (percent_of(insight.total, sum)) "%" }
                        }
                    }

                    tr class=(TABLE_ROW_STYLE) {
                        td class={(TABLE_CELL_STYLE) " font-semibold"} { "Total" }
                        td class={(TABLE_CELL_STYLE) " font-semibold"} { (format_currency(sum)) }
                        td class=(TABLE_CELL_STYLE) {}
                    }
                }
            }
        }
    }
}

fn percent_of(value: f64, total: f64) -> i64 {
    if total == 0.0 {
        0
    } else {
        ((value / total) * 100.0).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use crate::spending::{aggregation::CategoryInsight, charts::category_color};

    use super::{category_summary_table, percent_of};

    fn insight(id: i64, name: &str, total: f64) -> CategoryInsight {
        CategoryInsight {
            id,
            name: name.to_owned(),
            total,
        }
    }

    #[test]
    fn percentages_sum_to_roughly_one_hundred() {
        let insights = vec![
            insight(1, "Food", 33.0),
            insight(2, "Transport", 33.0),
            insight(3, "Entertainment", 34.0),
        ];
        let sum: f64 = insights.iter().map(|insight| insight.total).sum();

        let total_percent: i64 = insights
            .iter()
            .map(|insight| percent_of(insight.total, sum))
            .sum();

        assert!(
            (99..=101).contains(&total_percent),
            "Percentages summed to {total_percent}"
        );
    }

    #[test]
    fn percent_of_guards_against_zero_total() {
        assert_eq!(percent_of(10.0, 0.0), 0);
    }

    #[test]
    fn table_shows_badges_totals_and_percentages() {
        let insights = vec![insight(1, "Food", 75.0), insight(2, "Transport", 25.0)];

        let markup = category_summary_table(&insights).into_string();

        assert!(markup.contains("Food"));
        assert!(markup.contains(category_color(1)));
        assert!(markup.contains("$75.00"));
        assert!(markup.contains("75%"));
        assert!(markup.contains("25%"));
        assert!(markup.contains("$100.00"));
    }

    #[test]
    fn empty_insights_render_a_zero_total() {
        let markup = category_summary_table(&[]).into_string();

        assert!(markup.contains("Total"));
        assert!(markup.contains("$0.00"));
    }
}
