//! Chart generation and rendering for the spending view.
//!
//! This module creates the ECharts visualizations for the spending page:
//! - **Category pie chart**: a donut of category totals over the whole range
//! - **Spending bar chart**: stacked bars of category totals per day or week
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with a corresponding HTML container and JavaScript initialization
//! code.

use std::collections::BTreeMap;

use charming::{
    Chart,
    component::{Axis, Grid},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Color, Emphasis, EmphasisFocus,
        ItemStyle, JsFunction, Tooltip, Trigger,
    },
    series::{Pie, bar},
};
use maud::{Markup, PreEscaped, html};
use time::Date;

use crate::{category::Category, database_id::CategoryId};

use super::{
    aggregation::{CategoryInsight, bar_chart_series, bucket_label},
    filters::GroupBy,
};

/// The fixed categorical palette for slices, segments and badges.
pub(super) const COLORS: [&str; 9] = [
    "#fd7f6f", "#7eb0d5", "#b2e061", "#bd7ebe", "#ffb55a", "#ffee65", "#beb9db", "#fdcce5",
    "#8bd3c7",
];

/// The color for a category, assigned cyclically by ID.
///
/// Deliberately lossy: categories nine IDs apart share a color.
pub(super) fn category_color(id: CategoryId) -> &'static str {
    COLORS[id.rem_euclid(COLORS.len() as i64) as usize]
}

/// A spending chart with its HTML container ID and ECharts configuration.
pub(super) struct SpendingChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML container for a spending chart.
pub(super) fn chart_view(chart: &SpendingChart) -> Markup {
    html!(
        div
            id=(chart.id)
            class="min-h-[380px] w-full rounded dark:bg-gray-100"
        {}
    )
}

/// Generates JavaScript initialization code for a spending chart.
///
/// The script is inlined next to the chart container rather than in the page
/// head so that htmx content swaps re-initialize the chart.
pub(super) fn chart_script(chart: &SpendingChart) -> Markup {
    let script = format!(
        r#"(function() {{
            const chartDom = document.getElementById("{}");
            const chart = echarts.init(chartDom);
            const option = {};
            chart.setOption(option);

            window.addEventListener('resize', chart.resize);

            const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
            const updateTheme = () => {{
                const isDarkMode = darkModeMediaQuery.matches;
                chart.setTheme(isDarkMode ? 'dark' : 'default');
            }}
            darkModeMediaQuery.addEventListener('change', updateTheme);
            updateTheme();
        }})();"#,
        chart.id, chart.options
    );

    html!( script { (PreEscaped(script)) } )
}

/// Builds the donut pie chart of category totals for total mode.
///
/// Slice angles are proportional to each category's converted total and slice
/// colors follow [category_color], matching the legend table badges and the
/// bar-chart segments.
pub(super) fn category_pie_chart(insights: &[CategoryInsight]) -> Chart {
    let palette: Vec<Color> = insights
        .iter()
        .map(|insight| Color::from(category_color(insight.id)))
        .collect();

    let data: Vec<(f64, &str)> = insights
        .iter()
        .map(|insight| (insight.total, insight.name.as_str()))
        .collect();

    Chart::new()
        .color(palette)
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .series(
            Pie::new()
                .name("Spending")
                .radius(vec!["80", "150"])
                .center(vec!["50%", "50%"])
                .data(data),
        )
}

/// Builds the stacked bar chart for day/week mode.
///
/// One bar per bucket in chronological order, one stacked segment per
/// category in the full expense list so segment colors stay stable across
/// filter changes.
pub(super) fn spending_bar_chart(
    categories: &[Category],
    buckets: &BTreeMap<Date, Vec<CategoryInsight>>,
    grouped_by: GroupBy,
    today: Date,
) -> Chart {
    let labels: Vec<String> = buckets
        .keys()
        .map(|bucket_start| bucket_label(*bucket_start, grouped_by, today))
        .collect();
    let series_data = bar_chart_series(categories, buckets);

    let mut chart = Chart::new()
        .tooltip(stacked_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .top(40)
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        );

    for (category, data) in series_data {
        chart = chart.series(
            bar::Bar::new()
                .name(category.name.clone())
                .stack("Spending")
                .item_style(ItemStyle::new().color(category_color(category.id)))
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(data),
        );
    }

    chart
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates the hover tooltip for the stacked bar chart.
///
/// Shows one row per series present in the hovered bucket (a badge in the
/// series color plus the formatted value) and a final row with the total of
/// the hovered values.
fn stacked_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
        .formatter(tooltip_formatter())
}

fn tooltip_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "params",
        r#"
        const currencyFormatter = new Intl.NumberFormat('en-US', {
            style: 'currency',
            currency: 'USD'
        });
        let total = 0;
        let rows = '';
        for (const item of params) {
            if (item.value == null) {
                continue;
            }
            total += item.value;
            rows += '<tr>'
                + '<td style="padding: 2px 8px 2px 0;">'
                + '<span style="display: inline-block; padding: 1px 8px;'
                + ' border-radius: 9999px; color: #111827;'
                + ' background-color: ' + item.color + ';">'
                + item.seriesName
                + '</span></td>'
                + '<td style="text-align: right;">'
                + currencyFormatter.format(item.value)
                + '</td></tr>';
        }
        return '<b>' + params[0].name + '</b>'
            + '<table>'
            + rows
            + '<tr><td style="padding: 2px 8px 2px 0;">Total</td>'
            + '<td style="text-align: right;">'
            + currencyFormatter.format(total)
            + '</td></tr>'
            + '</table>';
        "#,
    )
}
