//! Spending page HTTP handlers and view rendering.
//!
//! This module contains:
//! - Route handlers for displaying the spending page and re-rendering it when
//!   the filter controls change
//! - HTML view functions for the filter controls and chart content
//! - State and form types used by the handlers

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use std::sync::{Arc, Mutex, RwLock};
use time::{
    Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::{
    AppState, Error,
    category::{Category, get_all_categories},
    currency::{Currency, ExchangeRates},
    endpoints,
    expense::{Expense, get_all_expenses},
    html::{HeadElement, base, link},
    navigation::NavBar,
    spending::{
        aggregation::{group_by_category, group_by_category_by_day, group_by_category_by_week},
        charts::{
            SpendingChart, category_pie_chart, chart_script, chart_view, spending_bar_chart,
        },
        filters::{
            CategorySelection, DateRange, FilterState, GroupBy, distinct_categories,
            filter_expenses,
        },
        tables::category_summary_table,
    },
    timezone::get_local_offset,
};

const FORM_LABEL_STYLE: &str = "block mb-1 text-xs font-medium text-gray-900 dark:text-white";
const FORM_INPUT_STYLE: &str = "block p-2.5 rounded text-sm \
    text-gray-900 dark:text-white bg-gray-50 \
    dark:bg-gray-700 border border-gray-300 dark:border-gray-600 \
    focus:ring-blue-600 focus:border-blue-600";

/// The state needed for displaying the spending page.
#[derive(Debug, Clone)]
pub struct SpendingState {
    /// The database connection for reading expenses and categories.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "America/Argentina/Buenos_Aires".
    pub local_timezone: String,
    /// The exchange rates used to convert expense amounts for display.
    pub exchange_rates: Arc<RwLock<ExchangeRates>>,
}

impl FromRef<AppState> for SpendingState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            exchange_rates: state.exchange_rates.clone(),
        }
    }
}

const DATE_INPUT_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Form data for the spending filter controls.
///
/// Category IDs arrive as strings from the selector ("all" or an ID); they
/// are coerced to [CategorySelection] here and nowhere else.
#[derive(Debug, Deserialize)]
pub struct FilterForm {
    /// Start of the date range; empty when the picker is cleared.
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub from: Option<Date>,
    /// End of the date range; empty when the picker is cleared.
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub to: Option<Date>,
    /// The category selector value: "all" or a category ID.
    pub category: String,
    /// The display currency.
    pub currency: Currency,
    /// The group-by mode.
    pub grouped_by: GroupBy,
}

impl FilterForm {
    fn into_filter_state(self) -> FilterState {
        FilterState {
            date_range: DateRange {
                from: self.from,
                to: self.to,
            },
            grouped_by: self.grouped_by,
            category: CategorySelection::parse(&self.category),
            currency: self.currency,
        }
    }
}

fn empty_date_as_none<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;

    match value.as_deref() {
        None | Some("") => Ok(None),
        Some(text) => Date::parse(text, DATE_INPUT_FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Display the interactive spending chart page.
pub async fn get_spending_page(State(state): State<SpendingState>) -> Result<Response, Error> {
    let (categories, expenses) = load_spending_data(&state)?;

    let nav_bar = NavBar::new(endpoints::SPENDING_VIEW);

    if expenses.is_empty() {
        return Ok(spending_no_data_view(nav_bar).into_response());
    }

    let today = local_today(&state.local_timezone)?;
    let filter_state = FilterState::default_for(today);
    let content = spending_content(&expenses, &filter_state, read_rates(&state), today);

    Ok(spending_page_view(nav_bar, &categories, &filter_state, content).into_response())
}

/// htmx endpoint: re-render the chart content with the submitted filters.
pub async fn update_spending_view(
    State(state): State<SpendingState>,
    Form(form): Form<FilterForm>,
) -> Response {
    let (_, expenses) = match load_spending_data(&state) {
        Ok(data) => data,
        Err(error) => return error.into_alert_response(),
    };

    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let filter_state = form.into_filter_state();

    spending_content(&expenses, &filter_state, read_rates(&state), today).into_response()
}

/// Load the categories and the full expense list from the database.
fn load_spending_data(state: &SpendingState) -> Result<(Vec<Category>, Vec<Expense>), Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;
    let expenses = get_all_expenses(&connection)
        .inspect_err(|error| tracing::error!("could not get expenses: {error}"))?;

    Ok((categories, expenses))
}

fn read_rates(state: &SpendingState) -> ExchangeRates {
    match state.exchange_rates.read() {
        Ok(guard) => *guard,
        Err(error) => {
            tracing::error!("could not lock exchange rates for reading: {error}");
            ExchangeRates::default()
        }
    }
}

/// Today's date in the configured timezone.
fn local_today(local_timezone_name: &str) -> Result<Date, Error> {
    let offset = get_local_offset(local_timezone_name).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", local_timezone_name);
        Error::InvalidTimezoneError(local_timezone_name.to_owned())
    })?;

    Ok(OffsetDateTime::now_utc().to_offset(offset).date())
}

/// Project the expense list through the filter pipeline into chart content.
///
/// Total mode renders the pie chart with its legend table; day/week mode
/// renders the stacked bar chart. Each render recomputes from scratch.
fn spending_content(
    expenses: &[Expense],
    filter_state: &FilterState,
    rates: ExchangeRates,
    today: Date,
) -> Markup {
    let filtered = filter_expenses(expenses, filter_state.date_range, filter_state.category);

    match filter_state.grouped_by {
        GroupBy::Total => {
            let insights = group_by_category(&filtered, filter_state.currency, &rates);
            let chart = SpendingChart {
                id: "category-pie-chart",
                options: category_pie_chart(&insights).to_string(),
            };

            html!(
                div class="flex flex-col xl:flex-row gap-4 w-full" {
                    (chart_view(&chart))
                    (category_summary_table(&insights))
                }
                (chart_script(&chart))
            )
        }
        grouped_by => {
            // Series cover every category in the full list so colors stay
            // stable when the filter hides one.
            let categories = distinct_categories(expenses);
            let buckets = if grouped_by == GroupBy::Day {
                group_by_category_by_day(&filtered)
            } else {
                group_by_category_by_week(&filtered)
            };
            let chart = SpendingChart {
                id: "spending-bar-chart",
                options: spending_bar_chart(&categories, &buckets, grouped_by, today).to_string(),
            };

            html!(
                (chart_view(&chart))
                (chart_script(&chart))
            )
        }
    }
}

/// Renders the filter controls: date range inputs and the category, currency
/// and group-by selectors. Any change re-renders the chart content via htmx.
fn filter_controls(categories: &[Category], filter_state: &FilterState) -> Markup {
    html!(
        form
            hx-post=(endpoints::SPENDING_FILTERS)
            hx-target="#spending-content"
            hx-swap="innerHTML"
            hx-trigger="change"
            class="flex flex-wrap items-end gap-2 w-full mb-4"
        {
            div {
                label for="from" class=(FORM_LABEL_STYLE) { "From" }
                input
                    type="date"
                    id="from"
                    name="from"
                    value=[filter_state.date_range.from]
                    class=(FORM_INPUT_STYLE);
            }

            div {
                label for="to" class=(FORM_LABEL_STYLE) { "To" }
                input
                    type="date"
                    id="to"
                    name="to"
                    value=[filter_state.date_range.to]
                    class=(FORM_INPUT_STYLE);
            }

            div {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                select id="category" name="category" class=(FORM_INPUT_STYLE) {
                    option
                        value="all"
                        selected[filter_state.category == CategorySelection::All]
                    {
                        "All"
                    }

                    @for category in categories {
                        option
                            value=(category.id)
                            selected[filter_state.category == CategorySelection::Single(category.id)]
                        {
                            (category.name)
                        }
                    }
                }
            }

            div {
                label for="currency" class=(FORM_LABEL_STYLE) { "Currency" }
                select id="currency" name="currency" class=(FORM_INPUT_STYLE) {
                    @for currency in [Currency::Ars, Currency::Usd] {
                        option
                            value=(currency.code())
                            selected[filter_state.currency == currency]
                        {
                            (currency.code())
                        }
                    }
                }
            }

            div {
                label for="grouped_by" class=(FORM_LABEL_STYLE) { "Group by" }
                select id="grouped_by" name="grouped_by" class=(FORM_INPUT_STYLE) {
                    @for mode in [GroupBy::Day, GroupBy::Week, GroupBy::Total] {
                        option
                            value=(mode.as_query_value())
                            selected[filter_state.grouped_by == mode]
                        {
                            (mode.label())
                        }
                    }
                }
            }
        }
    )
}

/// Renders the spending page when no expenses have been recorded.
fn spending_no_data_view(nav_bar: NavBar) -> Markup {
    let nav_bar = nav_bar.into_html();
    let expenses_link = link(endpoints::EXPENSES_VIEW, "expenses page");

    let content = html!(
        (nav_bar)

        div class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Charts will show up here once you record some expenses.
                You can review recorded expenses on the " (expenses_link) "."
            }
        }
    );

    base("Spending", &[], &content)
}

/// Renders the main spending page with filter controls and chart content.
fn spending_page_view(
    nav_bar: NavBar<'_>,
    categories: &[Category],
    filter_state: &FilterState,
    content: Markup,
) -> Markup {
    let nav_bar = nav_bar.into_html();

    let page_content = html!(
        (nav_bar)

        div
            id="spending"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            (filter_controls(categories, filter_state))

            div id="spending-content" class="w-full"
            {
                (content)
            }
        }
    );

    let scripts = [HeadElement::ScriptLink(
        "/static/echarts.6.0.0.min.js".to_owned(),
    )];

    base("Spending", &scripts, &page_content)
}

#[cfg(test)]
mod tests {
    use axum::{
        Form,
        body::Body,
        extract::State,
        http::{Response, StatusCode},
    };
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use std::sync::{Arc, Mutex, RwLock};
    use time::{Duration, OffsetDateTime};

    use crate::{
        category::{create_category, create_category_with_id, GENERAL_CATEGORY_ID},
        currency::{Currency, ExchangeRates},
        db::initialize,
        expense::create_expense,
        spending::handlers::{FilterForm, SpendingState, update_spending_view},
    };

    use super::get_spending_page;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn get_test_state(conn: Connection) -> SpendingState {
        SpendingState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
            exchange_rates: Arc::new(RwLock::new(ExchangeRates::default())),
        }
    }

    fn seed_expenses(conn: &Connection) {
        let today = OffsetDateTime::now_utc().date();
        let food = create_category("Food", conn).unwrap();
        let transport = create_category("Transport", conn).unwrap();

        create_expense(1250.0, Currency::Ars, today, food.id, conn).unwrap();
        create_expense(8.5, Currency::Usd, today - Duration::days(2), transport.id, conn).unwrap();
        create_expense(300.0, Currency::Ars, today - Duration::days(4), food.id, conn).unwrap();
    }

    #[tokio::test]
    async fn spending_page_loads_successfully() {
        let conn = get_test_connection();
        seed_expenses(&conn);
        let state = get_test_state(conn);

        let response = get_spending_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html(response).await;
        assert_valid_html(&html);

        // Default state groups by day, so the bar chart container is present.
        assert_element_exists(&html, "#spending-bar-chart");
        assert_element_exists(&html, "form[hx-post='/spending/filters']");
        assert_element_exists(&html, "input[type='date'][name='from']");
        assert_element_exists(&html, "input[type='date'][name='to']");
        assert_element_exists(&html, "select[name='category']");
        assert_element_exists(&html, "select[name='currency']");
        assert_element_exists(&html, "select[name='grouped_by']");
    }

    #[tokio::test]
    async fn category_selector_offers_all_and_every_category() {
        let conn = get_test_connection();
        seed_expenses(&conn);
        // The reserved category stays individually selectable even though it
        // is excluded from the "all" aggregate.
        create_category_with_id(GENERAL_CATEGORY_ID, "General", &conn).unwrap();
        let state = get_test_state(conn);

        let response = get_spending_page(State(state)).await.unwrap();
        let html = parse_html(response).await;

        let selector = Selector::parse("select[name='category'] option").unwrap();
        let values: Vec<String> = html
            .select(&selector)
            .map(|option| option.attr("value").unwrap_or_default().to_owned())
            .collect();

        assert!(values.contains(&"all".to_owned()), "Got options: {values:?}");
        assert!(
            values.contains(&GENERAL_CATEGORY_ID.to_string()),
            "Got options: {values:?}"
        );
        assert_eq!(values.len(), 4, "Got options: {values:?}");
    }

    #[tokio::test]
    async fn displays_prompt_text_on_no_data() {
        let conn = get_test_connection();
        let state = get_test_state(conn);

        let response = get_spending_page(State(state)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html(response).await;
        assert_valid_html(&html);

        let form_selector = Selector::parse("form").unwrap();
        assert!(
            html.select(&form_selector).next().is_none(),
            "Filter controls should be hidden when there is no data"
        );
        assert!(html.html().contains("Nothing here yet"));
    }

    #[tokio::test]
    async fn update_renders_pie_chart_and_table_in_total_mode() {
        let conn = get_test_connection();
        seed_expenses(&conn);
        let state = get_test_state(conn);

        let form = FilterForm {
            from: None,
            to: None,
            category: "all".to_owned(),
            currency: Currency::Usd,
            grouped_by: crate::spending::filters::GroupBy::Total,
        };

        let response = update_spending_view(State(state), Form(form)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html(response).await;
        assert_element_exists(&html, "#category-pie-chart");
        assert_element_exists(&html, "table");
        assert!(html.html().contains("Food"));
        assert!(html.html().contains("Total"));
    }

    #[tokio::test]
    async fn update_renders_bar_chart_in_week_mode() {
        let conn = get_test_connection();
        seed_expenses(&conn);
        let state = get_test_state(conn);

        let form = FilterForm {
            from: None,
            to: None,
            category: "all".to_owned(),
            currency: Currency::Ars,
            grouped_by: crate::spending::filters::GroupBy::Week,
        };

        let response = update_spending_view(State(state), Form(form)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html(response).await;
        assert_element_exists(&html, "#spending-bar-chart");
        assert!(html.html().contains("This week"));
    }

    #[test]
    fn filter_form_parses_filled_and_empty_dates() {
        let form: FilterForm = serde_html_form::from_str(
            "from=2025-03-01&to=2025-03-07&category=all&currency=USD&grouped_by=day",
        )
        .unwrap();
        assert_eq!(form.from, Some(time::macros::date!(2025 - 03 - 01)));
        assert_eq!(form.to, Some(time::macros::date!(2025 - 03 - 07)));
        assert_eq!(form.category, "all");
        assert_eq!(form.currency, Currency::Usd);

        // Cleared date inputs submit empty strings.
        let form: FilterForm =
            serde_html_form::from_str("from=&to=&category=18&currency=ARS&grouped_by=total")
                .unwrap();
        assert_eq!(form.from, None);
        assert_eq!(form.to, None);
        assert_eq!(form.category, "18");
        assert_eq!(form.currency, Currency::Ars);
    }

    async fn parse_html(response: Response<Body>) -> Html {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();

        Html::parse_document(&text)
    }

    #[track_caller]
    fn assert_valid_html(html: &Html) {
        assert!(
            html.errors.is_empty(),
            "Got HTML parsing errors: {:?}",
            html.errors
        );
    }

    #[track_caller]
    fn assert_element_exists(html: &Html, css_selector: &str) {
        let selector = Selector::parse(css_selector).unwrap();
        assert!(
            html.select(&selector).next().is_some(),
            "No element matching '{}' in {}",
            css_selector,
            html.html()
        );
    }
}
