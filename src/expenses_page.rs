//! The page listing all recorded expenses.

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::{
    AppState, Error, endpoints,
    expense::{Expense, get_all_expenses},
    html::{
        CATEGORY_BADGE_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency, link,
    },
    navigation::NavBar,
};

/// The state needed for displaying the expenses page.
#[derive(Debug, Clone)]
pub struct ExpensesState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpensesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display the table of all recorded expenses, newest first.
pub async fn get_expenses_page(State(state): State<ExpensesState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let expenses = get_all_expenses(&connection)
        .inspect_err(|error| tracing::error!("could not get expenses: {error}"))?;

    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW);

    Ok(expenses_view(nav_bar, &expenses).into_response())
}

fn expenses_view(nav_bar: NavBar<'_>, expenses: &[Expense]) -> Markup {
    let nav_bar = nav_bar.into_html();
    let spending_link = link(endpoints::SPENDING_VIEW, "spending page");

    let content = html!(
        (nav_bar)

        div
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            @if expenses.is_empty() {
                h2 class="text-xl font-bold" { "Nothing here yet..." }

                p
                {
                    "Recorded expenses will show up here. Their breakdown lives
                    on the " (spending_link) "."
                }
            } @else {
                div class="overflow-x-auto rounded-lg shadow w-full" {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400" {
                        thead class=(TABLE_HEADER_STYLE) {
                            tr {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                            }
                        }
                        tbody {
                            @for expense in expenses.iter().rev() {
                                tr class=(TABLE_ROW_STYLE) {
                                    td class=(TABLE_CELL_STYLE) { (expense.date) }
                                    td class=(TABLE_CELL_STYLE) {
                                        span
                                            class={(CATEGORY_BADGE_STYLE) " bg-blue-100 dark:bg-blue-900 dark:text-blue-300"}
                                        {
                                            (expense.category.name)
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE) {
                                        (format_currency(expense.amount)) " " (expense.currency.code())
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Expenses", &[], &content)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        extract::State,
        http::{Response, StatusCode},
    };
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use std::sync::{Arc, Mutex};
    use time::macros::date;

    use crate::{
        category::create_category, currency::Currency, db::initialize, expense::create_expense,
    };

    use super::{ExpensesState, get_expenses_page};

    fn get_test_state() -> (ExpensesState, Arc<Mutex<Connection>>) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        (
            ExpensesState {
                db_connection: conn.clone(),
            },
            conn,
        )
    }

    #[tokio::test]
    async fn expenses_page_lists_expenses_newest_first() {
        let (state, conn) = get_test_state();
        {
            let conn = conn.lock().unwrap();
            let food = create_category("Food", &conn).unwrap();
            create_expense(10.0, Currency::Usd, date!(2025 - 03 - 01), food.id, &conn).unwrap();
            create_expense(20.0, Currency::Ars, date!(2025 - 03 - 05), food.id, &conn).unwrap();
        }

        let response = get_expenses_page(State(state)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html(response).await;
        let row_selector = Selector::parse("tbody tr").unwrap();
        let rows: Vec<String> = html
            .select(&row_selector)
            .map(|row| row.html())
            .collect();

        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("2025-03-05"), "Got row: {}", rows[0]);
        assert!(rows[0].contains("ARS"), "Got row: {}", rows[0]);
        assert!(rows[1].contains("2025-03-01"), "Got row: {}", rows[1]);
    }

    #[tokio::test]
    async fn expenses_page_shows_prompt_when_empty() {
        let (state, _conn) = get_test_state();

        let response = get_expenses_page(State(state)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html(response).await;
        assert!(html.html().contains("Nothing here yet"));

        let table_selector = Selector::parse("table").unwrap();
        assert!(html.select(&table_selector).next().is_none());
    }

    async fn parse_html(response: Response<Body>) -> Html {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();

        Html::parse_document(&text)
    }
}
