//! Core data model and database queries for expenses.

use rusqlite::{Connection, Row};
use time::Date;

use crate::{
    Error,
    category::{Category, get_category},
    currency::Currency,
    database_id::{CategoryId, ExpenseId},
};

/// An amount of money spent at a point in time, tagged with a category.
///
/// Expenses are read-only once loaded; the spending view treats the full list
/// as an immutable input and filters it in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// How much money was spent, in the expense's native currency.
    pub amount: f64,
    /// The currency the expense was paid in.
    pub currency: Currency,
    /// When the money was spent.
    pub date: Date,
    /// The category the expense belongs to.
    pub category: Category,
}

/// Create a new expense in the database.
///
/// # Errors
/// Returns [Error::NotFound] if `category_id` does not refer to a category.
pub fn create_expense(
    amount: f64,
    currency: Currency,
    date: Date,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Expense, Error> {
    let category = get_category(category_id, connection)?;

    connection.execute(
        "INSERT INTO expense (amount, currency, date, category_id) VALUES (?1, ?2, ?3, ?4)",
        (amount, currency, date, category_id),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Expense {
        id,
        amount,
        currency,
        date,
        category,
    })
}

/// Retrieve all expenses joined with their categories, oldest first.
pub fn get_all_expenses(connection: &Connection) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT e.id, e.amount, e.currency, e.date, c.id, c.name
             FROM expense e
             INNER JOIN category c ON c.id = e.category_id
             ORDER BY e.date ASC, e.id ASC",
        )?
        .query_map([], map_row)?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Initialize the expense table and the index used by the spending view.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            amount REAL NOT NULL,
            currency TEXT NOT NULL,
            date TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_expense_date_category ON expense(date, category_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        amount: row.get(1)?,
        currency: row.get(2)?,
        date: row.get(3)?,
        category: Category {
            id: row.get(4)?,
            name: row.get(5)?,
        },
    })
}

#[cfg(test)]
mod expense_query_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        category::create_category,
        currency::Currency,
        db::initialize,
    };

    use super::{create_expense, get_all_expenses};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    #[test]
    fn create_expense_round_trips() {
        let connection = get_test_connection();
        let category = create_category("Food", &connection).unwrap();

        let created = create_expense(
            1234.5,
            Currency::Ars,
            date!(2025 - 06 - 03),
            category.id,
            &connection,
        )
        .unwrap();

        let expenses = get_all_expenses(&connection).unwrap();
        assert_eq!(expenses, vec![created]);
        assert_eq!(expenses[0].currency, Currency::Ars);
        assert_eq!(expenses[0].date, date!(2025 - 06 - 03));
        assert_eq!(expenses[0].category, category);
    }

    #[test]
    fn create_expense_fails_on_missing_category() {
        let connection = get_test_connection();

        let result = create_expense(
            10.0,
            Currency::Usd,
            date!(2025 - 06 - 03),
            42,
            &connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_all_expenses_orders_by_date_ascending() {
        let connection = get_test_connection();
        let category = create_category("Food", &connection).unwrap();

        create_expense(
            2.0,
            Currency::Usd,
            date!(2025 - 06 - 05),
            category.id,
            &connection,
        )
        .unwrap();
        create_expense(
            1.0,
            Currency::Usd,
            date!(2025 - 06 - 01),
            category.id,
            &connection,
        )
        .unwrap();

        let dates: Vec<_> = get_all_expenses(&connection)
            .unwrap()
            .into_iter()
            .map(|expense| expense.date)
            .collect();

        assert_eq!(dates, vec![date!(2025 - 06 - 01), date!(2025 - 06 - 05)]);
    }

    #[test]
    fn get_all_expenses_returns_empty_vec_for_empty_table() {
        let connection = get_test_connection();

        assert_eq!(get_all_expenses(&connection).unwrap(), Vec::new());
    }
}
