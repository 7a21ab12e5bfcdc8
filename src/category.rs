//! Core data model and database queries for expense categories.

use rusqlite::{Connection, Row};

use crate::{Error, database_id::CategoryId};

/// The reserved ID of the "General" category.
///
/// Expenses in this category are excluded when the spending view's category
/// filter is set to "all", but the category remains individually selectable.
pub const GENERAL_CATEGORY_ID: CategoryId = 18;

/// A label that groups related expenses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name of the category.
    pub name: String,
}

/// Create a category and return it with its generated ID.
///
/// # Errors
/// Returns [Error::DuplicateCategoryName] if a category with `name` already
/// exists.
pub fn create_category(name: &str, connection: &Connection) -> Result<Category, Error> {
    connection
        .execute("INSERT INTO category (name) VALUES (?1);", (name,))
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateCategoryName(name.to_owned()),
            error => error.into(),
        })?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name: name.to_owned(),
    })
}

/// Create a category with a fixed ID.
///
/// Used for seeding databases where the reserved "General" category must land
/// at [GENERAL_CATEGORY_ID].
pub fn create_category_with_id(
    id: CategoryId,
    name: &str,
    connection: &Connection,
) -> Result<Category, Error> {
    connection.execute("INSERT INTO category (id, name) VALUES (?1, ?2);", (id, name))?;

    Ok(Category {
        id,
        name: name.to_owned(),
    })
}

/// Retrieve a single category by ID.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name FROM category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all categories ordered alphabetically by name.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name FROM category ORDER BY name ASC;")?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Initialize the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        CREATE INDEX IF NOT EXISTS idx_category_name ON category(name);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

#[cfg(test)]
mod category_query_tests {
    use rusqlite::Connection;

    use crate::Error;

    use super::{
        GENERAL_CATEGORY_ID, create_category, create_category_with_id, create_category_table,
        get_all_categories, get_category,
    };

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_category_table(&connection).expect("Could not create category table");
        connection
    }

    #[test]
    fn create_category_succeeds() {
        let connection = get_test_db_connection();

        let category = create_category("Food", &connection).unwrap();

        assert_eq!(category.name, "Food");
        assert_eq!(get_category(category.id, &connection).unwrap(), category);
    }

    #[test]
    fn create_category_with_id_lands_on_requested_id() {
        let connection = get_test_db_connection();

        let category =
            create_category_with_id(GENERAL_CATEGORY_ID, "General", &connection).unwrap();

        assert_eq!(category.id, GENERAL_CATEGORY_ID);
        assert_eq!(
            get_category(GENERAL_CATEGORY_ID, &connection).unwrap().name,
            "General"
        );
    }

    #[test]
    fn create_category_fails_on_duplicate_name() {
        let connection = get_test_db_connection();
        create_category("Food", &connection).unwrap();

        let result = create_category("Food", &connection);

        assert!(matches!(result, Err(Error::DuplicateCategoryName(_))));
    }

    #[test]
    fn get_category_fails_on_missing_id() {
        let connection = get_test_db_connection();

        assert_eq!(get_category(42, &connection), Err(Error::NotFound));
    }

    #[test]
    fn get_all_categories_orders_by_name() {
        let connection = get_test_db_connection();
        create_category("Transport", &connection).unwrap();
        create_category("Food", &connection).unwrap();

        let names: Vec<String> = get_all_categories(&connection)
            .unwrap()
            .into_iter()
            .map(|category| category.name)
            .collect();

        assert_eq!(names, vec!["Food", "Transport"]);
    }
}
