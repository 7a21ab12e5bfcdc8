//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The ID of a row in the category table.
pub type CategoryId = DatabaseId;

/// The ID of a row in the expense table.
pub type ExpenseId = DatabaseId;
