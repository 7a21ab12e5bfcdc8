//! The API endpoints URIs.

/// The root route which redirects to the spending view.
pub const ROOT: &str = "/";
/// The page with the interactive spending chart.
pub const SPENDING_VIEW: &str = "/spending";
/// The htmx endpoint for re-rendering the spending view with new filters.
pub const SPENDING_FILTERS: &str = "/spending/filters";
/// The page listing all recorded expenses.
pub const EXPENSES_VIEW: &str = "/expenses";
/// The route for static files.
pub const STATIC: &str = "/static";
