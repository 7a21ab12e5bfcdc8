//! Implements a struct that holds the shared state of the server.

use std::sync::{Arc, Mutex, RwLock};

use rusqlite::Connection;

use crate::{Error, currency::ExchangeRates, db::initialize};

/// The state shared by the server's request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The local timezone as a canonical timezone name, e.g. "America/Argentina/Buenos_Aires".
    pub local_timezone: String,

    /// The exchange rates used to convert expense amounts for display.
    ///
    /// Updated in the background by [crate::spawn_rate_refresh].
    pub exchange_rates: Arc<RwLock<ExchangeRates>>,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, local_timezone: &str) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            local_timezone: local_timezone.to_owned(),
            exchange_rates: Arc::new(RwLock::new(ExchangeRates::default())),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}
