use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use expendio_rs::{
    Currency, GENERAL_CATEGORY_ID, create_category, create_category_with_id, create_expense,
    initialize_db,
};

/// A utility for creating a test database for the REST API server of expendio_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test categories and expenses...");

    let categories = [
        create_category("Food", &conn)?,
        create_category("Groceries", &conn)?,
        create_category("Transport", &conn)?,
        create_category("Entertainment", &conn)?,
        create_category("Services", &conn)?,
    ];
    let general = create_category_with_id(GENERAL_CATEGORY_ID, "General", &conn)?;

    let today = OffsetDateTime::now_utc().date();
    let peso_amounts = [1500.0, 2300.0, 800.0, 4750.0, 1200.0, 3100.0, 950.0];

    for day_offset in 0..28i64 {
        let date = today - Duration::days(day_offset);
        let category = &categories[(day_offset % 5) as usize];
        let amount = peso_amounts[(day_offset % 7) as usize];
        create_expense(amount, Currency::Ars, date, category.id, &conn)?;

        if day_offset % 3 == 0 {
            let category = &categories[((day_offset + 2) % 5) as usize];
            create_expense(
                5.0 + day_offset as f64,
                Currency::Usd,
                date,
                category.id,
                &conn,
            )?;
        }
    }

    // A couple of entries in the reserved category, which the spending view
    // hides from the "all" aggregate.
    create_expense(
        2000.0,
        Currency::Ars,
        today - Duration::days(1),
        general.id,
        &conn,
    )?;
    create_expense(
        12.0,
        Currency::Usd,
        today - Duration::days(10),
        general.id,
        &conn,
    )?;

    println!("Success!");

    Ok(())
}
