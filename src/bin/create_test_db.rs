use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use ledgerline::{
    PasswordHash, ValidatedPassword,
    category::{CategoryName, NewCategory, create_category},
    initialize_db,
    transaction::{Transaction, TransactionType, create_transaction},
    user::create_user,
};

/// A utility for creating a test database for the ledgerline API server.
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

    println!("Creating test user 'test' with the password 'test'...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user("test", password_hash, &conn)?;

    println!("Creating categories...");

    let salary = create_category(
        NewCategory {
            name: CategoryName::new_unchecked("Salary"),
            description: Some("Monthly pay".to_owned()),
            category_type: TransactionType::Income,
        },
        user.id,
        &conn,
    )?;
    let groceries = create_category(
        NewCategory {
            name: CategoryName::new_unchecked("Groceries"),
            description: None,
            category_type: TransactionType::Expense,
        },
        user.id,
        &conn,
    )?;
    let rent = create_category(
        NewCategory {
            name: CategoryName::new_unchecked("Rent"),
            description: None,
            category_type: TransactionType::Expense,
        },
        user.id,
        &conn,
    )?;

    println!("Creating transactions...");

    let now = OffsetDateTime::now_utc();

    for months_ago in 0..3 {
        let month_start = now - Duration::days(30 * months_ago);

        create_transaction(
            Transaction::build(TransactionType::Income, 4200.0, month_start)
                .category_id(Some(salary.id))
                .description(Some("Pay day".to_owned())),
            user.id,
            &conn,
        )?;
        create_transaction(
            Transaction::build(TransactionType::Expense, 1800.0, month_start)
                .category_id(Some(rent.id))
                .description(Some("Rent".to_owned())),
            user.id,
            &conn,
        )?;

        for week in 0..4 {
            create_transaction(
                Transaction::build(
                    TransactionType::Expense,
                    120.0 + 15.0 * week as f64,
                    month_start - Duration::days(7 * week),
                )
                .category_id(Some(groceries.id))
                .description(Some("Supermarket".to_owned())),
                user.id,
                &conn,
            )?;
        }
    }

    create_transaction(
        Transaction::build(TransactionType::Expense, 9.5, now)
            .description(Some("Coffee".to_owned())),
        user.id,
        &conn,
    )?;

    println!("Success!");

    Ok(())
}
