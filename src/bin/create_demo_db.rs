use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use household_ledger::{
    AccountType, ContextType, NewAccount, NewContext, NewUser, PasswordHash, ValidatedPassword,
    create_account, create_context, create_user, initialize_db, seed_default_categories,
};

/// A utility for creating a demo database for the household_ledger server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "demo";

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating demo user...");
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(DEMO_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(
        NewUser {
            name: "Demo".to_owned(),
            email: DEMO_EMAIL.to_owned(),
            password_hash,
        },
        &conn,
    )?;

    println!("Creating personal context...");
    let context = create_context(
        NewContext {
            name: "Pessoal".to_owned(),
            context_type: ContextType::Personal,
            features: Default::default(),
        },
        user.id,
        &conn,
    )?;

    let categories = seed_default_categories(context.id, &conn)?;
    println!("Added {} categories", categories.len());

    create_account(
        NewAccount {
            context_id: context.id,
            name: "Carteira".to_owned(),
            account_type: AccountType::Cash,
            initial_balance: 0.0,
        },
        &conn,
    )?;

    println!(
        "Success! Log in as {DEMO_EMAIL} with the password \"{DEMO_PASSWORD}\", \
        and send the header x-user-id: {}",
        user.id
    );

    Ok(())
}
