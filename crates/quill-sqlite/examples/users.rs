//! A small tour: typed table, inserts, a failed transaction and nested
//! savepoints, with engine activity logged through `tracing`.
//!
//! Run with `cargo run -p quill-sqlite --example users`.

use anyhow::Result;
use quill_core::query::Conflict;
use quill_derive::Table;
use quill_sqlite::{Connection, TransactionMode};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[allow(dead_code)]
#[derive(Debug, Table)]
#[table(name = "users")]
struct User {
    #[column(autoincrement)]
    id: i64,
    #[column(unique)]
    email: String,
    age: Option<i64>,
    #[column(default = false)]
    admin: bool,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let db = Connection::open_in_memory()?;
    db.set_trace(|sql| println!("-- {sql}"));
    db.run(&UserTable::create_table().build()?, ())?;

    let users = UserTable::query();
    for (email, age) in [("alice@example.com", Some(31)), ("betsy@example.com", None)] {
        let values = [UserTable::email().set(email), UserTable::age().set(age)];
        db.run_expression(&users.insert(&values))?;
        info!(id = ?db.last_insert_id(), email, "Inserted user");
    }

    let duplicate = db.transaction(TransactionMode::Immediate, |db| {
        let fresh = UserTable::email().set("cindy@example.com");
        let taken = UserTable::email().set("alice@example.com");
        db.run_expression(&users.insert(&[fresh]))?;
        db.run_expression(&users.insert(&[taken]))
    });
    if let Err(err) = duplicate {
        info!(error = %err, "Transaction rolled back");
    }

    db.savepoint(None, |db| {
        let existing = UserTable::email().set("betsy@example.com");
        db.run_expression(&users.insert_or(Conflict::Ignore, &[existing]))?;
        db.savepoint(Some("promote"), |db| {
            let promote = users
                .clone()
                .filter(UserTable::age().gt(30))
                .update()
                .set(UserTable::admin().set(true))
                .build();
            db.run_expression(&promote)
        })
    })?;

    let listing = users
        .clone()
        .select(&[&UserTable::email(), &UserTable::admin()])
        .order_by(&[&UserTable::email().asc()])
        .statement();
    for row in db.query_expression(&listing)? {
        let email: String = row.get_column(&UserTable::email())?;
        let admin: bool = row.get_column(&UserTable::admin())?;
        println!("{email} admin={admin}");
    }

    info!(
        users = ?db.scalar_expression(&users.count())?,
        total_changes = db.total_changes()?,
        "Done"
    );
    Ok(())
}
