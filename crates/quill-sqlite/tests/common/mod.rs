#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use quill_sqlite::{params, Connection, Result};

pub const CREATE_USERS: &str = "CREATE TABLE users (\
    id INTEGER PRIMARY KEY, \
    email TEXT NOT NULL UNIQUE, \
    age INTEGER, \
    salary REAL, \
    admin BOOLEAN NOT NULL DEFAULT 0, \
    manager_id INTEGER REFERENCES users(id)\
)";

/// An in-memory connection with an empty `users` table.
pub fn users_db() -> Connection {
    let db = Connection::open_in_memory().expect("Failed to open in-memory database");
    db.execute_batch(CREATE_USERS)
        .expect("Failed to create users table");
    db
}

/// Inserts a non-admin user with the given email.
pub fn insert_user(db: &Connection, email: &str) -> Result<()> {
    db.run(
        "INSERT INTO users (email, admin) VALUES (?, ?)",
        params![email, false],
    )
}

pub fn user_count(db: &Connection) -> i64 {
    db.scalar::<i64>("SELECT count(*) FROM users", ())
        .expect("Failed to count users")
        .unwrap_or_default()
}

/// Records every statement a connection executes.
#[derive(Debug, Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn install(db: &Connection) -> Self {
        let trace = Self::default();
        let sink = trace.clone();
        db.set_trace(move |sql| sink.0.lock().unwrap().push(String::from(sql)));
        trace
    }

    pub fn statements(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// How many times exactly `sql` was executed.
    pub fn count(&self, sql: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|s| *s == sql).count()
    }

    /// Transaction and savepoint control statements, in order.
    pub fn control(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|s| {
                ["BEGIN", "COMMIT", "ROLLBACK", "SAVEPOINT", "RELEASE"]
                    .iter()
                    .any(|keyword| s.starts_with(keyword))
            })
            .cloned()
            .collect()
    }
}
