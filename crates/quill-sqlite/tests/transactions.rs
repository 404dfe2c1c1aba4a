//! Transaction and savepoint state machines, observed through the trace.

mod common;
use common::*;

use quill_sqlite::{params, Error, TransactionMode};

const INSERT: &str = "INSERT INTO users (email, admin) VALUES (?, ?)";
const INSERTED_ALICE: &str = "INSERT INTO users (email, admin) VALUES ('alice@example.com', 1)";

// =============================================================================
// Transactions
// =============================================================================

#[test]
fn test_transaction_begins_and_commits() {
    let db = users_db();
    let trace = Trace::install(&db);

    db.transaction(TransactionMode::default(), |db| {
        db.run(INSERT, params!["alice@example.com", 1])
    })
    .unwrap();

    assert_eq!(trace.count("BEGIN DEFERRED TRANSACTION"), 1);
    assert_eq!(trace.count("COMMIT TRANSACTION"), 1);
    assert_eq!(trace.count("ROLLBACK TRANSACTION"), 0);
    assert_eq!(user_count(&db), 1);
    assert!(db.is_autocommit());
}

#[test]
fn test_transaction_modes() {
    for (mode, begin) in [
        (TransactionMode::Deferred, "BEGIN DEFERRED TRANSACTION"),
        (TransactionMode::Immediate, "BEGIN IMMEDIATE TRANSACTION"),
        (TransactionMode::Exclusive, "BEGIN EXCLUSIVE TRANSACTION"),
    ] {
        let db = users_db();
        let trace = Trace::install(&db);
        db.transaction(mode, |db| db.run(INSERT, params!["alice@example.com", 1]))
            .unwrap();
        assert_eq!(trace.count(begin), 1, "{mode}");
    }
}

#[test]
fn test_transaction_rolls_back_on_failure() {
    let db = users_db();
    db.transaction(TransactionMode::Deferred, |db| {
        db.run(INSERT, params!["alice@example.com", 1])
    })
    .unwrap();

    let trace = Trace::install(&db);
    let err = db
        .transaction(TransactionMode::Deferred, |db| {
            db.run(INSERT, params!["alice@example.com", 1])?;
            db.run(INSERT, params!["alice@example.com", 1])
        })
        .unwrap_err();

    assert_eq!(trace.count("COMMIT TRANSACTION"), 0);
    assert_eq!(trace.count("ROLLBACK TRANSACTION"), 1);
    // The first insert fails, so the second never runs.
    assert_eq!(trace.count(INSERTED_ALICE), 1);
    let message = err.to_string().to_lowercase();
    assert!(message.contains("unique"), "got {err}");
    assert_eq!(user_count(&db), 1);
}

#[test]
fn test_transaction_undoes_earlier_statements() {
    let db = users_db();
    let trace = Trace::install(&db);

    let result = db.transaction(TransactionMode::Deferred, |db| {
        insert_user(db, "alice@example.com")?;
        insert_user(db, "alice@example.com")
    });

    assert!(matches!(result, Err(Error::Execution { .. })));
    assert_eq!(
        trace.control(),
        vec!["BEGIN DEFERRED TRANSACTION", "ROLLBACK TRANSACTION"]
    );
    assert_eq!(user_count(&db), 0);
    assert!(db.is_autocommit());
}

#[test]
fn test_nested_transaction_fails_and_rolls_back_outer() {
    let db = users_db();
    let err = db
        .transaction(TransactionMode::Deferred, |db| {
            insert_user(db, "alice@example.com")?;
            db.transaction(TransactionMode::Deferred, |_| Ok(()))
        })
        .unwrap_err();

    assert!(
        err.to_string().contains("within a transaction"),
        "got {err}"
    );
    assert_eq!(user_count(&db), 0);
    assert!(db.is_autocommit());
}

// =============================================================================
// Savepoints
// =============================================================================

#[test]
fn test_savepoints_nest_and_name_automatically() {
    let db = users_db();
    let trace = Trace::install(&db);

    db.savepoint(None, |db| {
        db.savepoint(None, |db| {
            insert_user(db, "alice@example.com")?;
            insert_user(db, "betsy@example.com")?;
            insert_user(db, "cindy@example.com")
        })?;
        db.savepoint(None, |db| {
            insert_user(db, "donna@example.com")?;
            insert_user(db, "emery@example.com")?;
            insert_user(db, "flint@example.com")
        })
    })
    .unwrap();

    assert_eq!(
        trace.control(),
        vec![
            "SAVEPOINT '1'",
            "SAVEPOINT '2'",
            "RELEASE SAVEPOINT '2'",
            "SAVEPOINT '3'",
            "RELEASE SAVEPOINT '3'",
            "RELEASE SAVEPOINT '1'",
        ]
    );
    assert_eq!(user_count(&db), 6);
    assert!(db.is_autocommit());
}

#[test]
fn test_savepoint_rolls_back_on_failure() {
    let db = users_db();
    let trace = Trace::install(&db);

    let result = db.savepoint(None, |db| {
        db.savepoint(None, |db| {
            db.run(INSERT, params!["alice@example.com", 1])?;
            db.run(INSERT, params!["alice@example.com", 1])?;
            db.run(INSERT, params!["alice@example.com", 1])
        })?;
        db.savepoint(None, |db| db.run(INSERT, params!["alice@example.com", 1]))
    });

    assert!(result.is_err());
    assert_eq!(
        trace.control(),
        vec![
            "SAVEPOINT '1'",
            "SAVEPOINT '2'",
            "ROLLBACK TO SAVEPOINT '2'",
            "ROLLBACK TO SAVEPOINT '1'",
        ]
    );
    assert_eq!(trace.count(INSERTED_ALICE), 2);

    // Without a release, the outermost savepoint's transaction stays open.
    assert!(!db.is_autocommit());
    assert_eq!(user_count(&db), 0);
    db.run("ROLLBACK TRANSACTION", ()).unwrap();
    assert!(db.is_autocommit());
}

#[test]
fn test_savepoint_counter_is_never_reset() {
    let db = users_db();
    let failed = db.savepoint(None, |db| {
        insert_user(db, "alice@example.com")?;
        insert_user(db, "alice@example.com")
    });
    assert!(failed.is_err());
    db.run("ROLLBACK TRANSACTION", ()).unwrap();

    let trace = Trace::install(&db);
    db.savepoint(None, |db| insert_user(db, "alice@example.com"))
        .unwrap();
    assert_eq!(
        trace.control(),
        vec!["SAVEPOINT '2'", "RELEASE SAVEPOINT '2'"]
    );
}

#[test]
fn test_savepoint_quotes_names() {
    let db = users_db();
    let trace = Trace::install(&db);

    db.savepoint(Some("That's all, Folks!"), |db| db.run("SELECT 1", ()))
        .unwrap();

    assert_eq!(trace.count("SAVEPOINT 'That''s all, Folks!'"), 1);
    assert_eq!(trace.count("RELEASE SAVEPOINT 'That''s all, Folks!'"), 1);
}

#[test]
fn test_savepoint_inside_transaction_keeps_outer_work() {
    let db = users_db();
    db.transaction(TransactionMode::Immediate, |db| {
        insert_user(db, "alice@example.com")?;
        let inner = db.savepoint(Some("retry"), |db| {
            insert_user(db, "betsy@example.com")?;
            insert_user(db, "alice@example.com")
        });
        assert!(inner.is_err());
        Ok(())
    })
    .unwrap();

    // The savepoint's work is gone; the transaction's is committed.
    assert_eq!(user_count(&db), 1);
    assert!(db.is_autocommit());
}

#[test]
fn test_savepoint_returns_body_value() {
    let db = users_db();
    let id = db
        .savepoint(None, |db| {
            insert_user(db, "alice@example.com")?;
            Ok(db.last_insert_id())
        })
        .unwrap();
    assert_eq!(id, Some(1));
}
