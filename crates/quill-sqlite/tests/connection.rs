//! Connection lifecycle, statements, bindings and counters.

mod common;
use common::*;

use quill_core::{BindingError, DecodeError};
use quill_sqlite::{
    named_params, params, Binding, Bindings, Connection, ConnectionConfig, Error, OpenMode,
};

// =============================================================================
// Opening
// =============================================================================

#[test]
fn test_read_write_connection_is_not_read_only() {
    let db = users_db();
    assert!(!db.is_read_only());
    assert!(db.is_autocommit());
}

#[test]
fn test_read_only_connection_rejects_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.db");
    {
        let db = Connection::open(&path).unwrap();
        db.execute_batch(CREATE_USERS).unwrap();
        insert_user(&db, "alice@example.com").unwrap();
    }

    let db = Connection::open_read_only(&path).unwrap();
    assert!(db.is_read_only());
    assert_eq!(user_count(&db), 1);

    let err = insert_user(&db, "betsy@example.com").unwrap_err();
    assert!(matches!(err, Error::Execution { .. }), "got {err:?}");
    // SQLITE_READONLY
    assert_eq!(err.code().map(|code| code & 0xff), Some(8));
}

#[test]
fn test_read_only_missing_file_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let err = Connection::open_read_only(dir.path().join("missing.db")).unwrap_err();
    assert!(matches!(err, Error::Open { .. }), "got {err:?}");
}

#[test]
fn test_open_with_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConnectionConfig::file(dir.path().join("app.db"))
        .with_busy_timeout_ms(100)
        .with_foreign_keys(true);
    let db = Connection::open_with(&config).unwrap();
    assert!(db.foreign_keys().unwrap());
    assert!(!db.is_read_only());
}

#[test]
fn test_config_from_json() {
    let config: ConnectionConfig =
        serde_json::from_str(r#"{"mode": "read_only", "busy_timeout_ms": 500}"#).unwrap();
    assert_eq!(config.mode, OpenMode::ReadOnly);
    assert_eq!(config.busy_timeout_ms, Some(500));
    assert_eq!(config.path, None);
    assert!(!config.foreign_keys);

    let empty: ConnectionConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, ConnectionConfig::default());
}

#[test]
fn test_config_can_disable_foreign_keys() {
    let config: ConnectionConfig = serde_json::from_str(r#"{"foreign_keys": false}"#).unwrap();
    let db = Connection::open_with(&config).unwrap();
    assert!(!db.foreign_keys().unwrap());

    db.execute_batch(CREATE_USERS).unwrap();
    db.run(
        "INSERT INTO users (email, manager_id) VALUES (?, ?)",
        params!["orphan@example.com", 99],
    )
    .unwrap();
    assert_eq!(user_count(&db), 1);
}

#[test]
fn test_config_can_enable_foreign_keys() {
    let config: ConnectionConfig = serde_json::from_str(r#"{"foreign_keys": true}"#).unwrap();
    let db = Connection::open_with(&config).unwrap();
    assert!(db.foreign_keys().unwrap());

    db.execute_batch(CREATE_USERS).unwrap();
    let err = db
        .run(
            "INSERT INTO users (email, manager_id) VALUES (?, ?)",
            params!["orphan@example.com", 99],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"), "got {err}");
}

// =============================================================================
// Counters
// =============================================================================

#[test]
fn test_last_insert_id_is_none_on_new_connections() {
    let db = users_db();
    assert_eq!(db.last_insert_id(), None);
}

#[test]
fn test_last_insert_id_after_insert() {
    let db = users_db();
    insert_user(&db, "alice@example.com").unwrap();
    assert_eq!(db.last_insert_id(), Some(1));
    insert_user(&db, "betsy@example.com").unwrap();
    assert_eq!(db.last_insert_id(), Some(2));
}

#[test]
fn test_last_insert_id_with_explicit_zero_rowid() {
    let db = Connection::open_in_memory().unwrap();
    db.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, a INTEGER)")
        .unwrap();
    assert_eq!(db.last_insert_id(), None);

    db.run("INSERT INTO t (id, a) VALUES (0, 1)", ()).unwrap();
    assert_eq!(db.last_changes().unwrap(), 1);
    assert_eq!(db.last_insert_id(), Some(0));
}

#[test]
fn test_last_insert_id_ignores_other_statements() {
    let db = users_db();
    db.run("UPDATE users SET age = 1", ()).unwrap();
    db.run("INSERT OR IGNORE INTO users (id) SELECT 1 WHERE 0", ())
        .unwrap();
    assert_eq!(db.last_insert_id(), None);
}

#[test]
fn test_last_changes() {
    let db = users_db();
    assert_eq!(db.last_changes().unwrap(), 0);
    insert_user(&db, "alice@example.com").unwrap();
    assert_eq!(db.last_changes().unwrap(), 1);
    insert_user(&db, "betsy@example.com").unwrap();
    assert_eq!(db.last_changes().unwrap(), 1);

    db.run("UPDATE users SET age = ?", params![30]).unwrap();
    assert_eq!(db.last_changes().unwrap(), 2);
}

#[test]
fn test_total_changes() {
    let db = users_db();
    assert_eq!(db.total_changes().unwrap(), 0);
    insert_user(&db, "alice@example.com").unwrap();
    assert_eq!(db.total_changes().unwrap(), 1);
    insert_user(&db, "betsy@example.com").unwrap();
    assert_eq!(db.total_changes().unwrap(), 2);
}

// =============================================================================
// Prepare / run / scalar
// =============================================================================

#[test]
fn test_prepare_accepts_every_binding_form() {
    let db = users_db();
    let sql = "SELECT * FROM users WHERE admin = ?";
    db.prepare("SELECT * FROM users WHERE admin = 0", ())
        .unwrap();
    db.prepare(sql, params![0]).unwrap();
    db.prepare(sql, vec![Some(Binding::Integer(0))]).unwrap();
    db.prepare(sql, [Some(Binding::Integer(0))]).unwrap();
    db.prepare(
        "SELECT * FROM users WHERE admin = $admin",
        named_params! { "$admin" => 0 },
    )
    .unwrap();
}

#[test]
fn test_prepare_without_bindings_defers_them() {
    let db = users_db();
    let mut statement = db
        .prepare("INSERT INTO users (email, admin) VALUES (?, ?)", ())
        .unwrap();
    assert_eq!(statement.parameter_count(), 2);

    statement.bind(params!["alice@example.com", true]).unwrap();
    statement.run(()).unwrap();
    statement.run(params!["betsy@example.com", false]).unwrap();
    assert_eq!(
        statement.expanded_sql(),
        "INSERT INTO users (email, admin) VALUES ('betsy@example.com', 0)"
    );
    assert_eq!(user_count(&db), 2);
}

#[test]
fn test_run_executes_with_inlined_trace() {
    let db = users_db();
    let trace = Trace::install(&db);

    let sql = "SELECT * FROM users WHERE admin = ?";
    db.run("SELECT * FROM users WHERE admin = 0", ()).unwrap();
    db.run(sql, params![0]).unwrap();
    db.run(sql, vec![Some(Binding::Integer(0))]).unwrap();
    db.run(
        "SELECT * FROM users WHERE admin = $admin",
        named_params! { "$admin" => 0 },
    )
    .unwrap();

    assert_eq!(trace.count("SELECT * FROM users WHERE admin = 0"), 4);
}

#[test]
fn test_scalar_returns_first_column() {
    let db = users_db();
    let count = |sql: &str, bindings: Bindings| db.scalar::<i64>(sql, bindings).unwrap();
    let sql = "SELECT count(*) FROM users WHERE admin = ?";
    assert_eq!(count("SELECT count(*) FROM users", params![]), Some(0));
    assert_eq!(count(sql, params![0]), Some(0));
    assert_eq!(
        count(
            "SELECT count(*) FROM users WHERE admin = $admin",
            named_params! { "$admin" => 0 }
        ),
        Some(0)
    );
}

#[test]
fn test_scalar_without_rows_or_with_null_is_none() {
    let db = users_db();
    let email = db.scalar::<String>("SELECT email FROM users", ());
    assert_eq!(email.unwrap(), None);
    assert_eq!(db.scalar::<i64>("SELECT NULL", ()).unwrap(), None);
}

#[test]
fn test_scalar_type_mismatch_is_decode_error() {
    let db = users_db();
    let err = db.scalar::<i64>("SELECT 'seven'", ()).unwrap_err();
    assert!(
        matches!(
            err,
            Error::Decode(DecodeError::TypeMismatch {
                expected: "integer",
                found: "text"
            })
        ),
        "got {err:?}"
    );
}

// =============================================================================
// Binding validation
// =============================================================================

#[test]
fn test_missing_positional_binding_fails() {
    let db = users_db();
    let err = db
        .run("SELECT * FROM users WHERE admin = ?", ())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Binding(BindingError::CountMismatch {
            expected: 1,
            found: 0
        })
    ));
}

#[test]
fn test_unbound_prepared_statement_fails_to_run() {
    let db = Connection::open_in_memory().unwrap();
    db.execute_batch("CREATE TABLE t (a INTEGER, b INTEGER)")
        .unwrap();

    let mut statement = db
        .prepare("INSERT INTO t (a, b) VALUES (?, ?)", ())
        .unwrap();
    let err = statement.run(()).unwrap_err();
    assert!(matches!(
        err,
        Error::Binding(BindingError::CountMismatch {
            expected: 2,
            found: 0
        })
    ));
    assert!(statement.scalar::<i64>(()).is_err());
    assert!(statement.query(()).is_err());

    assert_eq!(
        db.scalar::<i64>("SELECT count(*) FROM t", ()).unwrap(),
        Some(0)
    );
}

#[test]
fn test_extra_positional_binding_fails() {
    let db = users_db();
    let err = db
        .prepare("SELECT * FROM users WHERE admin = ?", params![0, 1])
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Binding(BindingError::CountMismatch {
            expected: 1,
            found: 2
        })
    ));
}

#[test]
fn test_unknown_named_binding_fails() {
    let db = users_db();
    let err = db
        .run(
            "SELECT * FROM users WHERE admin = $admin",
            named_params! { ":admin" => 0 },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Binding(BindingError::UnknownName(ref name)) if name == ":admin"
    ));
}

#[test]
fn test_duplicate_named_binding_fails() {
    let db = users_db();
    let err = db
        .run(
            "SELECT * FROM users WHERE admin = $admin",
            named_params! { "$admin" => 0, "$admin" => 1 },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Binding(BindingError::DuplicateName(ref name)) if name == "$admin"
    ));
}

#[test]
fn test_repeated_named_parameter_binds_once() {
    let db = users_db();
    let value = db
        .scalar::<i64>("SELECT :n + :n", named_params! { ":n" => 21 })
        .unwrap();
    assert_eq!(value, Some(42));
}

// =============================================================================
// Engine errors
// =============================================================================

#[test]
fn test_prepare_error_carries_message() {
    let db = users_db();
    let err = db.run("SELECT * FROM nowhere", ()).unwrap_err();
    match err {
        Error::Prepare { sql, message, .. } => {
            assert_eq!(sql, "SELECT * FROM nowhere");
            assert!(message.contains("no such table"), "got {message}");
        }
        other => panic!("expected a prepare error, got {other:?}"),
    }
}

#[test]
fn test_constraint_violation_is_execution_error() {
    let db = users_db();
    insert_user(&db, "alice@example.com").unwrap();
    let err = insert_user(&db, "alice@example.com").unwrap_err();
    // SQLITE_CONSTRAINT_UNIQUE
    assert_eq!(err.code(), Some(2067));
    assert_eq!(
        err.sql(),
        Some("INSERT INTO users (email, admin) VALUES (?, ?)")
    );
    assert!(err.to_string().to_lowercase().contains("unique"));
}

// =============================================================================
// Rows
// =============================================================================

#[test]
fn test_query_decodes_rows() {
    let db = users_db();
    for email in ["alice@example.com", "betsy@example.com"] {
        insert_user(&db, email).unwrap();
    }
    db.run(
        "UPDATE users SET age = ?, salary = ? WHERE email = ?",
        params![30, 1250.5, "betsy@example.com"],
    )
    .unwrap();

    let rows = db
        .query("SELECT id, email, age, salary FROM users ORDER BY id", ())
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].column_names(), &["id", "email", "age", "salary"]);

    assert_eq!(rows[0].get::<i64>(0).unwrap(), 1);
    assert_eq!(rows[0].get_named::<Option<i64>>("age").unwrap(), None);
    let email = rows[1].get_named::<String>("email").unwrap();
    assert_eq!(email, "betsy@example.com");
    assert_eq!(rows[1].get_named::<Option<i64>>("age").unwrap(), Some(30));
    let salary = rows[1].get_named::<Option<f64>>("salary").unwrap();
    assert_eq!(salary, Some(1250.5));
}

#[test]
fn test_statement_rows_are_lazy() {
    let db = users_db();
    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        insert_user(&db, email).unwrap();
    }

    let mut statement = db
        .prepare("SELECT email FROM users ORDER BY email DESC", ())
        .unwrap();
    let first = statement.query(()).unwrap().next().unwrap().unwrap();
    assert_eq!(first.get::<String>(0).unwrap(), "c@example.com");

    // Dropping the rows resets the statement.
    let all = statement
        .query(())
        .unwrap()
        .collect::<quill_sqlite::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn test_blob_and_null_round_trip() {
    let db = Connection::open_in_memory().unwrap();
    db.execute_batch("CREATE TABLE files (data BLOB, note TEXT)")
        .unwrap();
    db.run(
        "INSERT INTO files (data, note) VALUES (?, ?)",
        params![vec![0_u8, 1, 254, 255], None::<String>],
    )
    .unwrap();

    let rows = db.query("SELECT data, note FROM files", ()).unwrap();
    assert_eq!(rows[0].get::<Vec<u8>>(0).unwrap(), vec![0, 1, 254, 255]);
    assert_eq!(rows[0].get::<Option<String>>(1).unwrap(), None);
}

// =============================================================================
// Pragmas
// =============================================================================

#[test]
fn test_user_version() {
    let db = users_db();
    assert_eq!(db.user_version().unwrap(), 0);
    db.set_user_version(1).unwrap();
    assert_eq!(db.user_version().unwrap(), 1);
}

#[test]
fn test_foreign_keys() {
    let db = users_db();
    assert!(!db.foreign_keys().unwrap());
    db.set_foreign_keys(true).unwrap();
    assert!(db.foreign_keys().unwrap());

    let err = db
        .run(
            "INSERT INTO users (email, manager_id) VALUES (?, ?)",
            params!["orphan@example.com", 99],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"), "got {err}");
}

#[test]
fn test_pragma_assignment_is_traced_inline() {
    let db = users_db();
    let trace = Trace::install(&db);
    db.set_user_version(7).unwrap();
    assert_eq!(trace.count("PRAGMA user_version = 7"), 1);

    db.clear_trace();
    db.set_user_version(8).unwrap();
    assert_eq!(trace.statements(), ["PRAGMA user_version = 7"]);
}
