//! Sample failures used by the `crashguard demo` command.
//!
//! Each scenario builds the error a small user-management service would
//! raise, with realistic call arguments, so every part of a report
//! (redaction, truncation, elision, status hints, object properties) can be
//! seen without crashing anything.

use clap::ValueEnum;

use crate::report::{Exception, RawFrame};
use crate::value::{Describe, Object, Value};

/// A sample failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Database write fails three calls deep; arguments carry passwords and a private key.
    DatabaseError,
    /// Delete requested without a user ID; arguments carry a password and an API key.
    MissingId,
    /// Lookup of an unknown user; carries HTTP status 404.
    NotFound,
    /// Nested configuration with secrets at several depths and an unreadable property.
    NestedSecrets,
    /// Oversized arguments: an 11-element list and a 1500-character string.
    LargeArray,
}

impl Scenario {
    /// All scenarios in display order.
    pub const ALL: [Scenario; 5] = [
        Scenario::DatabaseError,
        Scenario::MissingId,
        Scenario::NotFound,
        Scenario::NestedSecrets,
        Scenario::LargeArray,
    ];

    /// Build the error for this scenario.
    pub fn error(self) -> Exception {
        match self {
            Scenario::DatabaseError => database_error(),
            Scenario::MissingId => missing_id(),
            Scenario::NotFound => not_found(),
            Scenario::NestedSecrets => nested_secrets(),
            Scenario::LargeArray => large_array(),
        }
    }
}

fn user_record(include_id: bool) -> Value {
    let mut entries: Vec<(&str, Value)> = Vec::new();
    if include_id {
        entries.push(("id", Value::from(123)));
    }
    entries.extend([
        ("username", Value::from("john_doe")),
        ("email", Value::from("john@example.com")),
        ("password", Value::from("secret123")),
    ]);
    Value::map(entries)
}

fn database_error() -> Exception {
    let preferences = Value::map([
        ("theme", Value::from("dark")),
        ("notifications", Value::from(true)),
        ("private_key", Value::from("rsa_private_key_here")),
    ]);
    let processed = Value::map([
        ("user_id", Value::from(123)),
        ("username", Value::from("john_doe")),
        ("email", Value::from("john@example.com")),
        ("password", Value::from("secret123")),
        ("api_key", Value::Null),
        ("preferences", preferences.clone()),
    ]);
    let mut user = user_record(true);
    if let Value::Array(entries) = &mut user {
        entries.push(("preferences".into(), preferences));
    }

    Exception::new(
        "RuntimeError",
        "Database connection failed: Unable to connect to MySQL server",
    )
    .at("src/users/store.rs", 71)
    .with_frame(
        RawFrame::new("save_to_database")
            .at("src/users/service.rs", 58)
            .with_args([processed.clone()]),
    )
    .with_frame(
        RawFrame::new("validate_and_save")
            .in_class("UserService", crate::report::CallType::Instance)
            .at("src/users/service.rs", 33)
            .with_args([processed, Value::from(false)]),
    )
    .with_frame(
        RawFrame::new("process_user_data")
            .at("src/main.rs", 24)
            .with_args([user, Value::from("create"), Value::from(false), Value::Null]),
    )
}

fn missing_id() -> Exception {
    let mut user = user_record(false);
    if let Value::Array(entries) = &mut user {
        entries.push(("api_key".into(), Value::from("sk_live_abcd1234")));
    }

    Exception::new(
        "InvalidArgument",
        "User ID is required for delete operations",
    )
    .at("src/users/service.rs", 19)
    .with_frame(
        RawFrame::new("process_user_data")
            .at("src/main.rs", 24)
            .with_args([user, Value::from("delete"), Value::from(false), Value::Null]),
    )
}

fn not_found() -> Exception {
    Exception::new("NotFound", "User 42 not found")
        .with_status(404)
        .at("src/users/repository.rs", 88)
        .with_frame(
            RawFrame::new("find_user")
                .in_class("UserRepository", crate::report::CallType::Instance)
                .at("src/users/handlers.rs", 12)
                .with_args([Value::from(42)]),
        )
}

fn nested_secrets() -> Exception {
    let config = Value::map([
        (
            "database",
            Value::map([
                ("host", Value::from("db.internal")),
                ("port", Value::from(5432)),
                (
                    "credentials",
                    Value::map([
                        ("user", Value::from("app")),
                        ("password", Value::from("pg_secret")),
                    ]),
                ),
            ]),
        ),
        (
            "cache",
            Value::map([
                ("driver", Value::from("redis")),
                ("auth_token", Value::from("redis_token_123")),
            ]),
        ),
    ]);

    let client = Object::new("ApiClient")
        .with("base_url", "https://api.example.com")
        .with("timeout_secs", 30)
        .with("bearer_token", "tok_live_999")
        .with_error("connection", "socket closed while reading peer address");

    Exception::new("ConfigurationError", "Cache driver 'redis' is unreachable")
        .with_code(3)
        .at("src/bootstrap.rs", 140)
        .with_frame(
            RawFrame::new("connect_services")
                .at("src/bootstrap.rs", 96)
                .with_args([config, Value::from(client)]),
        )
}

fn large_array() -> Exception {
    let ids: Vec<i32> = (1..=11).collect();
    let payload = "x".repeat(1500);

    Exception::new("PayloadTooLarge", "Batch exceeds the import limit")
        .with_status(413)
        .at("src/import.rs", 52)
        .with_frame(
            RawFrame::new("import_batch")
                .at("src/import.rs", 30)
                .with_args([ids.describe(), payload.describe()]),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportBuilder, Reportable};
    use crate::value::Entry;

    #[test]
    fn test_all_scenarios_build() {
        for scenario in Scenario::ALL {
            let error = scenario.error();
            assert!(!error.message().is_empty());
            assert!(!error.trace().is_empty());
        }
    }

    #[test]
    fn test_database_error_redacts_password() {
        let report = ReportBuilder::default().build(&Scenario::DatabaseError.error());
        let json = report.to_json().unwrap();

        assert!(!json.contains("secret123"));
        assert!(!json.contains("rsa_private_key_here"));
        assert!(json.contains("john_doe"));
    }

    #[test]
    fn test_large_array_elides_one_item() {
        let report = ReportBuilder::default().build(&Scenario::LargeArray.error());
        let args = report.trace()[1].args.as_ref().unwrap();

        let entries = args[0].entries().unwrap();
        assert_eq!(entries.len(), 11);
        assert_eq!(entries[10], ("...".to_string(), Entry::Elided(1)));
    }

    #[test]
    fn test_not_found_status() {
        let report = ReportBuilder::default().build(&Scenario::NotFound.error());
        assert_eq!(report.http_status(), Some(404));
    }
}
