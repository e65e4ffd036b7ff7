use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use studio_core::supabase::{ManagementClient, RestClient, SupabaseError};
use studio_web::builder::{DEFAULT_EVENT_TYPE, WALK_IN_CUSTOMER};
use studio_web::models::receipt::{DiscountType, ReceiptStatus};
use studio_web::models::{Receipt, Service, ServiceCategory};

use crate::config::ScriptSettings;
use crate::sql;

#[derive(Parser, Debug)]
#[command(name = "studio-admin", version, about = "Maintenance tasks for the studio database")]
pub struct Cli {
    /// Log filter, overridden by RUST_LOG.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Create the admin write policies on services, receipts and settings
    ApplyPolicies,
    /// Add the payment columns to receipts and the theme columns to settings
    UpdateSchema,
    /// Ask the REST layer to reload its schema cache
    ReloadCache,
    /// List the receipts table columns and types
    CheckColumns,
    /// Describe the services table
    GetSchema,
    /// Insert a throwaway service as the anonymous role
    TestServiceInsert,
    /// Insert a complete test receipt as the anonymous role
    DebugInsert,
    /// Insert a test receipt without the payment columns
    DebugSubsetInsert,
}

/// Runs one command and returns the report to print.
pub async fn run(command: Command, settings: &ScriptSettings, now: DateTime<Utc>) -> anyhow::Result<String> {
    tracing::info!(?command, "Running maintenance command");

    match command {
        Command::ApplyPolicies => {
            let result = run_sql(settings, sql::APPLY_POLICIES).await?;
            Ok(format!("Policies applied successfully: {result}"))
        }
        Command::UpdateSchema => {
            let result = run_sql(settings, sql::UPDATE_SCHEMA).await?;
            Ok(format!("Schema updated: {result}"))
        }
        Command::ReloadCache => {
            let result = run_sql(settings, sql::RELOAD_SCHEMA_CACHE).await?;
            Ok(format!("Schema cache reload requested: {result}"))
        }
        Command::CheckColumns => {
            let result = run_sql(settings, sql::RECEIPT_COLUMNS).await?;
            Ok(format!("Columns:\n{}", serde_json::to_string_pretty(&result)?))
        }
        Command::GetSchema => {
            let result = run_sql(settings, sql::SERVICES_SCHEMA).await?;
            Ok(describe_columns(&result))
        }
        Command::TestServiceInsert => {
            let rest = anon_client(settings)?;
            let row = vec![test_service(now)];
            let inserted: Vec<Value> = rest
                .insert("services", &row, None)
                .await
                .map_err(|e| rejected("services", e))?;
            Ok(format!("Insert successful:\n{}", serde_json::to_string_pretty(&inserted)?))
        }
        Command::DebugInsert => {
            insert_only(settings, "receipts", full_test_receipt(now)?).await?;
            Ok("Insert successful".to_string())
        }
        Command::DebugSubsetInsert => {
            insert_only(settings, "receipts", subset_test_receipt(now)?).await?;
            Ok("Insert successful without payment columns".to_string())
        }
    }
}

async fn run_sql(settings: &ScriptSettings, statement: &str) -> anyhow::Result<Value> {
    let client = ManagementClient::new(settings.management()?);
    client
        .run_query(statement)
        .await
        .map_err(|e| anyhow::anyhow!("SQL execution failed: {e}"))
}

fn anon_client(settings: &ScriptSettings) -> anyhow::Result<RestClient> {
    Ok(RestClient::new(&settings.supabase()?))
}

fn rejected(table: &str, e: SupabaseError) -> anyhow::Error {
    tracing::error!(table, error = %e, "Test insert rejected");
    anyhow::anyhow!("Insert failed: {e}")
}

/// Writes one row without reading it back; the anonymous role usually may
/// insert receipts but not select them.
async fn insert_only(settings: &ScriptSettings, table: &str, row: Value) -> anyhow::Result<()> {
    anon_client(settings)?
        .insert_minimal(table, &json!([row]), None)
        .await
        .map_err(|e| rejected(table, e))
}

/// One line per column: `- name: type (Default: .., Nullable: ..)`.
pub fn describe_columns(rows: &Value) -> String {
    let text = |row: &Value, key: &str| match row.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "null".to_string(),
        Some(other) => other.to_string(),
    };

    let mut report = String::from("Services table schema:");
    for row in rows.as_array().map(Vec::as_slice).unwrap_or_default() {
        report.push_str(&format!(
            "\n- {}: {} (Default: {}, Nullable: {})",
            text(row, "column_name"),
            text(row, "data_type"),
            text(row, "column_default"),
            text(row, "is_nullable"),
        ));
    }
    report
}

pub fn test_service(now: DateTime<Utc>) -> Service {
    Service {
        id: format!("test-{}", now.timestamp_millis()),
        name: "Test Service".to_string(),
        category: ServiceCategory::Photography,
        price: Decimal::from(100),
        description: "Test description".to_string(),
        is_active: true,
    }
}

fn test_receipt(now: DateTime<Utc>, number: &str, notes: &str) -> Receipt {
    let amount = Decimal::from(100);
    Receipt {
        id: now.timestamp_millis().to_string(),
        receipt_number: number.to_string(),
        customer_name: WALK_IN_CUSTOMER.to_string(),
        customer_phone: String::new(),
        customer_email: String::new(),
        event_date: "2024-01-01".to_string(),
        event_type: DEFAULT_EVENT_TYPE.to_string(),
        items: Vec::new(),
        subtotal: amount,
        discount: Decimal::ZERO,
        discount_type: DiscountType::Fixed,
        tax: Decimal::ZERO,
        total: amount,
        notes: notes.to_string(),
        created_at: None,
        status: ReceiptStatus::Pending,
        amount_paid: Decimal::ZERO,
        balance_due: amount,
        advance_payment: Decimal::ZERO,
    }
}

pub fn full_test_receipt(now: DateTime<Utc>) -> serde_json::Result<Value> {
    serde_json::to_value(test_receipt(now, "TEST001", "Test note"))
}

/// Same shape minus `amountPaid` and `advancePayment`, for databases that
/// predate those columns.
pub fn subset_test_receipt(now: DateTime<Utc>) -> serde_json::Result<Value> {
    let mut row = serde_json::to_value(test_receipt(now, "TEST002", "Test note without extra cols"))?;
    if let Value::Object(columns) = &mut row {
        columns.remove("amountPaid");
        columns.remove("advancePayment");
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn subcommands_use_kebab_case_names() {
        let cli = Cli::try_parse_from(["studio-admin", "debug-subset-insert"]).unwrap();
        assert_eq!(cli.command, Command::DebugSubsetInsert);
        assert_eq!(cli.log_level, "info");

        assert!(Cli::try_parse_from(["studio-admin", "drop-everything"]).is_err());
    }

    #[test]
    fn subset_receipt_omits_payment_columns() {
        let now = Utc::now();
        let full = full_test_receipt(now).unwrap();
        let subset = subset_test_receipt(now).unwrap();

        assert_eq!(full["receiptNumber"], "TEST001");
        assert!(full.get("amountPaid").is_some());
        assert_eq!(subset["receiptNumber"], "TEST002");
        assert!(subset.get("amountPaid").is_none());
        assert!(subset.get("advancePayment").is_none());
        assert_eq!(subset["discountType"], "fixed");
    }

    #[test]
    fn describes_columns_with_null_defaults() {
        let rows = json!([
            {"column_name": "id", "data_type": "text", "column_default": null, "is_nullable": "NO"},
            {"column_name": "isActive", "data_type": "boolean", "column_default": "true", "is_nullable": "YES"}
        ]);

        let report = describe_columns(&rows);

        assert!(report.contains("- id: text (Default: null, Nullable: NO)"));
        assert!(report.contains("- isActive: boolean (Default: true, Nullable: YES)"));
    }
}
