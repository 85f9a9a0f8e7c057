//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::DEFAULT_BALANCE_TOLERANCE;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Well-known chart codes and posting tolerances.
    #[serde(default)]
    pub accounting: AccountingConfig,
    /// Audit outbox configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Chart-of-accounts codes the journal engine posts to without being told.
///
/// A missing account for any of these codes is a configuration error.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AccountingConfig {
    /// Cash on hand / in bank.
    pub cash: String,
    /// Tuition and fee revenue credited by student payments.
    pub tuition_revenue: String,
    /// Salaries expense debited by payroll.
    pub salaries_expense: String,
    /// Utilities expense.
    pub utilities_expense: String,
    /// School supplies expense.
    pub supplies_expense: String,
    /// Rent expense.
    pub rent_expense: String,
    /// Repairs and maintenance expense.
    pub maintenance_expense: String,
    /// Office expense.
    pub office_expense: String,
    /// Fallback for expense categories matching no keyword.
    pub other_expense: String,
    /// Liability for employer contributions and withheld employee deductions.
    pub accrued_payroll_taxes: String,
    /// Maximum accepted difference between debit and credit totals.
    pub balance_tolerance: Decimal,
}

impl Default for AccountingConfig {
    fn default() -> Self {
        Self {
            cash: "1010".to_string(),
            tuition_revenue: "4010".to_string(),
            salaries_expense: "5010".to_string(),
            utilities_expense: "5020".to_string(),
            supplies_expense: "5030".to_string(),
            rent_expense: "5040".to_string(),
            maintenance_expense: "5050".to_string(),
            office_expense: "5060".to_string(),
            other_expense: "5090".to_string(),
            accrued_payroll_taxes: "2110".to_string(),
            balance_tolerance: DEFAULT_BALANCE_TOLERANCE,
        }
    }
}

/// Audit outbox configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Bounded capacity of the audit channel; records beyond it are dropped.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    1024
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("BURSAR").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_accounting_defaults() {
        let accounting = AccountingConfig::default();
        assert_eq!(accounting.cash, "1010");
        assert_eq!(accounting.tuition_revenue, "4010");
        assert_eq!(accounting.other_expense, "5090");
        assert_eq!(accounting.balance_tolerance, dec!(0.01));
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("BURSAR__DATABASE__URL", Some("postgres://localhost/bursar_test")),
                ("BURSAR__ACCOUNTING__CASH", Some("1001")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/bursar_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.accounting.cash, "1001");
                assert_eq!(config.accounting.tuition_revenue, "4010");
                assert_eq!(config.audit.channel_capacity, 1024);
            },
        );
    }

    #[test]
    fn test_load_requires_database_url() {
        temp_env::with_vars_unset(["BURSAR__DATABASE__URL"], || {
            assert!(AppConfig::load().is_err());
        });
    }
}
