//! Merchant workflow rules: per-vertical defaults, overrides and the cache
//! that serves them to the order state machine.

mod directory;
mod provider;
mod rules;

pub use directory::{InMemoryMerchantDirectory, MerchantDirectory};
pub use provider::WorkflowRulesProvider;
pub use rules::{DEFAULT_STATUS_TIMEOUT_HOURS, MerchantWorkflowRules};

use common::MerchantId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorKind;
use crate::order::OrderStatus;

/// A merchant's business category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusinessVertical {
    Restaurant,
    Grocery,
    Pharmacy,
    Beverages,
    Convenience,
    Electronics,
    Florist,
    FuelStation,
}

impl BusinessVertical {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessVertical::Restaurant => "RESTAURANT",
            BusinessVertical::Grocery => "GROCERY",
            BusinessVertical::Pharmacy => "PHARMACY",
            BusinessVertical::Beverages => "BEVERAGES",
            BusinessVertical::Convenience => "CONVENIENCE",
            BusinessVertical::Electronics => "ELECTRONICS",
            BusinessVertical::Florist => "FLORIST",
            BusinessVertical::FuelStation => "FUEL_STATION",
        }
    }
}

impl std::fmt::Display for BusinessVertical {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("Merchant not found: {0}")]
    MerchantNotFound(MerchantId),

    #[error("Rules belong to merchant {actual}, not {expected}")]
    MerchantMismatch {
        expected: MerchantId,
        actual: MerchantId,
    },

    #[error("Timeout for {status} must be positive")]
    NonPositiveTimeout { status: OrderStatus },
}

impl RulesError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RulesError::MerchantNotFound(_) => ErrorKind::NotFound,
            RulesError::MerchantMismatch { .. } | RulesError::NonPositiveTimeout { .. } => {
                ErrorKind::Validation
            }
        }
    }
}
