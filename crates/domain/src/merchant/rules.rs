use std::collections::{HashMap, HashSet};

use chrono::Duration;
use common::MerchantId;

use super::{BusinessVertical, RulesError};
use crate::order::OrderStatus;

/// Hours allowed in any status the rules do not list a timeout for.
pub const DEFAULT_STATUS_TIMEOUT_HOURS: i64 = 24;

/// How one merchant's orders move through their lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct MerchantWorkflowRules {
    pub merchant_id: MerchantId,
    pub vertical: BusinessVertical,
    /// Orders skip manual acceptance at `PAYMENT_CONFIRMED`.
    pub auto_accept_orders: bool,
    pub requires_preparation_confirmation: bool,
    pub allows_cancellation_during_delivery: bool,
    pub preparation_time_limit: Duration,
    pub pickup_time_limit: Duration,
    pub delivery_time_limit: Duration,
    pub merchant_controlled_statuses: HashSet<OrderStatus>,
    pub status_timeouts: HashMap<OrderStatus, Duration>,
    pub supports_partial_refunds: bool,
    pub requires_delivery_confirmation: bool,
}

impl MerchantWorkflowRules {
    /// Defaults for a merchant in `vertical`.
    ///
    /// Every vertical controls `READY_FOR_PICKUP` so that orders can go out
    /// for delivery.
    pub fn default_for(merchant_id: MerchantId, vertical: BusinessVertical) -> Self {
        use OrderStatus::*;

        let minutes = |m: i64| Duration::minutes(m);
        let timeouts = |confirmed: i64, preparing: i64, ready: i64, out: i64| {
            HashMap::from([
                (PaymentConfirmed, minutes(confirmed)),
                (Preparing, minutes(preparing)),
                (ReadyForPickup, minutes(ready)),
                (OutForDelivery, minutes(out)),
            ])
        };

        match vertical {
            BusinessVertical::Restaurant => Self {
                merchant_id,
                vertical,
                auto_accept_orders: false,
                requires_preparation_confirmation: true,
                allows_cancellation_during_delivery: false,
                preparation_time_limit: minutes(30),
                pickup_time_limit: minutes(10),
                delivery_time_limit: minutes(45),
                merchant_controlled_statuses: HashSet::from([
                    PaymentConfirmed,
                    Preparing,
                    ReadyForPickup,
                ]),
                status_timeouts: timeouts(5, 30, 10, 45),
                supports_partial_refunds: false,
                requires_delivery_confirmation: true,
            },
            BusinessVertical::Grocery => Self {
                merchant_id,
                vertical,
                auto_accept_orders: true,
                requires_preparation_confirmation: true,
                allows_cancellation_during_delivery: true,
                preparation_time_limit: minutes(60),
                pickup_time_limit: minutes(15),
                delivery_time_limit: minutes(60),
                merchant_controlled_statuses: HashSet::from([Preparing, ReadyForPickup]),
                status_timeouts: timeouts(2, 60, 15, 60),
                supports_partial_refunds: true,
                requires_delivery_confirmation: true,
            },
            // Manual acceptance leaves time for prescription validation.
            BusinessVertical::Pharmacy => Self {
                merchant_id,
                vertical,
                auto_accept_orders: false,
                requires_preparation_confirmation: true,
                allows_cancellation_during_delivery: false,
                preparation_time_limit: minutes(45),
                pickup_time_limit: minutes(5),
                delivery_time_limit: minutes(30),
                merchant_controlled_statuses: HashSet::from([
                    PaymentConfirmed,
                    Preparing,
                    ReadyForPickup,
                ]),
                status_timeouts: timeouts(10, 45, 5, 30),
                supports_partial_refunds: false,
                requires_delivery_confirmation: true,
            },
            _ => Self {
                merchant_id,
                vertical,
                auto_accept_orders: true,
                requires_preparation_confirmation: false,
                allows_cancellation_during_delivery: true,
                preparation_time_limit: minutes(30),
                pickup_time_limit: minutes(10),
                delivery_time_limit: minutes(45),
                merchant_controlled_statuses: HashSet::from([Preparing, ReadyForPickup]),
                status_timeouts: timeouts(5, 30, 10, 45),
                supports_partial_refunds: true,
                requires_delivery_confirmation: false,
            },
        }
    }

    pub fn controls_status(&self, status: OrderStatus) -> bool {
        self.merchant_controlled_statuses.contains(&status)
    }

    pub fn timeout_for(&self, status: OrderStatus) -> Duration {
        self.status_timeouts
            .get(&status)
            .copied()
            .unwrap_or_else(|| Duration::hours(DEFAULT_STATUS_TIMEOUT_HOURS))
    }

    /// Whether leaving `status` waits on an explicit merchant action.
    pub fn requires_confirmation(&self, status: OrderStatus) -> bool {
        match status {
            OrderStatus::PaymentConfirmed => !self.auto_accept_orders,
            OrderStatus::Preparing => self.requires_preparation_confirmation,
            _ => false,
        }
    }

    pub fn with_status_timeout(mut self, status: OrderStatus, timeout: Duration) -> Self {
        self.status_timeouts.insert(status, timeout);
        self
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        let mut statuses: Vec<_> = self.status_timeouts.iter().collect();
        statuses.sort_by_key(|(status, _)| **status);

        for (status, timeout) in statuses {
            if *timeout <= Duration::zero() {
                return Err(RulesError::NonPositiveTimeout { status: *status });
            }
        }
        Ok(())
    }
}
