//! Order status transitions under one merchant's workflow rules.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::aggregate::Aggregate;
use crate::merchant::MerchantWorkflowRules;

use super::{CancellationReason, Order, OrderError, OrderEvent, OrderStatus, PaymentInfo, status};

/// Decides order transitions for one merchant at one instant.
///
/// Every operation is a pure function of the order it is given: it returns
/// the events to record and never mutates. Bind a fresh machine per command
/// so `now` and the rules are current when the events are committed.
#[derive(Debug, Clone)]
pub struct OrderStateMachine {
    rules: Arc<MerchantWorkflowRules>,
    now: DateTime<Utc>,
}

impl OrderStateMachine {
    pub fn new(rules: Arc<MerchantWorkflowRules>, now: DateTime<Utc>) -> Self {
        Self { rules, now }
    }

    pub fn rules(&self) -> &MerchantWorkflowRules {
        &self.rules
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Listed in the adjacency table, not forbidden by the merchant, and
    /// meeting the target's own precondition: payment details for
    /// `PAYMENT_PROCESSING`, the refund policy for `REFUNDED`.
    ///
    /// [`Self::execute_transition`] succeeds exactly when this holds.
    pub fn can_transition(&self, order: &Order, target: OrderStatus) -> bool {
        order.is_placed()
            && status::is_listed_transition(order.status(), target)
            && self.rules_permit(order, target)
    }

    /// Empty when the order has nowhere to go; that is not an error.
    pub fn valid_next_statuses(&self, order: &Order) -> Vec<OrderStatus> {
        status::next_statuses(order.status())
            .iter()
            .copied()
            .filter(|target| self.can_transition(order, *target))
            .collect()
    }

    /// Moves the order to `target`.
    ///
    /// `CANCELLED` is routed through [`Self::cancel_order`] as a merchant
    /// request and `REFUNDED` through [`Self::process_refund`], so their
    /// policies cannot be bypassed.
    pub fn execute_transition(
        &self,
        order: &Order,
        target: OrderStatus,
        reason: Option<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        order.ensure_placed()?;

        match target {
            OrderStatus::Cancelled => {
                return self.cancel_order(order, CancellationReason::MerchantRequest, reason);
            }
            OrderStatus::Refunded => return self.process_refund(order, reason),
            _ => {}
        }

        if target == OrderStatus::PaymentProcessing && order.payment().is_none() {
            return Err(OrderError::InvalidStateTransition {
                from: order.status(),
                to: target,
                reason: "payment information required".to_string(),
            });
        }

        if !self.can_transition(order, target) {
            return Err(self.rejected(order, target));
        }

        Ok(vec![order.status_changed(target, reason, self.now)?])
    }

    pub fn can_auto_progress(&self, order: &Order) -> bool {
        self.next_auto_status(order).is_some()
    }

    /// Cash orders skip payment processing; auto-accepting merchants skip
    /// manual acceptance.
    pub fn next_auto_status(&self, order: &Order) -> Option<OrderStatus> {
        let next = match order.status() {
            OrderStatus::Pending => {
                let payment = order.payment()?;
                if payment.method.is_cash_on_delivery() {
                    OrderStatus::PaymentConfirmed
                } else if self.rules.auto_accept_orders {
                    OrderStatus::PaymentProcessing
                } else {
                    return None;
                }
            }
            OrderStatus::PaymentConfirmed if self.rules.auto_accept_orders => {
                OrderStatus::Preparing
            }
            _ => return None,
        };

        self.can_transition(order, next).then_some(next)
    }

    /// Applies automatic steps until one needs outside input.
    pub fn execute_auto_progression(&self, order: &Order) -> Result<Vec<OrderEvent>, OrderError> {
        let mut current = order.clone();
        let mut events = Vec::new();

        while let Some(next) = self.next_auto_status(&current) {
            let step = self.execute_transition(&current, next, Some("Auto-progression".into()))?;
            current.apply_events(step.iter().cloned());
            events.extend(step);
        }

        Ok(events)
    }

    pub fn can_cancel(&self, order: &Order) -> bool {
        self.can_transition(order, OrderStatus::Cancelled)
    }

    /// Cancels the order, refunding it in the same step when the reason
    /// allows an automatic refund.
    pub fn cancel_order(
        &self,
        order: &Order,
        reason: CancellationReason,
        details: Option<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        order.ensure_placed()?;

        if !self.can_cancel(order) {
            return Err(self.rejected(order, OrderStatus::Cancelled));
        }

        let cancelled = order.cancelled(reason, details, self.now)?;
        let mut after = order.clone();
        after.apply(cancelled.clone());

        let mut events = vec![cancelled];
        if reason.allows_automatic_refund() && self.can_refund(&after) {
            let note = format!("Automatic refund due to: {}", reason.description());
            events.push(after.refunded(Some(note), self.now)?);
        }

        Ok(events)
    }

    /// The status allows it, the payment method supports it and it has not
    /// already happened.
    pub fn can_refund(&self, order: &Order) -> bool {
        status::allows_refund(order.status())
            && order
                .payment()
                .is_some_and(|payment| payment.method.supports_refunds())
            && order.status() != OrderStatus::Refunded
    }

    pub fn process_refund(
        &self,
        order: &Order,
        reason: Option<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        order.ensure_placed()?;

        if !self.can_refund(order) {
            let why = match order.payment() {
                Some(payment) if !payment.method.supports_refunds() => format!(
                    "payment method {} does not support refunds",
                    payment.method.as_str()
                ),
                None => "order has no payment to refund".to_string(),
                Some(_) => format!("status {} does not allow a refund", order.status()),
            };
            return Err(OrderError::RefundNotAllowed { reason: why });
        }

        Ok(vec![order.refunded(reason, self.now)?])
    }

    pub fn status_timeout(&self, order: &Order) -> Duration {
        self.rules.timeout_for(order.status())
    }

    /// Time in the current status is strictly greater than its timeout.
    pub fn is_timed_out(&self, order: &Order) -> bool {
        order.is_placed() && order.time_in_status(self.now) > self.status_timeout(order)
    }

    pub fn requires_manual_intervention(&self, order: &Order) -> bool {
        self.rules.requires_confirmation(order.status()) || self.is_timed_out(order)
    }

    /// Applies the timeout policy for the order's current status.
    ///
    /// Whether the timeout has actually elapsed is the caller's decision; it
    /// must re-read the order first since it may have moved on. Statuses
    /// without a policy yield no events.
    pub fn handle_status_timeout(&self, order: &Order) -> Result<Vec<OrderEvent>, OrderError> {
        use CancellationReason::*;

        let (reason, details) = match order.status() {
            OrderStatus::PaymentProcessing => (PaymentFailed, "Payment processing timeout"),
            OrderStatus::PaymentConfirmed => (BusinessClosed, "Merchant acceptance timeout"),
            OrderStatus::Preparing => (SystemError, "Preparation timeout"),
            OrderStatus::ReadyForPickup => (DeliveryUnavailable, "Pickup timeout"),
            OrderStatus::OutForDelivery => {
                if !self.can_cancel(order) {
                    return self.execute_transition(
                        order,
                        OrderStatus::Failed,
                        Some("Delivery timeout".to_string()),
                    );
                }
                (DeliveryUnavailable, "Delivery timeout")
            }
            _ => return Ok(vec![]),
        };

        self.cancel_order(order, reason, Some(details.to_string()))
    }

    /// Records gateway feedback and moves the order on accordingly.
    ///
    /// A completed payment confirms an order in `PAYMENT_PROCESSING`; a
    /// failed one cancels it.
    pub fn record_payment(
        &self,
        order: &Order,
        payment: PaymentInfo,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let mut events = order.update_payment(payment, self.now)?;
        let mut current = order.clone();
        current.apply_events(events.iter().cloned());

        let Some(payment) = current.payment() else {
            return Ok(events);
        };

        let follow_up = if payment.is_paid() && current.status() == OrderStatus::PaymentProcessing {
            self.execute_transition(
                &current,
                OrderStatus::PaymentConfirmed,
                Some("Payment completed".to_string()),
            )?
        } else if payment.is_failed() && self.can_cancel(&current) {
            self.cancel_order(
                &current,
                CancellationReason::PaymentFailed,
                Some("Payment failed".to_string()),
            )?
        } else {
            vec![]
        };

        events.extend(follow_up);
        Ok(events)
    }

    fn rules_permit(&self, order: &Order, target: OrderStatus) -> bool {
        match target {
            OrderStatus::OutForDelivery => self.rules.controls_status(OrderStatus::ReadyForPickup),
            OrderStatus::Cancelled if order.status() == OrderStatus::OutForDelivery => {
                self.rules.allows_cancellation_during_delivery
            }
            OrderStatus::PaymentProcessing => order.payment().is_some(),
            OrderStatus::Refunded => self.can_refund(order),
            _ => true,
        }
    }

    fn rejected(&self, order: &Order, target: OrderStatus) -> OrderError {
        let from = order.status();
        let reason = if status::is_listed_transition(from, target) {
            "forbidden by merchant workflow rules"
        } else {
            "not a legal status transition"
        };
        OrderError::InvalidStateTransition {
            from,
            to: target,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merchant::BusinessVertical;
    use crate::order::{
        DeliveryAddress, Money, OrderItem, PaymentMethod, PaymentStatus, PlaceOrder,
    };
    use crate::order::status::ALL_ORDER_STATUSES;
    use common::{CustomerId, MerchantId, TenantId};

    fn machine(vertical: BusinessVertical, now: DateTime<Utc>) -> OrderStateMachine {
        let rules = MerchantWorkflowRules::default_for(MerchantId::new(), vertical);
        OrderStateMachine::new(Arc::new(rules), now)
    }

    fn place(method: Option<PaymentMethod>, now: DateTime<Utc>) -> Order {
        let total = Money::from_cents(1500);
        let mut cmd = PlaceOrder::new(
            TenantId::new(),
            MerchantId::new(),
            CustomerId::new(),
            vec![OrderItem::new("SKU-1", "Pizza", 1, total)],
            DeliveryAddress::new("Rua da Sé 1", "Maputo"),
        );
        if let Some(method) = method {
            cmd = cmd.with_payment(PaymentInfo::new(method, total));
        }
        let mut order = Order::default();
        order.apply_events(order.place(&cmd, now).unwrap());
        order
    }

    fn card_order(now: DateTime<Utc>) -> Order {
        place(Some(PaymentMethod::CreditCard), now)
    }

    fn drive(sm: &OrderStateMachine, order: &mut Order, path: &[OrderStatus]) {
        for target in path {
            let events = sm.execute_transition(order, *target, None).unwrap();
            order.apply_events(events);
        }
    }

    const TO_OUT_FOR_DELIVERY: [OrderStatus; 5] = [
        OrderStatus::PaymentProcessing,
        OrderStatus::PaymentConfirmed,
        OrderStatus::Preparing,
        OrderStatus::ReadyForPickup,
        OrderStatus::OutForDelivery,
    ];

    #[test]
    fn test_valid_transition() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Restaurant, now);
        let mut order = card_order(now);

        assert!(sm.can_transition(&order, OrderStatus::PaymentProcessing));
        drive(&sm, &mut order, &[OrderStatus::PaymentProcessing]);
        assert_eq!(order.status(), OrderStatus::PaymentProcessing);
    }

    #[test]
    fn test_unlisted_transition_is_rejected_and_status_unchanged() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Restaurant, now);
        let order = card_order(now);

        let result = sm.execute_transition(&order, OrderStatus::Delivered, None);
        assert!(matches!(
            result,
            Err(OrderError::InvalidStateTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Delivered,
                ..
            })
        ));
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn test_execute_succeeds_exactly_when_can_transition() {
        let now = Utc::now();
        for vertical in [BusinessVertical::Restaurant, BusinessVertical::Grocery] {
            let sm = machine(vertical, now);
            let mut order = card_order(now);
            drive(&sm, &mut order, &TO_OUT_FOR_DELIVERY[..4]);

            for target in ALL_ORDER_STATUSES {
                let allowed = sm.can_transition(&order, target);
                let result = sm.execute_transition(&order, target, None);
                assert_eq!(result.is_ok(), allowed, "{vertical} -> {target}");
            }
        }
    }

    #[test]
    fn test_refund_edge_agrees_with_refund_policy() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Grocery, now);
        let to_delivered = [
            OrderStatus::PaymentConfirmed,
            OrderStatus::Preparing,
            OrderStatus::ReadyForPickup,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ];

        let mut cash = place(Some(PaymentMethod::CashOnDelivery), now);
        drive(&sm, &mut cash, &to_delivered);
        assert!(!sm.can_transition(&cash, OrderStatus::Refunded));
        assert!(sm.valid_next_statuses(&cash).is_empty());
        assert!(matches!(
            sm.execute_transition(&cash, OrderStatus::Refunded, None),
            Err(OrderError::RefundNotAllowed { .. })
        ));

        let mut card = card_order(now);
        drive(&sm, &mut card, &to_delivered);
        assert_eq!(sm.valid_next_statuses(&card), vec![OrderStatus::Refunded]);
        for target in ALL_ORDER_STATUSES {
            for order in [&cash, &card] {
                let allowed = sm.can_transition(order, target);
                let result = sm.execute_transition(order, target, None);
                assert_eq!(result.is_ok(), allowed, "DELIVERED -> {target}");
            }
        }
    }

    #[test]
    fn test_payment_processing_is_not_offered_without_payment() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Restaurant, now);
        let order = place(None, now);

        assert!(!sm.can_transition(&order, OrderStatus::PaymentProcessing));
        assert!(!sm.valid_next_statuses(&order).contains(&OrderStatus::PaymentProcessing));
    }

    #[test]
    fn test_payment_processing_requires_payment() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Grocery, now);
        let order = place(None, now);

        let err = sm
            .execute_transition(&order, OrderStatus::PaymentProcessing, None)
            .unwrap_err();
        assert!(err.to_string().contains("payment information required"));
        assert!(!sm.can_auto_progress(&order));
    }

    #[test]
    fn test_valid_next_statuses() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Restaurant, now);
        let mut order = card_order(now);

        assert_eq!(
            sm.valid_next_statuses(&order),
            vec![
                OrderStatus::PaymentProcessing,
                OrderStatus::PaymentConfirmed,
                OrderStatus::Cancelled
            ]
        );

        drive(&sm, &mut order, &TO_OUT_FOR_DELIVERY);
        assert_eq!(
            sm.valid_next_statuses(&order),
            vec![OrderStatus::Delivered, OrderStatus::Failed]
        );

        drive(&sm, &mut order, &[OrderStatus::Delivered]);
        let refunded = sm.process_refund(&order, None).unwrap();
        order.apply_events(refunded);
        assert!(sm.valid_next_statuses(&order).is_empty());
    }

    #[test]
    fn test_cash_order_auto_progresses_to_preparing() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Grocery, now);
        let mut order = place(Some(PaymentMethod::CashOnDelivery), now);

        assert!(sm.can_auto_progress(&order));
        assert_eq!(sm.next_auto_status(&order), Some(OrderStatus::PaymentConfirmed));

        let events = sm.execute_auto_progression(&order).unwrap();
        assert_eq!(events.len(), 2);
        order.apply_events(events);

        assert_eq!(order.status(), OrderStatus::Preparing);
        assert!(!sm.can_auto_progress(&order));
    }

    #[test]
    fn test_manual_acceptance_stops_at_payment_confirmed() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Restaurant, now);
        let mut order = place(Some(PaymentMethod::CashOnDelivery), now);

        order.apply_events(sm.execute_auto_progression(&order).unwrap());
        assert_eq!(order.status(), OrderStatus::PaymentConfirmed);
        assert!(sm.requires_manual_intervention(&order));
    }

    #[test]
    fn test_card_order_waits_for_payment() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Grocery, now);
        let mut order = card_order(now);

        order.apply_events(sm.execute_auto_progression(&order).unwrap());
        assert_eq!(order.status(), OrderStatus::PaymentProcessing);

        let restaurant = machine(BusinessVertical::Restaurant, now);
        let fresh = card_order(now);
        assert!(restaurant.execute_auto_progression(&fresh).unwrap().is_empty());
    }

    #[test]
    fn test_cancel_during_delivery_follows_rules() {
        let now = Utc::now();

        let restaurant = machine(BusinessVertical::Restaurant, now);
        let mut order = card_order(now);
        drive(&restaurant, &mut order, &TO_OUT_FOR_DELIVERY);
        assert!(!restaurant.can_cancel(&order));
        let result = restaurant.cancel_order(&order, CancellationReason::CustomerRequest, None);
        assert!(matches!(
            result,
            Err(OrderError::InvalidStateTransition { .. })
        ));

        let grocery = machine(BusinessVertical::Grocery, now);
        let mut order = card_order(now);
        drive(&grocery, &mut order, &TO_OUT_FOR_DELIVERY);
        assert!(grocery.can_cancel(&order));
        order.apply_events(
            grocery
                .cancel_order(&order, CancellationReason::CustomerRequest, Some("Test".into()))
                .unwrap(),
        );
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_cancel_with_refundable_reason_refunds() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Restaurant, now);
        let mut order = card_order(now);

        let events = sm
            .cancel_order(&order, CancellationReason::OutOfStock, None)
            .unwrap();
        assert_eq!(events.len(), 2);
        order.apply_events(events);

        assert_eq!(order.status(), OrderStatus::Refunded);
        assert_eq!(order.cancellation_reason(), Some(CancellationReason::OutOfStock));
    }

    #[test]
    fn test_customer_cancel_does_not_refund_automatically() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Restaurant, now);
        let mut order = card_order(now);

        order.apply_events(
            sm.cancel_order(&order, CancellationReason::CustomerRequest, None)
                .unwrap(),
        );
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert!(sm.can_refund(&order));
    }

    #[test]
    fn test_terminal_order_cannot_be_cancelled() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Grocery, now);
        let mut order = card_order(now);
        drive(&sm, &mut order, &TO_OUT_FOR_DELIVERY);
        drive(&sm, &mut order, &[OrderStatus::Delivered]);

        assert!(!sm.can_cancel(&order));
    }

    #[test]
    fn test_refund_delivered_order() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Restaurant, now);
        let mut order = card_order(now);
        drive(&sm, &mut order, &TO_OUT_FOR_DELIVERY);
        drive(&sm, &mut order, &[OrderStatus::Delivered]);

        assert!(sm.can_refund(&order));
        order.apply_events(sm.process_refund(&order, Some("Quality issue".into())).unwrap());
        assert_eq!(order.status(), OrderStatus::Refunded);

        assert!(!sm.can_refund(&order));
        assert!(matches!(
            sm.process_refund(&order, None),
            Err(OrderError::RefundNotAllowed { .. })
        ));
    }

    #[test]
    fn test_cash_on_delivery_is_never_refundable() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Grocery, now);
        let mut order = place(Some(PaymentMethod::CashOnDelivery), now);
        drive(
            &sm,
            &mut order,
            &[
                OrderStatus::PaymentConfirmed,
                OrderStatus::Preparing,
                OrderStatus::ReadyForPickup,
                OrderStatus::OutForDelivery,
                OrderStatus::Delivered,
            ],
        );

        assert!(!sm.can_refund(&order));
        let err = sm.process_refund(&order, None).unwrap_err();
        assert!(matches!(err, OrderError::RefundNotAllowed { .. }));
        assert!(err.to_string().contains("CASH_ON_DELIVERY"));
    }

    #[test]
    fn test_refunded_via_execute_transition_is_gated() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Grocery, now);
        let order = card_order(now);
        assert!(matches!(
            sm.execute_transition(&order, OrderStatus::Refunded, None),
            Err(OrderError::RefundNotAllowed { .. })
        ));
    }

    #[test]
    fn test_timeout_in_payment_processing_cancels() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Restaurant, now);
        let mut order = card_order(now);
        drive(&sm, &mut order, &[OrderStatus::PaymentProcessing]);

        order.apply_events(sm.handle_status_timeout(&order).unwrap());
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.cancellation_reason(), Some(CancellationReason::PaymentFailed));
    }

    #[test]
    fn test_timeout_in_preparing_cancels_and_refunds() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Grocery, now);
        let mut order = card_order(now);
        drive(&sm, &mut order, &TO_OUT_FOR_DELIVERY[..3]);

        order.apply_events(sm.handle_status_timeout(&order).unwrap());
        assert_eq!(order.status(), OrderStatus::Refunded);
        assert_eq!(order.cancellation_reason(), Some(CancellationReason::SystemError));
    }

    #[test]
    fn test_delivery_timeout_fails_when_cancellation_is_forbidden() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Restaurant, now);
        let mut order = card_order(now);
        drive(&sm, &mut order, &TO_OUT_FOR_DELIVERY);

        order.apply_events(sm.handle_status_timeout(&order).unwrap());
        assert_eq!(order.status(), OrderStatus::Failed);
    }

    #[test]
    fn test_timeout_without_policy_is_noop() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Restaurant, now);
        assert!(sm.handle_status_timeout(&card_order(now)).unwrap().is_empty());
    }

    #[test]
    fn test_time_in_status_drives_manual_intervention() {
        let placed_at = Utc::now();
        let grocery = machine(BusinessVertical::Grocery, placed_at);
        let mut order = card_order(placed_at);
        drive(&grocery, &mut order, &TO_OUT_FOR_DELIVERY[..4]);
        assert!(!grocery.requires_manual_intervention(&order));

        let at_limit = machine(BusinessVertical::Grocery, placed_at + Duration::minutes(15));
        assert!(!at_limit.is_timed_out(&order));

        let later = machine(BusinessVertical::Grocery, placed_at + Duration::minutes(16));
        assert!(later.is_timed_out(&order));
        assert!(later.requires_manual_intervention(&order));
        assert_eq!(later.status_timeout(&order), Duration::minutes(15));
    }

    #[test]
    fn test_record_payment_confirms_or_cancels() {
        let now = Utc::now();
        let sm = machine(BusinessVertical::Restaurant, now);
        let mut order = card_order(now);
        drive(&sm, &mut order, &[OrderStatus::PaymentProcessing]);

        let mut paid = order.payment().cloned().unwrap();
        paid.status = PaymentStatus::Completed;
        let mut confirmed = order.clone();
        confirmed.apply_events(sm.record_payment(&order, paid).unwrap());
        assert_eq!(confirmed.status(), OrderStatus::PaymentConfirmed);

        let mut failed = order.payment().cloned().unwrap();
        failed.status = PaymentStatus::Failed;
        order.apply_events(sm.record_payment(&order, failed).unwrap());
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.cancellation_reason(), Some(CancellationReason::PaymentFailed));
    }
}
