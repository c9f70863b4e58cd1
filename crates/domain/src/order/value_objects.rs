//! Order value objects.

use geo::Location;
use serde::{Deserialize, Serialize};

/// An amount of money in the smallest currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Money {
    cents: i64,
}

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    pub fn cents(&self) -> i64 {
        self.cents
    }

    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    pub fn times(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents * i64::from(quantity),
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Catalog reference of an ordered product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderItem {
    pub fn new(
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: ProductId::new(product_id),
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    pub fn total_price(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// Where the order is delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub street: String,
    pub city: String,
    pub district: Option<String>,
    pub postal_code: Option<String>,
    pub location: Option<Location>,
    pub instructions: Option<String>,
}

impl DeliveryAddress {
    pub fn new(street: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
            district: None,
            postal_code: None,
            location: None,
            instructions: None,
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CashOnDelivery,
    CreditCard,
    DebitCard,
    Mpesa,
    MbWay,
    Multibanco,
}

impl PaymentMethod {
    /// Cash collected at the door cannot be refunded through the platform.
    pub fn supports_refunds(&self) -> bool {
        !matches!(self, PaymentMethod::CashOnDelivery)
    }

    pub fn is_cash_on_delivery(&self) -> bool {
        matches!(self, PaymentMethod::CashOnDelivery)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "CASH_ON_DELIVERY",
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::DebitCard => "DEBIT_CARD",
            PaymentMethod::Mpesa => "MPESA",
            PaymentMethod::MbWay => "MB_WAY",
            PaymentMethod::Multibanco => "MULTIBANCO",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub amount: Money,
    pub status: PaymentStatus,
    /// Gateway reference, absent until the gateway has seen the payment.
    pub reference: Option<String>,
}

impl PaymentInfo {
    pub fn new(method: PaymentMethod, amount: Money) -> Self {
        Self {
            method,
            amount,
            status: PaymentStatus::Pending,
            reference: None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, PaymentStatus::Failed | PaymentStatus::Cancelled)
    }
}

/// Why an order was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancellationReason {
    CustomerRequest,
    MerchantRequest,
    PaymentFailed,
    OutOfStock,
    BusinessClosed,
    DeliveryUnavailable,
    SystemError,
    FraudSuspected,
}

impl CancellationReason {
    /// Cancellations the customer did not cause are refunded without review.
    pub fn allows_automatic_refund(&self) -> bool {
        matches!(
            self,
            CancellationReason::MerchantRequest
                | CancellationReason::OutOfStock
                | CancellationReason::BusinessClosed
                | CancellationReason::DeliveryUnavailable
                | CancellationReason::SystemError
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CancellationReason::CustomerRequest => "CUSTOMER_REQUEST",
            CancellationReason::MerchantRequest => "MERCHANT_REQUEST",
            CancellationReason::PaymentFailed => "PAYMENT_FAILED",
            CancellationReason::OutOfStock => "OUT_OF_STOCK",
            CancellationReason::BusinessClosed => "BUSINESS_CLOSED",
            CancellationReason::DeliveryUnavailable => "DELIVERY_UNAVAILABLE",
            CancellationReason::SystemError => "SYSTEM_ERROR",
            CancellationReason::FraudSuspected => "FRAUD_SUSPECTED",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CancellationReason::CustomerRequest => "Cancelled at the customer's request",
            CancellationReason::MerchantRequest => "Cancelled by the merchant",
            CancellationReason::PaymentFailed => "Payment could not be completed",
            CancellationReason::OutOfStock => "Items are out of stock",
            CancellationReason::BusinessClosed => "Merchant is closed or did not accept in time",
            CancellationReason::DeliveryUnavailable => "No delivery could be completed",
            CancellationReason::SystemError => "Cancelled after a processing failure",
            CancellationReason::FraudSuspected => "Cancelled on suspicion of fraud",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_display_and_arithmetic() {
        let price = Money::from_cents(1_250);
        assert_eq!(price.times(3), Money::from_cents(3_750));
        assert_eq!(price.to_string(), "12.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        let total: Money = [price, Money::from_cents(50)].into_iter().sum();
        assert_eq!(total.cents(), 1_300);
    }

    #[test]
    fn item_total_is_quantity_times_unit_price() {
        let item = OrderItem::new("sku-1", "Matapa", 2, Money::from_cents(450));
        assert_eq!(item.total_price(), Money::from_cents(900));
    }

    #[test]
    fn only_cash_on_delivery_is_not_refundable() {
        assert!(!PaymentMethod::CashOnDelivery.supports_refunds());
        for method in [
            PaymentMethod::CreditCard,
            PaymentMethod::DebitCard,
            PaymentMethod::Mpesa,
            PaymentMethod::MbWay,
            PaymentMethod::Multibanco,
        ] {
            assert!(method.supports_refunds(), "{method:?}");
        }
    }

    #[test]
    fn customer_and_payment_cancellations_are_not_auto_refunded() {
        assert!(!CancellationReason::CustomerRequest.allows_automatic_refund());
        assert!(!CancellationReason::PaymentFailed.allows_automatic_refund());
        assert!(!CancellationReason::FraudSuspected.allows_automatic_refund());
        assert!(CancellationReason::BusinessClosed.allows_automatic_refund());
        assert!(CancellationReason::DeliveryUnavailable.allows_automatic_refund());
    }

    #[test]
    fn payment_method_serializes_screaming_snake() {
        let json = serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap();
        assert_eq!(json, "\"CASH_ON_DELIVERY\"");
    }
}
