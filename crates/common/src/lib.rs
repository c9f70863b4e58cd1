//! Shared building blocks for the delivery orchestration core.
//!
//! Identifiers are strongly typed so that an order id can never be passed
//! where a courier id is expected. Time is read through the [`Clock`] trait
//! so that timeouts and ETAs can be tested deterministically.

pub mod clock;
pub mod time_range;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use time_range::{TimeRange, TimeRangeError};
pub use types::{AggregateId, CourierId, CustomerId, DeliveryId, MerchantId, OrderId, TenantId};
