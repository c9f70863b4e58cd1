//! Application services: aggregates loaded from and committed to the store.

mod courier;
mod delivery;
mod dispatch;
mod order;

pub use courier::CourierService;
pub use delivery::DeliveryService;
pub use dispatch::{DispatchCoordinator, Dispatched};
pub use order::OrderService;
