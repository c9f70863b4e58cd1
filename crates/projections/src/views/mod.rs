//! Read model views for the query side.

pub mod courier_availability;
pub mod delivery_board;
pub mod order_board;

pub use courier_availability::{CourierAvailability, CourierAvailabilityView, NearbyCourier};
pub use delivery_board::{DeliveryBoardView, DeliverySummary};
pub use order_board::{OrderBoardView, OrderSummary, StatusEntry};
