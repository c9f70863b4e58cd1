//! Application layer of the delivery orchestration core.
//!
//! This crate provides:
//! - [`OrderService`] driving orders through the merchant's state machine
//! - [`CourierService`] tracking courier approval, duty status and load
//! - [`DispatchCoordinator`] ranking couriers and opening deliveries
//! - [`DeliveryService`] keeping orders and courier capacity in step with
//!   delivery progress
//! - [`Platform`] wiring all of them over one event store
//!
//! Commands are version-checked against the aggregate they were decided on
//! and retried on conflict.

pub mod config;
pub mod error;
pub mod locator;
pub mod platform;
pub mod retry;
pub mod services;
pub mod telemetry;

pub use config::{Config, LogFormat};
pub use error::{OrchestrationError, Result};
pub use locator::{CourierLocator, ProjectedCourierLocator};
pub use platform::Platform;
pub use services::{CourierService, DeliveryService, DispatchCoordinator, Dispatched, OrderService};
