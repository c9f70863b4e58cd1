//! Domain layer for delivery orchestration.
//!
//! This crate provides:
//! - Aggregate and DomainEvent traits for event-sourced entities
//! - Command trait and CommandHandler for command processing
//! - Order, Delivery and CourierProfile aggregates with their status tables
//! - Merchant workflow rules and the order state machine built on them
//! - Dispatch scoring

pub mod aggregate;
pub mod command;
pub mod courier;
pub mod delivery;
pub mod dispatch;
pub mod error;
pub mod merchant;
pub mod order;

pub use aggregate::{Aggregate, DomainEvent, SnapshotCapable};
pub use command::{Command, CommandHandler, CommandResult};
pub use courier::{
    ApprovalStatus, CourierError, CourierEvent, CourierProfile, CourierStatus, CurrentLoad,
    DeliveryCapacity, Parcel, RegisterCourier, VehicleInfo, VehicleType,
};
pub use delivery::{
    Delivery, DeliveryError, DeliveryEvent, DeliveryEventType, DeliveryStatus, OpenDelivery,
    TrackingUpdate,
};
pub use dispatch::{DeliveryAssignment, DispatchRequest};
pub use error::{DomainError, ErrorKind};
pub use merchant::{
    BusinessVertical, InMemoryMerchantDirectory, MerchantDirectory, MerchantWorkflowRules,
    RulesError, WorkflowRulesProvider,
};
pub use order::{
    CancelOrder, CancellationReason, Money, Order, OrderError, OrderEvent, OrderItem,
    OrderStateMachine, OrderStatus, OrderWorkflow, PaymentInfo, PaymentMethod, PaymentStatus,
    PlaceOrder,
};
