use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of an event stream.
///
/// Every aggregate (order, delivery, courier profile) owns exactly one
/// stream; the typed identifiers below convert into this one when they
/// address the event store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(Uuid);

impl AggregateId {
    /// Creates a new random aggregate ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an aggregate ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AggregateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AggregateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AggregateId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<AggregateId> for Uuid {
    fn from(id: AggregateId) -> Self {
        id.0
    }
}

/// Declares a UUID-backed identifier that is distinct from every other one.
macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Declares a typed identifier that also names an event stream.
macro_rules! stream_id {
    ($(#[$meta:meta])* $name:ident) => {
        typed_id!($(#[$meta])* $name);

        impl From<$name> for AggregateId {
            fn from(id: $name) -> Self {
                AggregateId(id.0)
            }
        }

        impl From<AggregateId> for $name {
            fn from(id: AggregateId) -> Self {
                Self(id.0)
            }
        }
    };
}

typed_id!(
    /// Tenant (operator) that owns orders and deliveries.
    TenantId
);

typed_id!(
    /// Merchant whose workflow rules govern an order.
    MerchantId
);

typed_id!(
    /// Customer who placed an order.
    CustomerId
);

stream_id!(
    /// Identifier of an order aggregate.
    OrderId
);

stream_id!(
    /// Identifier of a delivery aggregate.
    DeliveryId
);

stream_id!(
    /// Identifier of a courier profile aggregate.
    CourierId
);
