//! Delivery commands.

use common::{AggregateId, CourierId, DeliveryId, OrderId, TenantId};
use geo::Route;

use crate::command::Command;
use crate::courier::Parcel;

use super::Delivery;

/// Opens a delivery for an order, bound to a courier and a planned route.
#[derive(Debug, Clone)]
pub struct OpenDelivery {
    pub delivery_id: DeliveryId,
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub courier_id: CourierId,
    pub route: Route,
    pub parcel: Parcel,
}

impl OpenDelivery {
    pub fn new(
        tenant_id: TenantId,
        order_id: OrderId,
        courier_id: CourierId,
        route: Route,
        parcel: Parcel,
    ) -> Self {
        Self {
            delivery_id: DeliveryId::new(),
            tenant_id,
            order_id,
            courier_id,
            route,
            parcel,
        }
    }
}

impl Command for OpenDelivery {
    type Aggregate = Delivery;

    fn aggregate_id(&self) -> AggregateId {
        self.delivery_id.into()
    }
}
