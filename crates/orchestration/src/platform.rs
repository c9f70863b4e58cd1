//! Wiring of the services over one event store.

use std::sync::Arc;

use common::{Clock, OrderId};
use domain::{MerchantDirectory, OrderWorkflow, WorkflowRulesProvider};
use event_store::EventStore;
use projections::{
    CourierAvailabilityView, DeliveryBoardView, OrderBoardView, ProjectionProcessor,
};

use crate::config::Config;
use crate::error::Result;
use crate::locator::ProjectedCourierLocator;
use crate::services::{CourierService, DeliveryService, DispatchCoordinator, OrderService};

/// The orchestration core, assembled.
///
/// All services share one store, one clock and one rules cache. Read models
/// are caught up on demand before they answer.
pub struct Platform<S: EventStore + Clone + 'static> {
    pub orders: OrderService<S>,
    pub couriers: CourierService<S>,
    pub dispatch: DispatchCoordinator<S, ProjectedCourierLocator<S>>,
    pub deliveries: DeliveryService<S>,
    rules: Arc<WorkflowRulesProvider>,
    processor: Arc<ProjectionProcessor<S>>,
    order_board: OrderBoardView,
    courier_availability: CourierAvailabilityView,
    delivery_board: DeliveryBoardView,
    clock: Arc<dyn Clock>,
}

impl<S: EventStore + Clone + 'static> Platform<S> {
    pub fn new(
        store: S,
        directory: Arc<dyn MerchantDirectory>,
        config: &Config,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let order_board = OrderBoardView::new();
        let courier_availability = CourierAvailabilityView::new();
        let delivery_board = DeliveryBoardView::new();

        let mut processor = ProjectionProcessor::new(store.clone());
        processor.register(Box::new(order_board.clone()));
        processor.register(Box::new(courier_availability.clone()));
        processor.register(Box::new(delivery_board.clone()));
        let processor = Arc::new(processor);

        let rules = Arc::new(WorkflowRulesProvider::new(directory));
        let workflow = OrderWorkflow::new(Arc::clone(&rules), Arc::clone(&clock));
        let retries = config.command_max_retries;

        let orders = OrderService::new(store.clone(), workflow, retries);
        let couriers = CourierService::new(store.clone(), Arc::clone(&clock), retries);
        let locator =
            ProjectedCourierLocator::new(Arc::clone(&processor), courier_availability.clone());
        let dispatch = DispatchCoordinator::new(
            store.clone(),
            couriers.clone(),
            locator,
            config,
            Arc::clone(&clock),
        );
        let deliveries = DeliveryService::new(
            store,
            orders.clone(),
            couriers.clone(),
            Arc::clone(&processor),
            delivery_board.clone(),
            config,
            Arc::clone(&clock),
        );

        tracing::debug!(
            projections = processor.projection_count(),
            "orchestration platform assembled"
        );

        Self {
            orders,
            couriers,
            dispatch,
            deliveries,
            rules,
            processor,
            order_board,
            courier_availability,
            delivery_board,
            clock,
        }
    }

    /// The shared merchant rules cache. Invalidate through it after a
    /// merchant's configuration changes.
    pub fn rules(&self) -> &WorkflowRulesProvider {
        &self.rules
    }

    /// Feeds committed events to the read models; returns how many were read.
    pub async fn catch_up(&self) -> Result<usize> {
        Ok(self.processor.run_catch_up().await?)
    }

    /// Resets every read model and replays the whole store into them.
    pub async fn rebuild_read_models(&self) -> Result<()> {
        Ok(self.processor.rebuild_all().await?)
    }

    pub fn order_board(&self) -> &OrderBoardView {
        &self.order_board
    }

    pub fn courier_availability(&self) -> &CourierAvailabilityView {
        &self.courier_availability
    }

    pub fn delivery_board(&self) -> &DeliveryBoardView {
        &self.delivery_board
    }

    /// Applies the timeout policy to every order past its status timeout.
    ///
    /// Meant to be called periodically by an outside scheduler. Returns the
    /// orders that were acted on. An order that cannot be handled is logged
    /// and left for the next sweep; it does not stop the others.
    #[tracing::instrument(skip(self))]
    pub async fn sweep_timeouts(&self) -> Result<Vec<OrderId>> {
        self.processor.run_catch_up().await?;

        let mut handled = Vec::new();
        for candidate in self.order_board.stalled_since(self.clock.now()).await {
            match self.orders.handle_status_timeout(candidate.order_id).await {
                Ok(result) if !result.is_noop() => handled.push(candidate.order_id),
                Ok(_) => {}
                Err(err) => {
                    metrics::counter!("orders_timeout_failures_total").increment(1);
                    tracing::warn!(
                        order_id = %candidate.order_id,
                        error = %err,
                        "timeout handling failed, continuing sweep"
                    );
                }
            }
        }

        if !handled.is_empty() {
            tracing::info!(orders = handled.len(), "timed-out orders handled");
        }
        Ok(handled)
    }
}
