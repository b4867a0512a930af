//! Shared application state and how it is wired for each process mode.

use std::sync::{Arc, OnceLock, Weak};

use async_trait::async_trait;
use billing::{
    BillingLedger, HttpOrderNotifier, NotifyError, OrderNotifier, PaymentCapturedNotice,
    RefundedNotice,
};
use common::OrderId;
use inventory::{InventoryConfig, InventoryStore};
use menu::MenuCatalog;
use orders::{
    BillingService, HttpBillingService, HttpInventoryService, HttpMenuService,
    InMemoryOrderRepository, InventoryService, MenuService, OrderEvent, Orchestrator,
};

use crate::config::{Config, ServiceKind};
use crate::error::StartupError;

/// The orchestrator as the API holds it: leaf gateways are chosen at
/// startup.
pub type AppOrchestrator = Orchestrator<
    InMemoryOrderRepository,
    Arc<dyn MenuService>,
    Arc<dyn InventoryService>,
    Arc<dyn BillingService>,
>;

/// Shared application state accessible from all handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: MenuCatalog,
    pub inventory: InventoryStore,
    pub ledger: BillingLedger,
    pub orchestrator: Arc<AppOrchestrator>,
}

impl AppState {
    /// Wires every service in one process: the orchestrator calls the other
    /// stores directly and billing reports straight to the orchestrator.
    pub fn in_process(inventory_config: InventoryConfig) -> Self {
        let catalog = MenuCatalog::new();
        let inventory = InventoryStore::with_config(inventory_config);
        let notifier = Arc::new(LocalOrderNotifier::default());
        let ledger = BillingLedger::new(notifier.clone());

        let orchestrator = Arc::new(Orchestrator::new(
            InMemoryOrderRepository::new(),
            Arc::new(catalog.clone()) as Arc<dyn MenuService>,
            Arc::new(inventory.clone()) as Arc<dyn InventoryService>,
            Arc::new(ledger.clone()) as Arc<dyn BillingService>,
        ));
        notifier.bind(&orchestrator);

        Self {
            catalog,
            inventory,
            ledger,
            orchestrator,
        }
    }

    /// Wires the state for `config.service`.
    ///
    /// A single-service process reaches its peers over HTTP at the
    /// configured URLs.
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let inventory_config = InventoryConfig {
            default_stock: config.default_stock,
            ..InventoryConfig::default()
        };

        if config.service == ServiceKind::All {
            return Ok(Self::in_process(inventory_config));
        }

        let urls = &config.services;
        let notifier = HttpOrderNotifier::new(config.orders_url.clone(), urls.timeout)?;
        let orchestrator = Orchestrator::new(
            InMemoryOrderRepository::new(),
            Arc::new(HttpMenuService::from_urls(urls)?) as Arc<dyn MenuService>,
            Arc::new(HttpInventoryService::from_urls(urls)?) as Arc<dyn InventoryService>,
            Arc::new(HttpBillingService::from_urls(urls)?) as Arc<dyn BillingService>,
        );

        Ok(Self {
            catalog: MenuCatalog::new(),
            inventory: InventoryStore::with_config(inventory_config),
            ledger: BillingLedger::new(Arc::new(notifier)),
            orchestrator: Arc::new(orchestrator),
        })
    }
}

/// Delivers billing callbacks to an orchestrator in the same process.
///
/// Holds the orchestrator weakly, since the orchestrator owns the ledger
/// that owns this notifier.
#[derive(Default)]
pub struct LocalOrderNotifier {
    orchestrator: OnceLock<Weak<AppOrchestrator>>,
}

impl LocalOrderNotifier {
    fn bind(&self, orchestrator: &Arc<AppOrchestrator>) {
        // Bound once during wiring; a second bind is ignored.
        let _ = self.orchestrator.set(Arc::downgrade(orchestrator));
    }

    async fn deliver(&self, order_id: OrderId, event: OrderEvent) -> Result<(), NotifyError> {
        let orchestrator = self
            .orchestrator
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| NotifyError("orders service is not running".to_string()))?;

        orchestrator
            .handle_event(order_id, event)
            .await
            .map(|_| ())
            .map_err(|e| NotifyError(e.to_string()))
    }
}

#[async_trait]
impl OrderNotifier for LocalOrderNotifier {
    async fn payment_captured(
        &self,
        order_id: OrderId,
        notice: PaymentCapturedNotice,
    ) -> Result<(), NotifyError> {
        let event = OrderEvent::PaymentCaptured {
            payment_intent_id: Some(notice.payment_intent_id),
        };
        self.deliver(order_id, event).await
    }

    async fn refunded(&self, order_id: OrderId, notice: RefundedNotice) -> Result<(), NotifyError> {
        let event = OrderEvent::Refunded {
            refund_id: Some(notice.refund_id),
        };
        self.deliver(order_id, event).await
    }
}
