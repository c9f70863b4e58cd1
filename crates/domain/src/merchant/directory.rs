use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::MerchantId;
use tokio::sync::RwLock;

use super::BusinessVertical;

/// Resolves a merchant's vertical. Backed by the merchant catalog in
/// production.
#[async_trait]
pub trait MerchantDirectory: Send + Sync {
    async fn vertical_of(&self, merchant_id: MerchantId) -> Option<BusinessVertical>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryMerchantDirectory {
    merchants: Arc<RwLock<HashMap<MerchantId, BusinessVertical>>>,
}

impl InMemoryMerchantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the merchant or changes its vertical. Cached rules are not
    /// touched; invalidate them on the provider.
    pub async fn register(&self, merchant_id: MerchantId, vertical: BusinessVertical) {
        self.merchants.write().await.insert(merchant_id, vertical);
    }

    pub async fn remove(&self, merchant_id: MerchantId) {
        self.merchants.write().await.remove(&merchant_id);
    }
}

#[async_trait]
impl MerchantDirectory for InMemoryMerchantDirectory {
    async fn vertical_of(&self, merchant_id: MerchantId) -> Option<BusinessVertical> {
        self.merchants.read().await.get(&merchant_id).copied()
    }
}
