use std::collections::HashMap;
use std::sync::Arc;

use common::MerchantId;
use tokio::sync::RwLock;

use super::{MerchantDirectory, MerchantWorkflowRules, RulesError};

/// Serves workflow rules per merchant.
///
/// Rules are computed from the merchant's vertical on first use and cached
/// until [`Self::update_rules`], [`Self::reset_to_default`] or
/// [`Self::invalidate`] replaces them. Callers get an `Arc` snapshot, so a
/// later update never changes rules a running command already holds.
pub struct WorkflowRulesProvider {
    directory: Arc<dyn MerchantDirectory>,
    cache: RwLock<HashMap<MerchantId, Arc<MerchantWorkflowRules>>>,
}

impl WorkflowRulesProvider {
    pub fn new(directory: Arc<dyn MerchantDirectory>) -> Self {
        Self {
            directory,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Cached rules, or the vertical's defaults on first use.
    ///
    /// Fails with a not-found error when the directory does not know the
    /// merchant.
    pub async fn get_rules(
        &self,
        merchant_id: MerchantId,
    ) -> Result<Arc<MerchantWorkflowRules>, RulesError> {
        if let Some(rules) = self.cache.read().await.get(&merchant_id) {
            return Ok(Arc::clone(rules));
        }

        let defaults = Arc::new(self.defaults_for(merchant_id).await?);

        // Another task may have filled the slot while the directory was queried.
        let mut cache = self.cache.write().await;
        let rules = cache.entry(merchant_id).or_insert(defaults);
        tracing::debug!(%merchant_id, vertical = %rules.vertical, "Workflow rules cached");
        Ok(Arc::clone(rules))
    }

    /// Replaces the cached rules for `rules.merchant_id`.
    pub async fn update_rules(
        &self,
        merchant_id: MerchantId,
        rules: MerchantWorkflowRules,
    ) -> Result<Arc<MerchantWorkflowRules>, RulesError> {
        if rules.merchant_id != merchant_id {
            return Err(RulesError::MerchantMismatch {
                expected: merchant_id,
                actual: rules.merchant_id,
            });
        }
        self.ensure_exists(merchant_id).await?;
        rules.validate()?;

        let rules = Arc::new(rules);
        self.cache
            .write()
            .await
            .insert(merchant_id, Arc::clone(&rules));

        tracing::info!(%merchant_id, "Workflow rules updated");
        Ok(rules)
    }

    /// Discards custom rules in favour of the vertical's defaults.
    pub async fn reset_to_default(
        &self,
        merchant_id: MerchantId,
    ) -> Result<Arc<MerchantWorkflowRules>, RulesError> {
        let defaults = Arc::new(self.defaults_for(merchant_id).await?);
        self.cache
            .write()
            .await
            .insert(merchant_id, Arc::clone(&defaults));

        tracing::info!(%merchant_id, "Workflow rules reset to vertical defaults");
        Ok(defaults)
    }

    /// Drops the cached entry; the next read recomputes it.
    pub async fn invalidate(&self, merchant_id: MerchantId) {
        self.cache.write().await.remove(&merchant_id);
    }

    pub async fn cached_merchants(&self) -> usize {
        self.cache.read().await.len()
    }

    async fn defaults_for(&self, merchant_id: MerchantId) -> Result<MerchantWorkflowRules, RulesError> {
        let vertical = self
            .directory
            .vertical_of(merchant_id)
            .await
            .ok_or(RulesError::MerchantNotFound(merchant_id))?;
        Ok(MerchantWorkflowRules::default_for(merchant_id, vertical))
    }

    async fn ensure_exists(&self, merchant_id: MerchantId) -> Result<(), RulesError> {
        self.directory
            .vertical_of(merchant_id)
            .await
            .map(|_| ())
            .ok_or(RulesError::MerchantNotFound(merchant_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merchant::{BusinessVertical, InMemoryMerchantDirectory};
    use crate::order::OrderStatus;
    use chrono::Duration;

    async fn provider_with(
        vertical: BusinessVertical,
    ) -> (WorkflowRulesProvider, InMemoryMerchantDirectory, MerchantId) {
        let directory = InMemoryMerchantDirectory::new();
        let merchant_id = MerchantId::new();
        directory.register(merchant_id, vertical).await;
        let provider = WorkflowRulesProvider::new(Arc::new(directory.clone()));
        (provider, directory, merchant_id)
    }

    #[tokio::test]
    async fn test_get_rules_derives_from_vertical_and_caches() {
        let (provider, _, merchant_id) = provider_with(BusinessVertical::Grocery).await;

        let first = provider.get_rules(merchant_id).await.unwrap();
        let second = provider.get_rules(merchant_id).await.unwrap();

        assert_eq!(first.vertical, BusinessVertical::Grocery);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.cached_merchants().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_merchant_is_not_found() {
        let (provider, _, _) = provider_with(BusinessVertical::Grocery).await;
        let result = provider.get_rules(MerchantId::new()).await;
        assert!(matches!(result, Err(RulesError::MerchantNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_then_reset() {
        let (provider, _, merchant_id) = provider_with(BusinessVertical::Restaurant).await;

        let mut custom = MerchantWorkflowRules::default_for(merchant_id, BusinessVertical::Restaurant);
        custom.auto_accept_orders = true;
        provider.update_rules(merchant_id, custom).await.unwrap();
        assert!(provider.get_rules(merchant_id).await.unwrap().auto_accept_orders);

        provider.reset_to_default(merchant_id).await.unwrap();
        assert!(!provider.get_rules(merchant_id).await.unwrap().auto_accept_orders);
    }

    #[tokio::test]
    async fn test_update_validates_merchant_and_timeouts() {
        let (provider, _, merchant_id) = provider_with(BusinessVertical::Restaurant).await;

        let stranger = MerchantId::new();
        let rules = MerchantWorkflowRules::default_for(stranger, BusinessVertical::Restaurant);
        assert!(matches!(
            provider.update_rules(stranger, rules.clone()).await,
            Err(RulesError::MerchantNotFound(_))
        ));
        assert!(matches!(
            provider.update_rules(merchant_id, rules).await,
            Err(RulesError::MerchantMismatch { .. })
        ));

        let bad = MerchantWorkflowRules::default_for(merchant_id, BusinessVertical::Restaurant)
            .with_status_timeout(OrderStatus::Preparing, Duration::minutes(-1));
        assert!(matches!(
            provider.update_rules(merchant_id, bad).await,
            Err(RulesError::NonPositiveTimeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalidate_picks_up_directory_changes() {
        let (provider, directory, merchant_id) = provider_with(BusinessVertical::Restaurant).await;
        provider.get_rules(merchant_id).await.unwrap();

        directory.register(merchant_id, BusinessVertical::Grocery).await;
        assert_eq!(
            provider.get_rules(merchant_id).await.unwrap().vertical,
            BusinessVertical::Restaurant
        );

        provider.invalidate(merchant_id).await;
        assert_eq!(
            provider.get_rules(merchant_id).await.unwrap().vertical,
            BusinessVertical::Grocery
        );
    }
}
