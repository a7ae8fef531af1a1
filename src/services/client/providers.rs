use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::error::ClientError;
use crate::services::registry::{Patch, ServiceName};

/// 消费者本地维护的依赖服务地址表（服务名 -> 地址列表）
#[derive(Debug, Clone, Default)]
pub struct Providers {
    services: Arc<RwLock<HashMap<ServiceName, Vec<String>>>>,
}

impl Providers {
    pub fn new() -> Self {
        Self::default()
    }

    /// 合并注册中心推送的补丁
    pub async fn update(&self, patch: &Patch) {
        let mut services = self.services.write().await;

        for entry in &patch.added {
            let urls = services.entry(entry.name.clone()).or_default();
            if !urls.contains(&entry.url) {
                tracing::info!(service_name = %entry.name, url = %entry.url, "Provider added");
                urls.push(entry.url.clone());
            }
        }

        for entry in &patch.removed {
            if let Some(urls) = services.get_mut(&entry.name) {
                let before = urls.len();
                urls.retain(|url| url != &entry.url);
                if urls.len() != before {
                    tracing::info!(service_name = %entry.name, url = %entry.url, "Provider removed");
                }
            }
        }

        services.retain(|_, urls| !urls.is_empty());
    }

    pub async fn get_provider(&self, name: &ServiceName) -> Result<String, ClientError> {
        self.services
            .read()
            .await
            .get(name)
            .and_then(|urls| urls.first().cloned())
            .ok_or_else(|| ClientError::NoProvider(name.clone()))
    }

    pub async fn get_providers(&self, name: &ServiceName) -> Vec<String> {
        self.services
            .read()
            .await
            .get(name)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::registry::PatchEntry;

    fn log_entry(url: &str) -> PatchEntry {
        PatchEntry {
            name: ServiceName::LOG_SERVICE,
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn test_update_merges_added_and_removed() {
        let providers = Providers::new();
        providers
            .update(&Patch::added(vec![log_entry("http://a"), log_entry("http://b")]))
            .await;
        // 重复推送不会产生重复地址
        providers.update(&Patch::added(vec![log_entry("http://a")])).await;
        assert_eq!(
            providers.get_providers(&ServiceName::LOG_SERVICE).await,
            vec!["http://a".to_string(), "http://b".to_string()]
        );

        providers.update(&Patch::removed(vec![log_entry("http://a")])).await;
        assert_eq!(
            providers.get_provider(&ServiceName::LOG_SERVICE).await.unwrap(),
            "http://b"
        );

        providers.update(&Patch::removed(vec![log_entry("http://b")])).await;
        assert!(matches!(
            providers.get_provider(&ServiceName::LOG_SERVICE).await,
            Err(ClientError::NoProvider(_))
        ));
    }
}
