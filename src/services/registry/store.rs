use tokio::sync::RwLock;

use super::error::RegistryError;
use super::notifier::PatchNotifier;
use super::types::{Patch, PatchEntry, Registration, ServiceName};

/// 已注册服务组
///
/// 写操作只在持有写锁期间修改列表，后续的补丁推送都在锁外基于快照进行。
#[derive(Debug, Default)]
pub struct RegistryStore {
    registrations: RwLock<Vec<Registration>>,
    notifier: PatchNotifier,
}

impl RegistryStore {
    pub fn new(notifier: PatchNotifier) -> Self {
        Self {
            registrations: RwLock::new(Vec::new()),
            notifier,
        }
    }

    pub fn notifier(&self) -> &PatchNotifier {
        &self.notifier
    }

    /// 注册服务
    ///
    /// 同一 `service_url` 再次注册时替换旧记录。写入后同步把已注册的依赖项推送给新服务，
    /// 推送失败作为返回错误，但注册本身已经生效；随后异步通知依赖此服务的其他服务。
    pub async fn add(&self, reg: Registration) -> Result<(), RegistryError> {
        let replaced = {
            let mut registrations = self.registrations.write().await;
            match registrations
                .iter()
                .position(|r| r.service_url == reg.service_url)
            {
                Some(index) => Some(std::mem::replace(&mut registrations[index], reg.clone())),
                None => {
                    registrations.push(reg.clone());
                    None
                }
            }
        };

        tracing::info!(
            service_name = %reg.service_name,
            service_url = %reg.service_url,
            replaced = replaced.is_some(),
            "Added service to registry"
        );

        let snapshot = self.snapshot().await;
        let backfill = self.send_required_services(&reg, &snapshot).await;

        let mut patch = Patch::added(vec![reg.entry()]);
        if let Some(previous) = replaced.filter(|p| p.service_name != reg.service_name) {
            patch.removed.push(previous.entry());
        }
        self.notifier.broadcast(&patch, &snapshot);

        backfill
    }

    /// 注销服务
    ///
    /// 先用移除前的记录通知依赖方，再在写锁内删除。
    pub async fn remove(&self, url: &str) -> Result<Registration, RegistryError> {
        let snapshot = self.snapshot().await;
        let Some(removed) = snapshot.iter().find(|r| r.service_url == url).cloned() else {
            return Err(RegistryError::NotFound {
                url: url.to_string(),
            });
        };

        self.notifier
            .broadcast(&Patch::removed(vec![removed.entry()]), &snapshot);

        {
            let mut registrations = self.registrations.write().await;
            registrations.retain(|r| r.service_url != url);
        }

        tracing::info!(
            service_name = %removed.service_name,
            service_url = %removed.service_url,
            "Removed service from registry"
        );

        Ok(removed)
    }

    // 主动查询, 把新服务依赖的已注册服务推送给它
    async fn send_required_services(
        &self,
        reg: &Registration,
        snapshot: &[Registration],
    ) -> Result<(), RegistryError> {
        if reg.required_services.is_empty() {
            return Ok(());
        }

        let mut patch = Patch::default();
        for required in &reg.required_services {
            patch.added.extend(
                snapshot
                    .iter()
                    .filter(|r| &r.service_name == required && r.service_url != reg.service_url)
                    .map(Registration::entry),
            );
        }

        tracing::debug!(
            service_name = %reg.service_name,
            providers = patch.added.len(),
            "Sending required services to new registration"
        );

        self.notifier
            .send_patch(&patch, &reg.service_update_url)
            .await
            .map_err(|source| RegistryError::Delivery {
                url: reg.service_update_url.clone(),
                source,
            })
    }

    pub async fn get(&self, url: &str) -> Option<Registration> {
        self.registrations
            .read()
            .await
            .iter()
            .find(|r| r.service_url == url)
            .cloned()
    }

    /// 当前某名称下的全部提供者
    pub async fn providers(&self, name: &ServiceName) -> Vec<PatchEntry> {
        self.registrations
            .read()
            .await
            .iter()
            .filter(|r| &r.service_name == name)
            .map(Registration::entry)
            .collect()
    }

    pub async fn snapshot(&self) -> Vec<Registration> {
        self.registrations.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.registrations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.registrations.read().await.is_empty()
    }
}
