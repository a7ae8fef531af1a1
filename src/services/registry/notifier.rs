use std::sync::Arc;

use tokio_util::task::TaskTracker;

use super::error::DeliveryError;
use super::types::{Patch, Registration};

/// 补丁通知器
///
/// 根据依赖关系把变更增量推送给相关的消费者。推送是尽力而为的：
/// 每个消费者一个独立任务，失败只记录日志，不重试也不排队。
#[derive(Debug, Clone)]
pub struct PatchNotifier {
    client: reqwest::Client,
    task_tracker: Arc<TaskTracker>,
}

impl Default for PatchNotifier {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl PatchNotifier {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            task_tracker: Arc::new(TaskTracker::new()),
        }
    }

    /// 向快照中所有依赖变更服务的注册项并发推送过滤后的补丁，返回派发数量
    pub fn broadcast(&self, full_patch: &Patch, registrations: &[Registration]) -> usize {
        let mut dispatched = 0;

        for consumer in registrations {
            let patch = full_patch.relevant_to(consumer);
            if patch.is_empty() {
                continue;
            }

            // 每个任务持有自己的注册项副本
            let consumer = consumer.clone();
            let notifier = self.clone();
            self.task_tracker.spawn(async move {
                match notifier.send_patch(&patch, &consumer.service_update_url).await {
                    Ok(()) => tracing::debug!(
                        service_name = %consumer.service_name,
                        update_url = %consumer.service_update_url,
                        added = patch.added.len(),
                        removed = patch.removed.len(),
                        "Delivered patch to dependent service"
                    ),
                    Err(e) => tracing::warn!(
                        service_name = %consumer.service_name,
                        update_url = %consumer.service_update_url,
                        error = %e,
                        "Failed to deliver patch, dropping it"
                    ),
                }
            });
            dispatched += 1;
        }

        dispatched
    }

    // 发送 patch 到指定更新地址
    pub async fn send_patch(&self, patch: &Patch, url: &str) -> Result<(), DeliveryError> {
        let response = self.client.post(url).json(patch).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    /// 等待所有正在进行的推送完成
    pub async fn flush(&self) {
        self.task_tracker.close();
        self.task_tracker.wait().await;
        self.task_tracker.reopen();
    }
}
