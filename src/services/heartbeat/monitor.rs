use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use dashmap::DashMap;
use futures::future::join_all;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::types::{HeartbeatConfig, ProbeError, TrackedService, Transition};
use crate::services::registry::{RegistryError, RegistryStore};

/// 心跳监测器
///
/// 每个注册表只运行一个后台循环。每轮并发探测所有被监测的服务，
/// 全部完成后再等待下一轮。连续失败达到上限的服务会被移出注册表并标记为下线，
/// 之后探测成功时重新加入。下线超过 `max_down_rounds` 轮或被主动注销的服务不再监测。
#[derive(Debug)]
pub struct HeartbeatMonitor {
    store: Arc<RegistryStore>,
    client: reqwest::Client,
    config: HeartbeatConfig,
    // 服务地址 -> 监测状态，包含已被驱逐的服务
    tracked: Arc<DashMap<String, TrackedService>>,
    started: OnceLock<()>,
    shutdown: CancellationToken,
    // 后台循环和每轮的探测任务
    task_tracker: TaskTracker,
}

impl HeartbeatMonitor {
    pub fn new(store: Arc<RegistryStore>, client: reqwest::Client, config: HeartbeatConfig) -> Self {
        Self {
            store,
            client,
            config,
            tracked: Arc::new(DashMap::new()),
            started: OnceLock::new(),
            shutdown: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        }
    }

    /// 启动后台循环，多次调用只会启动一次；返回本次调用是否真正启动了循环
    pub fn start(self: &Arc<Self>) -> bool {
        let mut spawned = false;
        self.started.get_or_init(|| {
            let monitor = Arc::clone(self);
            self.task_tracker.spawn(async move { monitor.run().await });
            spawned = true;
        });

        if spawned {
            tracing::info!(
                interval = ?self.config.interval,
                max_attempts = self.config.max_attempts,
                "Heartbeat monitor started"
            );
        }
        spawned
    }

    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.started.get().is_some() && !self.shutdown.is_cancelled()
    }

    /// 停止后台循环并等待进行中的探测任务结束，返回后不会再修改注册表
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;
    }

    /// 不再监测该地址，返回之前是否在监测
    ///
    /// 服务主动注销时调用，避免已下线的服务被继续探测并在恢复后重新加入注册表。
    pub fn forget(&self, url: &str) -> bool {
        let forgotten = self.tracked.remove(url).is_some();
        if forgotten {
            tracing::debug!(service_url = %url, "Service no longer monitored");
        }
        forgotten
    }

    /// 当前记录的健康状态，未被监测时返回 `None`
    pub fn health_of(&self, url: &str) -> Option<bool> {
        self.tracked.get(url).map(|entry| entry.healthy)
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    async fn run(&self) {
        // interval 不接受零周期
        let period = self.config.interval.max(Duration::from_millis(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                probed = self.run_round() => {
                    tracing::debug!(probed, "Heartbeat round completed");
                }
            }
        }

        tracing::info!("Heartbeat monitor stopped");
    }

    /// 执行一轮探测，返回本轮探测的服务数量
    pub async fn run_round(&self) -> usize {
        if self.shutdown.is_cancelled() {
            return 0;
        }
        self.sync_tracked().await;

        let targets: Vec<TrackedService> =
            self.tracked.iter().map(|entry| entry.value().clone()).collect();

        let handles: Vec<_> = targets
            .into_iter()
            .map(|service| {
                let store = self.store.clone();
                let tracked = self.tracked.clone();
                let client = self.client.clone();
                let config = self.config.clone();
                let shutdown = self.shutdown.clone();
                self.task_tracker.spawn(async move {
                    Self::check_service(store, tracked, client, config, shutdown, service).await;
                })
            })
            .collect();

        let probed = handles.len();
        for result in join_all(handles).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Heartbeat task failed");
            }
        }
        probed
    }

    // 把注册表当前成员同步到监测表
    async fn sync_tracked(&self) {
        let current = self.store.snapshot().await;
        let urls: HashSet<&str> = current.iter().map(|r| r.service_url.as_str()).collect();

        for reg in &current {
            self.tracked
                .entry(reg.service_url.clone())
                .and_modify(|service| {
                    service.registration = reg.clone();
                    service.healthy = true;
                    service.down_rounds = 0;
                })
                .or_insert_with(|| TrackedService::healthy(reg.clone()));
        }

        // 已主动注销的健康服务不再监测，被驱逐的服务继续探测以便恢复
        self.tracked
            .retain(|url, service| !service.healthy || urls.contains(url.as_str()));
    }

    async fn check_service(
        store: Arc<RegistryStore>,
        tracked: Arc<DashMap<String, TrackedService>>,
        client: reqwest::Client,
        config: HeartbeatConfig,
        shutdown: CancellationToken,
        service: TrackedService,
    ) {
        let reg = service.registration;
        let result = tokio::select! {
            _ = shutdown.cancelled() => return,
            result = Self::probe(&client, &reg.heartbeat_url, &config) => result,
        };
        let passed = match result {
            Ok(attempts) => {
                tracing::debug!(
                    service_name = %reg.service_name,
                    attempts,
                    "Heartbeat check passed"
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    service_name = %reg.service_name,
                    heartbeat_url = %reg.heartbeat_url,
                    attempts = config.max_attempts,
                    error = %e,
                    "Heartbeat check failed"
                );
                false
            }
        };

        match Transition::decide(service.healthy, passed) {
            Transition::None if !passed => {
                // 仍处于下线状态
                let exhausted = tracked
                    .get_mut(&reg.service_url)
                    .map(|mut entry| {
                        entry.down_rounds += 1;
                        config
                            .max_down_rounds
                            .is_some_and(|max| entry.down_rounds >= max)
                    })
                    .unwrap_or(false);
                if exhausted {
                    tracked.remove_if(&reg.service_url, |_, entry| !entry.healthy);
                    tracing::warn!(
                        service_name = %reg.service_name,
                        service_url = %reg.service_url,
                        "Service stayed down, no longer monitored"
                    );
                }
            }
            Transition::None => {}
            Transition::Evict => match store.remove(&reg.service_url).await {
                Ok(_) => {
                    tracing::warn!(
                        service_name = %reg.service_name,
                        service_url = %reg.service_url,
                        "Service evicted after failed heartbeats"
                    );
                    tracked.insert(reg.service_url.clone(), TrackedService::down(reg));
                }
                Err(RegistryError::NotFound { .. }) => {
                    // 本轮期间已被主动注销
                    tracked.remove(&reg.service_url);
                }
                Err(e) => {
                    tracing::error!(service_url = %reg.service_url, error = %e, "Failed to evict service");
                }
            },
            Transition::Restore => {
                // 探测期间被注销的服务不再恢复
                let still_tracked = tracked
                    .get_mut(&reg.service_url)
                    .map(|mut entry| {
                        entry.healthy = true;
                        entry.down_rounds = 0;
                    })
                    .is_some();
                if !still_tracked {
                    return;
                }
                tracing::info!(
                    service_name = %reg.service_name,
                    service_url = %reg.service_url,
                    "Service recovered, restoring registration"
                );
                if let Err(e) = store.add(reg).await {
                    tracing::warn!(error = %e, "Restored service but dependency backfill failed");
                }
            }
        }
    }

    // 带重试的探测，成功时返回使用的尝试次数
    async fn probe(
        client: &reqwest::Client,
        url: &str,
        config: &HeartbeatConfig,
    ) -> Result<u32, ProbeError> {
        let max_attempts = config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match Self::probe_once(client, url).await {
                Ok(()) => return Ok(attempt),
                Err(e) if attempt >= max_attempts => return Err(e),
                Err(e) => {
                    tracing::debug!(heartbeat_url = %url, attempt, error = %e, "Heartbeat attempt failed, retrying");
                    tokio::time::sleep(config.retry_backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn probe_once(client: &reqwest::Client, url: &str) -> Result<(), ProbeError> {
        let response = client.get(url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ProbeError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
