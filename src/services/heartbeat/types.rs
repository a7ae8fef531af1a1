use std::time::Duration;

use thiserror::Error;

use crate::services::registry::Registration;

// 心跳监测配置
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// 两轮探测之间的间隔
    pub interval: Duration,
    /// 每轮最多尝试次数
    pub max_attempts: u32,
    /// 失败后重试前的等待时间
    pub retry_backoff: Duration,
    /// 下线服务最多再探测的轮数，超过后不再监测；`None` 表示一直探测
    pub max_down_rounds: Option<u32>,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(4),
            max_attempts: 3,
            retry_backoff: Duration::from_secs(1),
            max_down_rounds: Some(75),
        }
    }
}

/// 单次探测失败原因
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Heartbeat endpoint responded with status {status}")]
    Status { status: u16 },
}

// 被监测的服务及其健康状态
#[derive(Debug, Clone)]
pub struct TrackedService {
    pub registration: Registration,
    pub healthy: bool,
    /// 下线后连续失败的轮数
    pub down_rounds: u32,
}

impl TrackedService {
    pub fn healthy(registration: Registration) -> Self {
        Self {
            registration,
            healthy: true,
            down_rounds: 0,
        }
    }

    pub fn down(registration: Registration) -> Self {
        Self {
            registration,
            healthy: false,
            down_rounds: 0,
        }
    }
}

// 一轮探测后需要执行的状态迁移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    Evict,
    Restore,
}

impl Transition {
    pub fn decide(was_healthy: bool, probe_passed: bool) -> Self {
        match (was_healthy, probe_passed) {
            (true, false) => Transition::Evict,
            (false, true) => Transition::Restore,
            _ => Transition::None,
        }
    }
}
