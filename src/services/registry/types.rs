use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

// 服务名称（枚举式字符串标识）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceName(Cow<'static, str>);

impl ServiceName {
    pub const LOG_SERVICE: ServiceName = ServiceName(Cow::Borrowed("LogService"));
    pub const GRADING_SERVICE: ServiceName = ServiceName(Cow::Borrowed("GradingService"));
    pub const PORTAL_SERVICE: ServiceName = ServiceName(Cow::Borrowed("PortalService"));

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ServiceName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// 服务注册信息
///
/// `service_url` 是注册表内的唯一键，`required_services` 按名称描述依赖关系，
/// 每次解析都扫描当前注册表，而不是保存对其他注册项的引用。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(rename = "ServiceName")]
    pub service_name: ServiceName,
    #[serde(rename = "ServiceURL")]
    pub service_url: String,
    #[serde(
        rename = "RequiredServices",
        default,
        deserialize_with = "nullable_list::deserialize"
    )]
    pub required_services: Vec<ServiceName>,
    #[serde(rename = "ServiceUpdateURL", default)]
    pub service_update_url: String,
    #[serde(rename = "HeartbeatURL", default)]
    pub heartbeat_url: String,
}

impl Registration {
    /// 是否依赖指定名称的服务
    pub fn depends_on(&self, name: &ServiceName) -> bool {
        self.required_services.contains(name)
    }

    pub fn entry(&self) -> PatchEntry {
        PatchEntry {
            name: self.service_name.clone(),
            url: self.service_url.clone(),
        }
    }
}

// 单条成员变更
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatchEntry {
    #[serde(rename = "Name")]
    pub name: ServiceName,
    #[serde(rename = "URL")]
    pub url: String,
}

/// 成员变更增量
///
/// 空列表在线上编码为 `null`，解码时 `null` 或缺失字段都视为空列表。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    #[serde(rename = "Added", default, with = "nullable_list")]
    pub added: Vec<PatchEntry>,
    #[serde(rename = "Removed", default, with = "nullable_list")]
    pub removed: Vec<PatchEntry>,
}

impl Patch {
    pub fn added(entries: Vec<PatchEntry>) -> Self {
        Self {
            added: entries,
            removed: Vec::new(),
        }
    }

    pub fn removed(entries: Vec<PatchEntry>) -> Self {
        Self {
            added: Vec::new(),
            removed: entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// 过滤出与某个消费者相关的部分：名称在其依赖列表中，且不是它自己
    pub fn relevant_to(&self, consumer: &Registration) -> Patch {
        let keep = |entry: &&PatchEntry| {
            consumer.depends_on(&entry.name) && entry.url != consumer.service_url
        };
        Patch {
            added: self.added.iter().filter(keep).cloned().collect(),
            removed: self.removed.iter().filter(keep).cloned().collect(),
        }
    }
}

mod nullable_list {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S, T>(items: &Vec<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        if items.is_empty() {
            serializer.serialize_none()
        } else {
            serializer.collect_seq(items)
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
    }
}
