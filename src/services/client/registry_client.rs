use super::error::ClientError;
use crate::services::registry::Registration;

/// 注册中心客户端
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    services_url: String,
}

impl RegistryClient {
    pub fn new(http: reqwest::Client, services_url: impl Into<String>) -> Self {
        Self {
            http,
            services_url: services_url.into(),
        }
    }

    /// 便捷的创建方法，使用默认 HTTP 客户端
    pub fn connect(services_url: &str) -> Self {
        Self::new(reqwest::Client::new(), services_url)
    }

    /// 注册服务
    pub async fn register_service(&self, reg: &Registration) -> Result<(), ClientError> {
        let response = self.http.post(&self.services_url).json(reg).send().await?;
        Self::check_status(response.status())?;

        tracing::info!(
            service_name = %reg.service_name,
            service_url = %reg.service_url,
            "Registered with registry"
        );
        Ok(())
    }

    /// 注销服务，请求体为服务地址原文
    pub async fn shutdown_service(&self, service_url: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(&self.services_url)
            .header(http::header::CONTENT_TYPE, "text/plain")
            .body(service_url.to_string())
            .send()
            .await?;
        Self::check_status(response.status())?;

        tracing::info!(service_url = %service_url, "Deregistered from registry");
        Ok(())
    }

    fn check_status(status: reqwest::StatusCode) -> Result<(), ClientError> {
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::Status {
                status: status.as_u16(),
            })
        }
    }
}
