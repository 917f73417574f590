//! HTTP proxy for the service's published properties.
//!
//! Wraps the service's read-only property endpoints using [`reqwest`].
//! Every property read is an independent request, so two reads issued
//! back-to-back may observe different sensor ticks.

use std::time::Duration;

use healthmon_core::names::{BUS_NAME, PROP_TEMPERATURE, PROP_VERSION, PROP_VOLTAGE};
use healthmon_core::published::{PropertySnapshot, PropertyValue};
use healthmon_core::wire::{HealthResponse, PropertyResponse};
use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// Connected handle to one health monitor service.
#[derive(Debug, Clone)]
pub struct ServiceProxy {
    client: reqwest::Client,
    api_url: String,
    identity: HealthResponse,
}

impl ServiceProxy {
    /// Probe the service at `api_url` and return a proxy for it.
    ///
    /// Every request, this probe included, gives up after `timeout`. Fails
    /// with [`ClientError::Connection`] if the service cannot be reached,
    /// does not answer in time, or answers under a different bus name.
    pub async fn connect(api_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Self::connect_with_client(client, api_url).await
    }

    /// Same as [`ServiceProxy::connect`], reusing an existing
    /// [`reqwest::Client`].
    pub async fn connect_with_client(
        client: reqwest::Client,
        api_url: &str,
    ) -> Result<Self, ClientError> {
        let api_url = api_url.trim_end_matches('/').to_string();

        let identity: HealthResponse = fetch_json(&client, &format!("{api_url}/health")).await?;
        if identity.bus_name != BUS_NAME {
            return Err(ClientError::Connection(format!(
                "expected service {BUS_NAME}, found {}",
                identity.bus_name
            )));
        }

        tracing::info!(
            url = %api_url,
            bus_name = %identity.bus_name,
            object_path = %identity.object_path,
            version = %identity.version,
            "Connected to health monitor service"
        );

        Ok(Self {
            client,
            api_url,
            identity,
        })
    }

    /// Identity the service reported on connect.
    pub fn identity(&self) -> &HealthResponse {
        &self.identity
    }

    pub async fn temperature(&self) -> Result<f64, ClientError> {
        self.float_property(PROP_TEMPERATURE).await
    }

    pub async fn voltage(&self) -> Result<f64, ClientError> {
        self.float_property(PROP_VOLTAGE).await
    }

    pub async fn version(&self) -> Result<String, ClientError> {
        match self.property(PROP_VERSION).await? {
            PropertyValue::Str(version) => Ok(version),
            other => Err(unexpected_type(PROP_VERSION, &other)),
        }
    }

    /// Read one property by name.
    pub async fn property(&self, name: &str) -> Result<PropertyValue, ClientError> {
        let url = format!("{}/api/v1/properties/{}", self.api_url, name);
        let response: PropertyResponse = fetch_json(&self.client, &url).await?;
        Ok(response.value)
    }

    /// Read all properties at once; temperature and voltage come from the
    /// same sensor tick.
    pub async fn snapshot(&self) -> Result<PropertySnapshot, ClientError> {
        let url = format!("{}/api/v1/properties", self.api_url);
        fetch_json(&self.client, &url).await
    }

    async fn float_property(&self, name: &str) -> Result<f64, ClientError> {
        let value = self.property(name).await?;
        value.as_f64().ok_or_else(|| unexpected_type(name, &value))
    }
}

async fn fetch_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, ClientError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Connection(format!(
            "GET {url} returned {status}"
        )));
    }
    Ok(response.json().await?)
}

fn unexpected_type(name: &str, value: &PropertyValue) -> ClientError {
    ClientError::Connection(format!("property {name} has unexpected value {value:?}"))
}
