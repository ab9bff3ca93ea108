//! Logistics data source client
//!
//! Read-only access to the partner catalogue, the transport history and the
//! list of cities the dispatcher can serve.

use crate::client::HttpClient;
use crate::error::SdkResult;
use async_trait::async_trait;
use dispatcher_core::{City, Partner, Transport};
use std::sync::Arc;
use tracing::debug;

const CITIES_PATH: &str = "/Helper/GetAvailableCities";
const PARTNERS_PATH: &str = "/Supplier/GetAllSuppliers";
const TRANSPORT_HISTORY_PATH: &str = "/Transport/GetTransportHistory";

/// Source of partner and transport data.
#[async_trait]
pub trait LogisticsDataSource: Send + Sync {
    /// Cities goods can be loaded in or delivered to
    async fn available_cities(&self) -> SdkResult<Vec<City>>;

    /// Every registered partner
    async fn partners(&self) -> SdkResult<Vec<Partner>>;

    /// Every transport carried out so far, across all partners
    async fn transport_history(&self) -> SdkResult<Vec<Transport>>;
}

/// Client for the logistics data source HTTP API
#[derive(Debug, Clone)]
pub struct LogisticsClient {
    client: Arc<HttpClient>,
}

impl LogisticsClient {
    /// Create a new logistics client
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogisticsDataSource for LogisticsClient {
    async fn available_cities(&self) -> SdkResult<Vec<City>> {
        let cities: Vec<City> = self.client.get(CITIES_PATH).await?;
        debug!(count = cities.len(), "Fetched available cities");
        Ok(cities)
    }

    async fn partners(&self) -> SdkResult<Vec<Partner>> {
        let partners: Vec<Partner> = self.client.get(PARTNERS_PATH).await?;
        debug!(count = partners.len(), "Fetched partners");
        Ok(partners)
    }

    async fn transport_history(&self) -> SdkResult<Vec<Transport>> {
        let transports: Vec<Transport> = self.client.get(TRANSPORT_HISTORY_PATH).await?;
        debug!(count = transports.len(), "Fetched transport history");
        Ok(transports)
    }
}
