use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use validator::Validate;

/// Identifier the logistics data source assigns to a partner (supplier).
///
/// The upstream API is not consistent about numeric versus string ids, so
/// both are accepted and compared structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PartnerId {
    Number(i64),
    Text(String),
}

impl fmt::Display for PartnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartnerId::Number(n) => write!(f, "{}", n),
            PartnerId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A city the data source can load or unload goods in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub city: String,
    pub country: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Address {
    #[validate(length(min = 1, max = 255))]
    pub city: String,
    #[validate(length(min = 1, max = 255))]
    pub country: String,
}

impl Address {
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.country)
    }
}

/// Where goods are loaded and where they are delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Route {
    #[validate(nested)]
    pub load_address: Address,
    #[validate(nested)]
    pub unload_address: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerAddress {
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// A logistics partner that can be offered a transport job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: PartnerId,
    pub name: String,
    #[serde(default)]
    pub language: Option<String>,
    pub address: PartnerAddress,
}

/// A historical transport. Only the supplier link is interpreted; every
/// other field is carried through verbatim into the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transport {
    pub supplier_id: PartnerId,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Transports carried out by the given partner, in source order.
pub fn transports_by_partner<'a>(
    partner_id: &PartnerId,
    transports: &'a [Transport],
) -> Vec<&'a Transport> {
    transports
        .iter()
        .filter(|t| &t.supplier_id == partner_id)
        .collect()
}
