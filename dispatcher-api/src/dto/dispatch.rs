use dispatcher_core::{Address, DispatchProposal, Route};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DispatchRequest {
    /// Label for the negotiation this request opens
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(nested)]
    pub load_address: Address,
    #[validate(nested)]
    pub unload_address: Address,
}

impl From<DispatchRequest> for Route {
    fn from(request: DispatchRequest) -> Self {
        Route {
            load_address: request.load_address,
            unload_address: request.unload_address,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub conversation_id: Uuid,
    pub proposal: DispatchProposal,
}
