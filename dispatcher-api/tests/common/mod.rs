//! In-process collaborators for exercising the router without a network.

#![allow(dead_code)]

use async_trait::async_trait;
use dispatcher_api::{AppState, ResilientExecutor, RetryConfig, RetryPolicy};
use dispatcher_core::{City, Partner, Transport};
use dispatcher_sdk::{
    CompletionRequest, CompletionResponse, CompletionService, LogisticsDataSource, SdkError,
    SdkResult,
};
use dispatcher_storage::InMemoryConversationStore;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct FakeDataSource {
    pub fail: bool,
}

#[async_trait]
impl LogisticsDataSource for FakeDataSource {
    async fn available_cities(&self) -> SdkResult<Vec<City>> {
        if self.fail {
            return Err(SdkError::ServerError {
                status: 503,
                message: "maintenance".to_string(),
            });
        }
        Ok(serde_json::from_value(json!([
            {"city": "Barcelona", "country": "Spain"},
            {"city": "Belgrade", "country": "Serbia"}
        ]))
        .unwrap())
    }

    async fn partners(&self) -> SdkResult<Vec<Partner>> {
        if self.fail {
            return Err(SdkError::ServerError {
                status: 503,
                message: "maintenance".to_string(),
            });
        }
        Ok(serde_json::from_value(json!([
            {
                "id": 1,
                "name": "Trans Balkan",
                "language": "Serbian",
                "address": {"city": "Belgrade", "country": "Serbia", "latitude": 44.8, "longitude": 20.4}
            },
            {
                "id": 2,
                "name": "Iberia Cargo",
                "language": "Spanish",
                "address": {"city": "Madrid", "country": "Spain", "latitude": 40.4, "longitude": -3.7}
            }
        ]))
        .unwrap())
    }

    async fn transport_history(&self) -> SdkResult<Vec<Transport>> {
        Ok(serde_json::from_value(json!([
            {"supplierId": 1, "price": 1200, "loadCity": "Barcelona"},
            {"supplierId": 2, "price": 1500, "loadCity": "Madrid"}
        ]))
        .unwrap())
    }
}

/// Answers from a script, one entry per call.
#[derive(Default)]
pub struct ScriptedCompletion {
    script: Mutex<VecDeque<SdkResult<String>>>,
    calls: AtomicU32,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(script: Vec<SdkResult<String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> SdkResult<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let next = self.script.lock().unwrap().pop_front();
        let text = next.unwrap_or_else(|| {
            Err(SdkError::UnexpectedResponse("script exhausted".to_string()))
        })?;

        Ok(CompletionResponse {
            text,
            model: "scripted".to_string(),
            stop_reason: Some("end_turn".to_string()),
            output_tokens: None,
        })
    }
}

pub fn proposal_text() -> String {
    r#"I picked the partner closest to the loading city.
{"partner_name": "Trans Balkan", "reason": "Did this lane before", "minimum_price": 1260, "direct_message": "Zdravo, imamo posao za vas."}"#
        .to_string()
}

pub fn fast_executor(max_attempts: u32) -> ResilientExecutor {
    ResilientExecutor::new(
        RetryPolicy::new(RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
            jitter: false,
        })
        .unwrap(),
    )
}

pub struct TestApp {
    pub state: AppState,
    pub completion: Arc<ScriptedCompletion>,
    pub store: Arc<InMemoryConversationStore>,
}

pub fn test_app(script: Vec<SdkResult<String>>) -> TestApp {
    test_app_with(script, false, 3)
}

pub fn test_app_with(script: Vec<SdkResult<String>>, data_source_fails: bool, max_attempts: u32) -> TestApp {
    let completion = Arc::new(ScriptedCompletion::new(script));
    let store = Arc::new(InMemoryConversationStore::new());
    let state = AppState::new(
        Arc::new(FakeDataSource {
            fail: data_source_fails,
        }),
        completion.clone(),
        store.clone(),
        fast_executor(max_attempts),
    );

    TestApp {
        state,
        completion,
        store,
    }
}
