use axum::{extract::State, http::StatusCode, Json};
use dispatcher_core::{
    ChatMessage, City, Conversation, ConversationContext, DispatchProposal, Route,
};
use dispatcher_sdk::CompletionRequest;
use tracing::info;
use validator::Validate;

use crate::{
    dto::*,
    error::ApiResult,
    extract::extract_json,
    prompt::{dispatch_prompt, negotiation_system_prompt},
    AppState,
};

pub async fn cities(State(state): State<AppState>) -> ApiResult<Json<Vec<City>>> {
    let cities = state.data_source.available_cities().await?;
    Ok(Json(cities))
}

/// Picks a partner for the route and opens a negotiation with them.
pub async fn dispatch(
    State(state): State<AppState>,
    Json(payload): Json<DispatchRequest>,
) -> ApiResult<(StatusCode, Json<DispatchResponse>)> {
    payload.validate()?;
    let name = payload.name.clone();
    let route: Route = payload.into();

    let (partners, transports) = tokio::try_join!(
        state.data_source.partners(),
        state.data_source.transport_history()
    )?;

    let request = CompletionRequest::prompt(dispatch_prompt(&route, &partners, &transports));
    let completion = state
        .executor
        .execute_with_cancellation(|| state.completion.complete(&request), &state.shutdown)
        .await?;

    let proposal: DispatchProposal = extract_json(&completion.text)?;

    let context = ConversationContext {
        name,
        system_prompt: negotiation_system_prompt(&route, &proposal),
        messages: vec![ChatMessage::assistant(proposal.direct_message.clone())],
        proposal: Some(proposal.clone()),
        route: Some(route),
    };
    let conversation = state.conversations.create(&Conversation::new(context)).await?;

    info!(
        conversation_id = %conversation.id,
        partner = %proposal.partner_name,
        partners = partners.len(),
        "Dispatch proposal created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DispatchResponse {
            conversation_id: conversation.id.into(),
            proposal,
        }),
    ))
}
