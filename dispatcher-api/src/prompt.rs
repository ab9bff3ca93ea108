//! Prompt text sent to the completion service.

use dispatcher_core::{
    transports_by_partner, ChatMessage, DispatchProposal, Partner, Role, Route, Transport,
};
use std::fmt::Write;

/// Persona used for every message exchanged with a partner.
pub const NEGOTIATION_PERSONA: &str = "You are a chat bot for transport logistics, \
You discuss the price with partners, You close a deals.";

const RESPONSE_FORMAT: &str = r#"{"partner_name": "...", "reason": "Describe why you have chosen this partner. Include as many parameters as you can", "minimum_price": "...", "direct_message": "..."}"#;

fn or_unknown<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| v.to_string())
}

/// One line per partner, followed by the transports that partner carried out.
pub fn partner_catalogue(partners: &[Partner], transports: &[Transport]) -> String {
    let mut catalogue = String::new();

    for partner in partners {
        let history = transports_by_partner(&partner.id, transports);
        let history = serde_json::to_string(&history).unwrap_or_else(|_| "[]".to_string());

        let _ = writeln!(
            catalogue,
            "Partner(id={}, city={}, country={}, latitude={}, longitude={}, language={}, name={}) \
             | Transports done by this partner: {}",
            partner.id,
            partner.address.city,
            partner.address.country,
            or_unknown(partner.address.latitude),
            or_unknown(partner.address.longitude),
            or_unknown(partner.language.as_deref()),
            partner.name,
            history,
        );
    }

    catalogue
}

/// Asks the model to pick a partner for `route` and draft the first offer.
pub fn dispatch_prompt(route: &Route, partners: &[Partner], transports: &[Transport]) -> String {
    format!(
        "You are a dispatcher for a logistics company. \
         Your available partners, each followed by the transports it has done, are:\n\
         {catalogue}\n\
         Your task: we have a request to load goods in {load} and transport them to {unload}. \
         Find the best suitable partner and price from the data provided. \
         You have every partner's history, longitude, latitude and other specific data; \
         do the calculations to decide which partner will give the best possible result. \
         Also write a direct message to that partner in their language offering them the job. \
         Calculate the minimum price with a 5% profit on this job.\n\
         Respond only with a JSON object in this format: {format}",
        catalogue = partner_catalogue(partners, transports),
        load = route.load_address,
        unload = route.unload_address,
        format = RESPONSE_FORMAT,
    )
}

/// System prompt for the negotiation that follows a dispatch decision.
pub fn negotiation_system_prompt(route: &Route, proposal: &DispatchProposal) -> String {
    format!(
        "{persona} You are negotiating with {partner} about transporting goods from {load} to {unload}. \
         Do not accept a price below {price}. \
         You opened the conversation with this message: {opener}",
        persona = NEGOTIATION_PERSONA,
        partner = proposal.partner_name,
        load = route.load_address,
        unload = route.unload_address,
        price = proposal.minimum_price,
        opener = proposal.direct_message,
    )
}

/// Message history to send back to the model.
///
/// The completion API expects the first turn to come from the user, so the
/// dispatcher's opening offer is dropped here; the system prompt carries it.
pub fn negotiation_history(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    messages
        .iter()
        .skip_while(|m| m.role == Role::Assistant)
        .cloned()
        .collect()
}
