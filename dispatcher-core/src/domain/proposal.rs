use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The partner choice the completion service proposes for a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchProposal {
    pub partner_name: String,
    pub reason: String,
    #[serde(deserialize_with = "price_as_string")]
    pub minimum_price: String,
    pub direct_message: String,
}

// Models answer with "1200 EUR", "1200" or 1200 interchangeably.
fn price_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "minimum_price must be a string or a number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_price_is_accepted() {
        let proposal: DispatchProposal = serde_json::from_value(json!({
            "partner_name": "Trans Balkan",
            "reason": "closest truck",
            "minimum_price": 1575.5,
            "direct_message": "Zdravo!"
        }))
        .unwrap();

        assert_eq!(proposal.minimum_price, "1575.5");
    }

    #[test]
    fn test_structured_price_is_rejected() {
        let result: Result<DispatchProposal, _> = serde_json::from_value(json!({
            "partner_name": "Trans Balkan",
            "reason": "closest truck",
            "minimum_price": {"amount": 1},
            "direct_message": "Zdravo!"
        }));

        assert!(result.is_err());
    }
}
