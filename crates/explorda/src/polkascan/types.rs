//! Polkascan JSON:API response bodies.

use super::{BALANCE_PARAM, REWARD_EVENT_ID};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The `errors` member of a JSON:API document.
///
/// Polkascan does not document the shape of these objects, so they are kept as raw JSON.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct ApiErrors(pub Vec<serde_json::Value>);

impl ApiErrors {
    /// Join all errors into a single message, or `None` when there are no errors.
    pub fn message(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }

        let msg = self
            .0
            .iter()
            .map(|err| match err {
                serde_json::Value::String(s) => s.clone(),
                err => err.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");

        Some(msg)
    }
}

/// Response body for [`Polkascan::get_block`](super::Polkascan::get_block).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct BlockResponse {
    #[serde(default)]
    pub errors: ApiErrors,

    /// Missing when the block does not exist.
    #[serde(default)]
    pub data: Option<BlockData>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct BlockData {
    /// Block number.
    pub id: u64,

    pub attributes: BlockAttributes,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct BlockAttributes {
    /// Wall-clock time the block was produced.
    pub datetime: DateTime<Utc>,
}

/// Response body for [`Polkascan::get_reward_events`](super::Polkascan::get_reward_events).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct EventsResponse {
    #[serde(default)]
    pub errors: ApiErrors,

    #[serde(default)]
    pub data: Vec<Event>,
}

/// A single runtime event.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,

    pub id: String,

    pub attributes: EventAttributes,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct EventAttributes {
    /// Number of the block that emitted this event.
    pub block_id: u64,

    /// Event name within its module, e.g. `Reward` or `Bonded`.
    pub event_id: String,

    /// Event parameters.
    #[serde(default)]
    pub attributes: Vec<EventParam>,
}

/// A typed event parameter.
///
/// The value is kept as raw JSON; its type depends on the parameter type and on the explorer
/// version.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct EventParam {
    #[serde(rename = "type")]
    pub kind: String,

    pub value: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig_value: Option<String>,
}

impl Event {
    /// Returns `true` for staking reward events.
    pub fn is_reward(&self) -> bool {
        self.attributes.event_id == REWARD_EVENT_ID
    }

    /// The raw value of the `Balance` parameter. When repeated, the last one wins.
    pub fn balance(&self) -> Option<&serde_json::Value> {
        self.attributes
            .attributes
            .iter()
            .rev()
            .find(|param| param.kind == BALANCE_PARAM)
            .map(|param| &param.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENTS: &str = r#"{
        "meta": {"authors": ["WEB3SCAN"]},
        "errors": [],
        "data": [
            {
                "type": "event",
                "id": "4262401-3",
                "attributes": {
                    "block_id": 4262401,
                    "event_id": "Reward",
                    "attributes": [
                        {"type": "AccountId", "value": "b0b3c8d9", "orig_value": "14E5nq"},
                        {"type": "Balance", "value": 15312458312}
                    ]
                }
            },
            {
                "type": "event",
                "id": "4262402-1",
                "attributes": {
                    "block_id": 4262402,
                    "event_id": "Bonded",
                    "attributes": []
                }
            }
        ]
    }"#;

    #[test]
    fn test_events() {
        let events: EventsResponse = serde_json::from_str(EVENTS).unwrap();

        assert_eq!(events.errors.message(), None);
        assert_eq!(events.data.len(), 2);
        assert!(events.data[0].is_reward());
        assert!(!events.data[1].is_reward());
        assert_eq!(events.data[0].attributes.block_id, 4_262_401);
        assert_eq!(
            events.data[0].balance(),
            Some(&serde_json::json!(15_312_458_312_u64))
        );
        assert_eq!(events.data[1].balance(), None);
    }

    #[test]
    fn test_empty_page() {
        let events: EventsResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();

        assert!(events.data.is_empty());
        assert_eq!(events.errors, ApiErrors::default());
    }

    #[test]
    fn test_block() {
        let json = r#"{
            "errors": [],
            "data": {
                "type": "block",
                "id": 4262401,
                "attributes": {"datetime": "2021-03-15T18:00:06+00:00", "hash": "0x7c"}
            }
        }"#;
        let block: BlockResponse = serde_json::from_str(json).unwrap();
        let data = block.data.unwrap();

        assert_eq!(data.id, 4_262_401);
        assert_eq!(
            data.attributes.datetime,
            "2021-03-15T18:00:06Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn test_api_errors() {
        let json = r#"{"errors": [{"title": "Not found"}, "Rate limited"]}"#;
        let block: BlockResponse = serde_json::from_str(json).unwrap();

        assert!(block.data.is_none());
        assert_eq!(
            block.errors.message().as_deref(),
            Some(r#"{"title":"Not found"}, Rate limited"#)
        );
    }
}
