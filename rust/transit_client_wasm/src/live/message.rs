// Live channel messages: `{ "type": ..., "payload" | "detail": { ... } }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LiveError;
use crate::utils::{id_string, optional_id_string};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusLocation {
    #[serde(alias = "bus_id", deserialize_with = "id_string")]
    pub bus_id: String,
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(
        default,
        alias = "route_id",
        deserialize_with = "optional_id_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub route_id: Option<String>,
    /// Epoch millis or an ISO string, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingUpdate {
    #[serde(alias = "booking_id", deserialize_with = "id_string")]
    pub booking_id: String,
    pub status: String,
    #[serde(
        default,
        alias = "seat_number",
        alias = "seat",
        deserialize_with = "optional_id_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub seat_number: Option<String>,
    #[serde(
        default,
        alias = "bus_id",
        deserialize_with = "optional_id_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub bus_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum LiveMessage {
    BusLocation(BusLocation),
    BookingUpdate(BookingUpdate),
    Notification(Notification),
    /// Tag this client does not know yet; dropped by dispatch.
    Unknown(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, alias = "detail")]
    payload: Value,
}

impl LiveMessage {
    pub fn parse(raw: &str) -> Result<Self, LiveError> {
        let envelope: Envelope = serde_json::from_str(raw)?;
        let message = match envelope.kind.as_str() {
            "bus_location" => LiveMessage::BusLocation(serde_json::from_value(envelope.payload)?),
            "booking_update" => {
                LiveMessage::BookingUpdate(serde_json::from_value(envelope.payload)?)
            }
            "notification" => LiveMessage::Notification(serde_json::from_value(envelope.payload)?),
            _ => LiveMessage::Unknown(envelope.kind),
        };
        Ok(message)
    }

    pub fn kind(&self) -> &str {
        match self {
            LiveMessage::BusLocation(_) => "bus_location",
            LiveMessage::BookingUpdate(_) => "booking_update",
            LiveMessage::Notification(_) => "notification",
            LiveMessage::Unknown(kind) => kind,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, LiveMessage::Unknown(_))
    }
}
