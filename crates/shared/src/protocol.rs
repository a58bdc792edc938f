use serde::{Deserialize, Serialize};

use crate::domain::{SequenceCatalog, SequenceId, Speed};

pub const STATUS_ROUTE: &str = "/status";
pub const RPC_ROUTE: &str = "/rpc";
pub const INDEX_ROUTE: &str = "/";

/// Element id carrying the JSON-encoded sequence names on the host page.
pub const SEQUENCE_LIST_ELEMENT_ID: &str = "sequencelist";

/// Status reported by the device. `speed` stays a raw key so unknown rates survive decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    #[serde(rename = "sequenceID")]
    pub sequence_id: SequenceId,
    pub speed: i64,
}

impl DeviceStatus {
    pub fn new(sequence_id: SequenceId, speed: Speed) -> Self {
        Self {
            sequence_id,
            speed: speed.millis(),
        }
    }

    /// `"<sequence name> | <speed label>"`, with a blank fragment for unknown ids or speeds.
    pub fn display_text(&self, catalog: &SequenceCatalog) -> String {
        format!(
            "{} | {}",
            catalog.name(self.sequence_id).unwrap_or_default(),
            Speed::label_for(self.speed).unwrap_or_default()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RpcCommand {
    SetSequence,
    SetDefault,
}

impl RpcCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            RpcCommand::SetSequence => "setSequence",
            RpcCommand::SetDefault => "setDefault",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "setSequence" => Some(RpcCommand::SetSequence),
            "setDefault" => Some(RpcCommand::SetDefault),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub command: RpcCommand,
    #[serde(rename = "sequenceID")]
    pub sequence_id: SequenceId,
    pub speed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub ok: bool,
    #[serde(rename = "sequenceID")]
    pub sequence_id: SequenceId,
    pub speed: i64,
}

impl From<DeviceStatus> for RpcResponse {
    fn from(status: DeviceStatus) -> Self {
        Self {
            ok: true,
            sequence_id: status.sequence_id,
            speed: status.speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_request_uses_device_field_names() {
        let request = RpcRequest {
            command: RpcCommand::SetDefault,
            sequence_id: SequenceId(3),
            speed: 2000,
        };
        let value = serde_json::to_value(&request).expect("json");
        assert_eq!(
            value,
            serde_json::json!({ "command": "setDefault", "sequenceID": 3, "speed": 2000 })
        );
    }

    #[test]
    fn status_decoding_ignores_extra_fields_and_keeps_unknown_speed() {
        let status: DeviceStatus =
            serde_json::from_str(r#"{"ok":true,"sequenceID":4,"speed":750}"#).expect("json");
        assert_eq!(status.sequence_id, SequenceId(4));
        assert_eq!(status.speed, 750);
    }

    #[test]
    fn display_text_leaves_unknown_fragments_blank() {
        let catalog = SequenceCatalog::new(["A", "B"]);
        let status = DeviceStatus {
            sequence_id: SequenceId(9),
            speed: 1000,
        };
        assert_eq!(status.display_text(&catalog), " | Normal");

        let status = DeviceStatus {
            sequence_id: SequenceId(0),
            speed: 3,
        };
        assert_eq!(status.display_text(&catalog), "A | ");
    }

    #[test]
    fn command_names_match_wire_format() {
        for command in [RpcCommand::SetSequence, RpcCommand::SetDefault] {
            assert_eq!(RpcCommand::parse(command.as_str()), Some(command));
            let json = serde_json::to_string(&command).expect("json");
            assert_eq!(json, format!("\"{}\"", command.as_str()));
        }
        assert_eq!(RpcCommand::parse("reboot"), None);
    }
}
