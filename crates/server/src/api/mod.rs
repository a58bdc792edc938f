use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Deserializer};
use shared::{
    domain::{SequenceCatalog, SequenceId, Speed},
    protocol::{RpcCommand, RpcResponse, SEQUENCE_LIST_ELEMENT_ID},
};

use crate::player::SequencePlayer;

const SEQUENCE_LIST_PLACEHOLDER: &str = "~SEQUENCELIST~";

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Light Sequencer</title></head>
<body>
<script type="application/json" id="~SEQUENCELIST_ID~">~SEQUENCELIST~</script>
<h1>Light Sequencer</h1>
<p>Current: <output id="currentSeq"></output></p>
<progress id="refreshTimerBar" max="100" value="0"></progress>
<select id="selectSequence"></select>
<select id="selectSpeed">
<option value="500">Fast</option>
<option value="1000" selected>Normal</option>
<option value="2000">Slow</option>
</select>
<button id="btnApply">Apply</button>
<button id="btnSetDefault">Set Default</button>
<footer></footer>
</body>
</html>
"#;

/// Body of `POST /rpc`. Every field is optional so missing ones can be reported precisely.
#[derive(Debug, Default, Deserialize)]
pub struct RpcEnvelope {
    /// `None` only when the key is absent; an explicit `null` is kept as a command value.
    #[serde(default, deserialize_with = "present_value")]
    pub command: Option<serde_json::Value>,
    #[serde(default, rename = "sequenceID")]
    pub sequence_id: Option<i64>,
    #[serde(default)]
    pub speed: Option<i64>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Plain-text 422 reply, the only failure shape the device produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcRejection {
    pub message: String,
}

impl RpcRejection {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for RpcRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNPROCESSABLE_ENTITY, self.message).into_response()
    }
}

pub fn handle_rpc(
    player: &mut SequencePlayer,
    envelope: RpcEnvelope,
) -> Result<RpcResponse, RpcRejection> {
    let Some(raw_command) = envelope.command.as_ref() else {
        return Err(RpcRejection::new("Unprocessable Entity"));
    };
    let command_name = match raw_command {
        serde_json::Value::String(name) => name.clone(),
        other => other.to_string(),
    };

    match RpcCommand::parse(&command_name) {
        Some(RpcCommand::SetSequence) => Ok(set_sequence(player, &envelope)),
        Some(RpcCommand::SetDefault) => set_default(player, &envelope),
        None => Err(RpcRejection::new(format!("Invalid command: {command_name}"))),
    }
}

/// Overlays the provided fields on the current status.
fn set_sequence(player: &mut SequencePlayer, envelope: &RpcEnvelope) -> RpcResponse {
    let current = player.status();
    let sequence_id = envelope
        .sequence_id
        .map(SequenceId)
        .unwrap_or(current.sequence_id);
    let speed = envelope
        .speed
        .map(Speed::constrain)
        .unwrap_or_else(|| player.speed());

    player.set_new_sequence(sequence_id, speed).into()
}

fn set_default(
    player: &mut SequencePlayer,
    envelope: &RpcEnvelope,
) -> Result<RpcResponse, RpcRejection> {
    let sequence_id = envelope
        .sequence_id
        .ok_or_else(|| RpcRejection::new("Missing required field: sequenceID"))?;
    let speed = envelope
        .speed
        .ok_or_else(|| RpcRejection::new("Missing required field: speed"))?;

    Ok(player
        .store_default(SequenceId(sequence_id), Speed::constrain(speed))
        .into())
}

/// Host page with the sequence names embedded as JSON.
pub fn render_index(catalog: &SequenceCatalog) -> String {
    // `<\/` keeps a name containing `</script>` from closing the element early.
    let names = catalog.to_json().replace("</", "<\\/");
    INDEX_TEMPLATE
        .replace("~SEQUENCELIST_ID~", SEQUENCE_LIST_ELEMENT_ID)
        .replace(SEQUENCE_LIST_PLACEHOLDER, &names)
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
