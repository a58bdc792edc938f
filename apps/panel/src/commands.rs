//! Line commands typed into the panel, the terminal stand-in for the page's buttons.

use client_core::{NotificationId, Selection};
use shared::domain::{SequenceId, Speed};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCommand {
    Apply(Selection),
    SetDefault(Selection),
    Dismiss(NotificationId),
    ListNotifications,
    ListSequences,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "commands:
  apply <sequence> <speed>     play a sequence now (speed: 500|1000|2000 or Fast|Normal|Slow)
  default <sequence> <speed>   store the sequence the device starts with
  dismiss <id>                 remove a notification
  list                         show notifications
  sequences                    show the sequence catalog
  status                       show the current display
  quit";

pub fn parse_command(line: &str) -> Result<PanelCommand, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Err("empty command".to_string());
    };
    let args: Vec<&str> = parts.collect();

    match verb.to_ascii_lowercase().as_str() {
        "apply" | "set" => parse_selection(&args).map(PanelCommand::Apply),
        "default" => parse_selection(&args).map(PanelCommand::SetDefault),
        "dismiss" => match args.as_slice() {
            [id] => id
                .parse::<u64>()
                .map(|id| PanelCommand::Dismiss(NotificationId(id)))
                .map_err(|_| format!("notification id must be a number: '{id}'")),
            _ => Err("usage: dismiss <id>".to_string()),
        },
        "list" => Ok(PanelCommand::ListNotifications),
        "sequences" => Ok(PanelCommand::ListSequences),
        "status" => Ok(PanelCommand::Status),
        "help" | "?" => Ok(PanelCommand::Help),
        "quit" | "exit" => Ok(PanelCommand::Quit),
        other => Err(format!("unknown command '{other}'; type 'help'")),
    }
}

fn parse_selection(args: &[&str]) -> Result<Selection, String> {
    let [sequence, speed] = args else {
        return Err("expected <sequence> <speed>".to_string());
    };
    let sequence_id = sequence
        .parse::<i64>()
        .map(SequenceId)
        .map_err(|_| format!("sequence must be an integer: '{sequence}'"))?;
    Ok(Selection {
        sequence_id,
        speed: parse_speed(speed)?,
    })
}

/// Speed as sent to the device: a raw integer, or one of the known labels.
fn parse_speed(raw: &str) -> Result<i64, String> {
    if let Ok(millis) = raw.parse::<i64>() {
        return Ok(millis);
    }
    Speed::ALL
        .into_iter()
        .find(|speed| speed.label().eq_ignore_ascii_case(raw))
        .map(Speed::millis)
        .ok_or_else(|| format!("speed must be an integer or Fast/Normal/Slow: '{raw}'"))
}
