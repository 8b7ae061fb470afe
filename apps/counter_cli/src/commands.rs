//! Interactive commands and event rendering for the terminal front end.

use shared::{
    domain::ConnectionState,
    error::ErrorCode,
    protocol::{SessionEvent, SessionView},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Disconnect,
    Refresh,
    Increment,
    CopyAddress,
    Status,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let word = line.trim().to_ascii_lowercase();
        let cmd = match word.as_str() {
            "" => return Ok(None),
            "connect" | "c" => Self::Connect,
            "disconnect" | "d" => Self::Disconnect,
            "get" | "refresh" | "number" | "g" => Self::Refresh,
            "increment" | "inc" | "i" => Self::Increment,
            "copy" => Self::CopyAddress,
            "status" | "s" => Self::Status,
            "help" | "h" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(format!("unknown command '{other}'; type 'help'")),
        };
        Ok(Some(cmd))
    }
}

pub const HELP: &str = "\
commands:
  connect     request wallet access
  disconnect  forget the local session
  get         read the counter
  increment   send an increment transaction
  copy        copy the connected address to the clipboard
  status      show the current session state
  quit        exit";

/// Line to print for a session event, if any.
pub fn render_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::ConnectionChanged(ConnectionState::Connected(address)) => {
            Some(format!("Connected: {address}"))
        }
        SessionEvent::ConnectionChanged(ConnectionState::Disconnected) => {
            Some("Disconnected".to_string())
        }
        SessionEvent::ConnectionChanged(ConnectionState::Connecting) => None,
        SessionEvent::CounterUpdated(value) => Some(format!("Counter: {value}")),
        SessionEvent::StatusChanged(status) => {
            let message = status.message();
            (!message.is_empty()).then_some(message)
        }
        SessionEvent::TransactionSubmitted { tx_hash } => Some(format!("Submitted {tx_hash}")),
        SessionEvent::TransactionConfirmed { block_number, .. } => {
            Some(format!("Confirmed in block {block_number}"))
        }
        // Other failures already show up as a status line.
        SessionEvent::Error(err) => {
            matches!(err.code, ErrorCode::OperationInFlight).then(|| err.message.clone())
        }
    }
}

pub fn render_view(view: &SessionView) -> String {
    let connection = match view.connection {
        ConnectionState::Disconnected => "disconnected".to_string(),
        ConnectionState::Connecting => "connecting".to_string(),
        ConnectionState::Connected(address) => format!("connected as {address}"),
    };
    let status = view.status.message();
    format!(
        "wallet: {connection}\ncounter: {}\nstatus: {}\nactions: get={} increment={}",
        view.counter,
        if status.is_empty() { "idle" } else { status.as_str() },
        if view.can_read { "on" } else { "off" },
        if view.can_write { "on" } else { "off" },
    )
}
