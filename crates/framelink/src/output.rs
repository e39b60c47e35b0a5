use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use framelink_client::RawMessage;
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// What the CLI prints about one popped message, whatever the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageView<'a> {
    pub success: Option<bool>,
    pub opcode: Option<u32>,
    pub payload: &'a [u8],
}

/// Messages the CLI knows how to print.
pub trait Printable {
    fn view(&self) -> MessageView<'_>;
}

impl Printable for RawMessage {
    fn view(&self) -> MessageView<'_> {
        MessageView {
            success: Some(self.success),
            opcode: Some(self.opcode),
            payload: self.payload.as_ref(),
        }
    }
}

/// Undecoded read from the passthrough codec.
impl Printable for Bytes {
    fn view(&self) -> MessageView<'_> {
        MessageView {
            success: None,
            opcode: None,
            payload: self.as_ref(),
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    peer: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    opcode: Option<u32>,
    payload_size: usize,
    payload: String,
    timestamp: String,
}

pub fn print_message<M: Printable>(message: &M, peer: &str, format: OutputFormat) {
    let view = message.view();
    match format {
        OutputFormat::Json => println!("{}", render_json(&view, peer)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PEER", "SUCCESS", "OPCODE", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    peer.to_string(),
                    optional(view.success),
                    optional(view.opcode),
                    view.payload.len().to_string(),
                    payload_preview(view.payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Raw => print_raw(view.payload),
    }
}

fn render_json(view: &MessageView<'_>, peer: &str) -> String {
    let out = MessageOutput {
        peer,
        success: view.success,
        opcode: view.opcode,
        payload_size: view.payload.len(),
        payload: payload_preview(view.payload),
        timestamp: now_unix_seconds(),
    };
    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_message_view_carries_header_fields() {
        let msg = RawMessage::new(true, 4, "hi");
        let view = msg.view();
        assert_eq!(view.success, Some(true));
        assert_eq!(view.opcode, Some(4));
        assert_eq!(view.payload, b"hi");
    }

    #[test]
    fn json_omits_missing_header_fields() {
        let bytes = Bytes::from_static(b"\xff\x00");
        let rendered = render_json(&bytes.view(), "127.0.0.1:4000");
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert!(value.get("opcode").is_none());
        assert_eq!(value["payload"], "<binary 2 bytes>");
        assert_eq!(value["payload_size"], 2);
        assert_eq!(value["peer"], "127.0.0.1:4000");
    }

    #[test]
    fn optional_renders_dash_for_none() {
        assert_eq!(optional::<u32>(None), "-");
        assert_eq!(optional(Some(7u32)), "7");
    }

    #[test]
    fn formats_are_json_table_and_raw() {
        let names: Vec<_> = OutputFormat::value_variants()
            .iter()
            .filter_map(|format| format.to_possible_value())
            .map(|value| value.get_name().to_string())
            .collect();
        assert_eq!(names, ["json", "table", "raw"]);
    }
}
