use chrono::{DateTime, Local};

use crate::models::Message;

/// Write a conversation as Markdown. Apology bubbles are not part of the
/// record and are skipped.
pub fn export_to_markdown(title: &str, exported_at: DateTime<Local>, messages: &[Message]) -> String {
    let mut output = format!("# {}\n\n", title);
    output.push_str(&format!(
        "> Exported: {}\n\n",
        exported_at.format("%Y-%m-%d %H:%M")
    ));
    output.push_str("---\n\n");

    for msg in messages.iter().filter(|m| !m.is_error()) {
        output.push_str(&format!("### You\n\n{}\n\n", msg.query_text));
        output.push_str(&format!("### Coach\n\n{}\n\n", msg.response_text));
    }

    output
}
