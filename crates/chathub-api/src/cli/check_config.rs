//! `chathub check-config`: print the effective configuration.
//!
//! Connection strings and keys are redacted by the options' `Debug` impls.

use std::fmt::Write;
use std::path::Path;

use chathub_types::config::AppConfig;

/// Render the summary and full option tree printed by `check-config`.
pub fn render(path: &Path, config: &AppConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Configuration OK ({})", path.display());
    let _ = writeln!(
        out,
        "  listen:         {}:{}",
        config.service.host, config.service.port
    );
    let _ = writeln!(out, "  authentication: {:?}", config.authentication.kind);
    let _ = writeln!(out, "  chat store:     {}", config.chat_store.kind);
    let _ = writeln!(out, "  OCR support:    {:?}", config.ocr_support.kind);
    let _ = writeln!(out);
    let _ = writeln!(out, "{config:#?}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chathub_infra::config::parse_config;

    #[test]
    fn secrets_are_redacted() {
        let config = parse_config(
            r#"
[chat_store]
type = "Cosmos"
[chat_store.cosmos]
connection_string = "AccountEndpoint=https://acct.documents.azure.com:443/;AccountKey=c2VjcmV0;"
database = "CopilotChat"
chat_sessions_container = "chatsessions"
chat_messages_container = "chatmessages"
chat_participants_container = "chatparticipants"
chat_memory_sources_container = "chatmemorysources"

[ocr_support]
type = "AzureFormRecognizer"
[ocr_support.azure_form_recognizer]
endpoint = "https://ocr.example.com"
key = "form-recognizer-key"
"#,
        )
        .unwrap();

        let text = render(Path::new("chathub.toml"), &config);
        assert!(text.contains("chat store:     Cosmos"));
        assert!(text.contains("CopilotChat"));
        assert!(text.contains("[REDACTED]"));
        assert!(!text.contains("c2VjcmV0"));
        assert!(!text.contains("form-recognizer-key"));
    }

    #[test]
    fn defaults_render() {
        let text = render(Path::new("missing.toml"), &AppConfig::default());
        assert!(text.starts_with("Configuration OK (missing.toml)"));
        assert!(text.contains("127.0.0.1:40443"));
        assert!(text.contains("chat store:     Volatile"));
    }
}
