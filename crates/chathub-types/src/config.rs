//! Typed configuration for chathub.
//!
//! `AppConfig` mirrors the TOML configuration file. Loading happens in
//! `chathub-infra::config`; this module owns the shapes, the defaults, the
//! explicit per-field whitespace normalization and the validation rules that
//! make a misconfigured backend fail at startup.

use std::fmt;

use serde::Deserialize;

use crate::chat::DEFAULT_MEMORY_BALANCE;
use crate::error::ConfigError;
use crate::storage::EntityKind;

/// Top-level configuration. Every section has defaults, so an empty file is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceOptions,
    pub authentication: AuthenticationOptions,
    pub chat_store: ChatStoreOptions,
    pub ocr_support: OcrSupportOptions,
    pub prompts: PromptOptions,
}

impl AppConfig {
    /// Trim surrounding whitespace from every string option.
    pub fn normalize(&mut self) {
        self.service.normalize();
        self.authentication.normalize();
        self.chat_store.normalize();
        self.ocr_support.normalize();
        self.prompts.normalize();
    }

    /// Check that the selected backends have the options they need.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.authentication.validate()?;
        self.chat_store.validate()?;
        self.ocr_support.validate()?;
        self.prompts.validate()?;
        Ok(())
    }
}

fn trim(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

fn trim_opt(value: &mut Option<String>) {
    if let Some(v) = value.as_mut() {
        trim(v);
    }
    if value.as_deref() == Some("") {
        *value = None;
    }
}

fn require(
    value: &str,
    option: &'static str,
    kind: &'static str,
    field: &'static str,
) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::MissingField {
            option,
            kind,
            field,
        });
    }
    Ok(())
}

fn positive_timeout(secs: u64, field: &'static str) -> Result<(), ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Invalid {
            field,
            message: "timeout must be at least one second".to_string(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// HTTP listener options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceOptions {
    pub host: String,
    pub port: u16,
    /// CORS origins; empty allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 40443,
            allowed_origins: Vec::new(),
        }
    }
}

impl ServiceOptions {
    fn normalize(&mut self) {
        trim(&mut self.host);
        self.allowed_origins.iter_mut().for_each(trim);
        self.allowed_origins.retain(|o| !o.is_empty());
    }
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum AuthenticationType {
    #[serde(alias = "azure_ad", alias = "azuread")]
    AzureAd,
    /// Pass-through: every request runs as a fixed default identity.
    #[default]
    #[serde(alias = "none")]
    None,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthenticationOptions {
    #[serde(rename = "type")]
    pub kind: AuthenticationType,
    pub azure_ad: Option<AzureAdOptions>,
}

impl AuthenticationOptions {
    fn normalize(&mut self) {
        if let Some(ad) = self.azure_ad.as_mut() {
            trim(&mut ad.instance);
            trim(&mut ad.tenant_id);
            trim(&mut ad.client_id);
            trim_opt(&mut ad.audience);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.kind != AuthenticationType::AzureAd {
            return Ok(());
        }
        let ad = self.azure_ad.as_ref().ok_or(ConfigError::MissingSection {
            option: "authentication",
            kind: "AzureAd",
            section: "authentication.azure_ad",
        })?;
        require(&ad.instance, "authentication", "AzureAd", "authentication.azure_ad.instance")?;
        require(&ad.tenant_id, "authentication", "AzureAd", "authentication.azure_ad.tenant_id")?;
        require(&ad.client_id, "authentication", "AzureAd", "authentication.azure_ad.client_id")?;
        Ok(())
    }
}

/// Azure AD (Entra ID) token validation options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AzureAdOptions {
    pub instance: String,
    pub tenant_id: String,
    pub client_id: String,
    /// Expected `aud` claim; falls back to `client_id`.
    pub audience: Option<String>,
}

impl Default for AzureAdOptions {
    fn default() -> Self {
        Self {
            instance: "https://login.microsoftonline.com".to_string(),
            tenant_id: String::new(),
            client_id: String::new(),
            audience: None,
        }
    }
}

impl AzureAdOptions {
    pub fn effective_audience(&self) -> &str {
        self.audience.as_deref().unwrap_or(&self.client_id)
    }
}

// ---------------------------------------------------------------------------
// Chat store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ChatStoreType {
    /// In-memory, lost on restart.
    #[default]
    #[serde(alias = "volatile")]
    Volatile,
    /// One JSON file per entity type.
    #[serde(alias = "filesystem")]
    Filesystem,
    /// Azure Cosmos DB.
    #[serde(alias = "cosmos")]
    Cosmos,
}

impl fmt::Display for ChatStoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatStoreType::Volatile => write!(f, "Volatile"),
            ChatStoreType::Filesystem => write!(f, "Filesystem"),
            ChatStoreType::Cosmos => write!(f, "Cosmos"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatStoreOptions {
    #[serde(rename = "type")]
    pub kind: ChatStoreType,
    pub filesystem: Option<FileSystemOptions>,
    pub cosmos: Option<CosmosOptions>,
}

impl ChatStoreOptions {
    fn normalize(&mut self) {
        if let Some(fs) = self.filesystem.as_mut() {
            trim(&mut fs.file_path);
        }
        if let Some(cosmos) = self.cosmos.as_mut() {
            trim(&mut cosmos.connection_string);
            trim(&mut cosmos.database);
            trim(&mut cosmos.chat_sessions_container);
            trim(&mut cosmos.chat_messages_container);
            trim(&mut cosmos.chat_participants_container);
            trim(&mut cosmos.chat_memory_sources_container);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.kind {
            ChatStoreType::Volatile => Ok(()),
            ChatStoreType::Filesystem => {
                let fs = self.filesystem.as_ref().ok_or(ConfigError::MissingSection {
                    option: "chat_store",
                    kind: "Filesystem",
                    section: "chat_store.filesystem",
                })?;
                require(&fs.file_path, "chat_store", "Filesystem", "chat_store.filesystem.file_path")
            }
            ChatStoreType::Cosmos => {
                let cosmos = self.cosmos.as_ref().ok_or(ConfigError::MissingSection {
                    option: "chat_store",
                    kind: "Cosmos",
                    section: "chat_store.cosmos",
                })?;
                let fields = [
                    (&cosmos.connection_string, "chat_store.cosmos.connection_string"),
                    (&cosmos.database, "chat_store.cosmos.database"),
                    (&cosmos.chat_sessions_container, "chat_store.cosmos.chat_sessions_container"),
                    (&cosmos.chat_messages_container, "chat_store.cosmos.chat_messages_container"),
                    (
                        &cosmos.chat_participants_container,
                        "chat_store.cosmos.chat_participants_container",
                    ),
                    (
                        &cosmos.chat_memory_sources_container,
                        "chat_store.cosmos.chat_memory_sources_container",
                    ),
                ];
                for (value, field) in fields {
                    require(value, "chat_store", "Cosmos", field)?;
                }
                positive_timeout(
                    cosmos.request_timeout_secs,
                    "chat_store.cosmos.request_timeout_secs",
                )
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileSystemOptions {
    /// Base path; each entity type gets its own file derived from it.
    pub file_path: String,
}

/// Default per-request timeout for Cosmos DB calls.
pub const DEFAULT_COSMOS_TIMEOUT_SECS: u64 = 30;

/// Default per-request timeout for Form Recognizer calls.
pub const DEFAULT_FORM_RECOGNIZER_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CosmosOptions {
    /// `AccountEndpoint=...;AccountKey=...;`
    pub connection_string: String,
    pub database: String,
    pub chat_sessions_container: String,
    pub chat_messages_container: String,
    pub chat_participants_container: String,
    pub chat_memory_sources_container: String,
    pub request_timeout_secs: u64,
}

impl Default for CosmosOptions {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            database: String::new(),
            chat_sessions_container: String::new(),
            chat_messages_container: String::new(),
            chat_participants_container: String::new(),
            chat_memory_sources_container: String::new(),
            request_timeout_secs: DEFAULT_COSMOS_TIMEOUT_SECS,
        }
    }
}

impl CosmosOptions {
    /// Container that stores the given entity kind.
    pub fn container_for(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::ChatSessions => &self.chat_sessions_container,
            EntityKind::ChatMessages => &self.chat_messages_container,
            EntityKind::ChatParticipants => &self.chat_participants_container,
            EntityKind::MemorySources => &self.chat_memory_sources_container,
        }
    }
}

impl fmt::Debug for CosmosOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CosmosOptions")
            .field("connection_string", &"[REDACTED]")
            .field("database", &self.database)
            .field("chat_sessions_container", &self.chat_sessions_container)
            .field("chat_messages_container", &self.chat_messages_container)
            .field("chat_participants_container", &self.chat_participants_container)
            .field("chat_memory_sources_container", &self.chat_memory_sources_container)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// OCR
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum OcrSupportType {
    #[serde(alias = "azure_form_recognizer", alias = "azureformrecognizer")]
    AzureFormRecognizer,
    #[serde(alias = "tesseract")]
    Tesseract,
    #[default]
    #[serde(alias = "none")]
    None,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OcrSupportOptions {
    #[serde(rename = "type")]
    pub kind: OcrSupportType,
    pub tesseract: Option<TesseractOptions>,
    pub azure_form_recognizer: Option<AzureFormRecognizerOptions>,
}

impl OcrSupportOptions {
    fn normalize(&mut self) {
        if let Some(t) = self.tesseract.as_mut() {
            trim(&mut t.file_path);
            trim(&mut t.language);
        }
        if let Some(fr) = self.azure_form_recognizer.as_mut() {
            trim(&mut fr.endpoint);
            trim(&mut fr.key);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.kind {
            OcrSupportType::None => Ok(()),
            OcrSupportType::Tesseract => {
                let t = self.tesseract.as_ref().ok_or(ConfigError::MissingSection {
                    option: "ocr_support",
                    kind: "Tesseract",
                    section: "ocr_support.tesseract",
                })?;
                require(&t.file_path, "ocr_support", "Tesseract", "ocr_support.tesseract.file_path")?;
                require(&t.language, "ocr_support", "Tesseract", "ocr_support.tesseract.language")
            }
            OcrSupportType::AzureFormRecognizer => {
                let fr = self
                    .azure_form_recognizer
                    .as_ref()
                    .ok_or(ConfigError::MissingSection {
                        option: "ocr_support",
                        kind: "AzureFormRecognizer",
                        section: "ocr_support.azure_form_recognizer",
                    })?;
                require(
                    &fr.endpoint,
                    "ocr_support",
                    "AzureFormRecognizer",
                    "ocr_support.azure_form_recognizer.endpoint",
                )?;
                require(
                    &fr.key,
                    "ocr_support",
                    "AzureFormRecognizer",
                    "ocr_support.azure_form_recognizer.key",
                )?;
                positive_timeout(
                    fr.request_timeout_secs,
                    "ocr_support.azure_form_recognizer.request_timeout_secs",
                )
            }
        }
    }
}

/// Local Tesseract OCR options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TesseractOptions {
    /// Directory holding `{language}.traineddata`.
    pub file_path: String,
    pub language: String,
}

impl Default for TesseractOptions {
    fn default() -> Self {
        Self {
            file_path: String::new(),
            language: "eng".to_string(),
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AzureFormRecognizerOptions {
    pub endpoint: String,
    pub key: String,
    pub request_timeout_secs: u64,
}

impl Default for AzureFormRecognizerOptions {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            key: String::new(),
            request_timeout_secs: DEFAULT_FORM_RECOGNIZER_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for AzureFormRecognizerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureFormRecognizerOptions")
            .field("endpoint", &self.endpoint)
            .field("key", &"[REDACTED]")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// Defaults applied to newly created chats.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptOptions {
    /// First assistant message written into every new chat.
    pub initial_bot_message: String,
    pub system_description: String,
    pub memory_balance: f32,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            initial_bot_message: "Hello! How can I help you today?".to_string(),
            system_description: "This is a chat between an AI assistant and one or more \
                participants. Answer concisely and say so when you do not know something."
                .to_string(),
            memory_balance: DEFAULT_MEMORY_BALANCE,
        }
    }
}

impl PromptOptions {
    fn normalize(&mut self) {
        trim(&mut self.initial_bot_message);
        trim(&mut self.system_description);
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.memory_balance) {
            return Err(ConfigError::Invalid {
                field: "prompts.memory_balance",
                message: format!("{} is outside 0.0..=1.0", self.memory_balance),
            });
        }
        Ok(())
    }
}
