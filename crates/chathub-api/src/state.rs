//! Application state wiring all services together.
//!
//! `ChatService` is generic over one storage context per entity type;
//! AppState pins it to the configuration-selected infra backends.

use std::sync::Arc;

use chathub_core::chat::service::ChatService;
use chathub_core::event::RelayHub;
use chathub_core::ocr::BoxOcrEngine;
use chathub_core::repository::Repository;
use chathub_infra::auth::AzureAdValidator;
use chathub_infra::ocr::build_ocr_engine;
use chathub_infra::storage::{AnyStorageContext, ChatStores, build_chat_stores};
use chathub_types::chat::{ChatMessage, ChatParticipant, ChatSession, MemorySource};
use chathub_types::config::{AppConfig, AuthenticationType};
use chathub_types::error::ConfigError;

/// Buffered relay events per subscriber before it starts lagging.
const RELAY_CAPACITY: usize = 256;

/// Concrete chat service pinned to the runtime-selected storage backend.
pub type ConcreteChatService = ChatService<
    AnyStorageContext<ChatSession>,
    AnyStorageContext<ChatMessage>,
    AnyStorageContext<ChatParticipant>,
    AnyStorageContext<MemorySource>,
>;

/// How callers are identified.
pub enum AuthScheme {
    /// Every request runs as the fixed default user.
    PassThrough,
    AzureAd(AzureAdValidator),
}

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub relay: RelayHub,
    pub auth: Arc<AuthScheme>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Build storage, OCR and authentication from `config`.
    ///
    /// Any misconfigured backend fails here, before the listener is bound.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let stores = build_chat_stores(&config.chat_store).await?;
        let ocr = build_ocr_engine(&config.ocr_support)?;

        let auth = match config.authentication.kind {
            AuthenticationType::None => {
                tracing::warn!(
                    "Authentication is disabled; every request runs as the default user. \
                     Use this for local development only."
                );
                AuthScheme::PassThrough
            }
            AuthenticationType::AzureAd => {
                let options =
                    config
                        .authentication
                        .azure_ad
                        .as_ref()
                        .ok_or(ConfigError::MissingSection {
                            option: "authentication",
                            kind: "AzureAd",
                            section: "authentication.azure_ad",
                        })?;
                let validator = AzureAdValidator::new(options)?;
                tracing::info!(
                    issuer = validator.issuer(),
                    audience = validator.audience(),
                    "Azure AD authentication enabled"
                );
                AuthScheme::AzureAd(validator)
            }
        };

        Ok(Self::from_parts(stores, ocr, auth, config))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        stores: ChatStores,
        ocr: BoxOcrEngine,
        auth: AuthScheme,
        config: AppConfig,
    ) -> Self {
        let chat_service = ChatService::new(
            Repository::new(stores.sessions),
            Repository::new(stores.messages),
            Repository::new(stores.participants),
            Repository::new(stores.sources),
            ocr,
            config.prompts.clone(),
        );

        Self {
            chat_service: Arc::new(chat_service),
            relay: RelayHub::new(RELAY_CAPACITY),
            auth: Arc::new(auth),
            config: Arc::new(config),
        }
    }
}
