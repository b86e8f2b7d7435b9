//! Chat service orchestrating sessions, messages, participants and sources.
//!
//! Multi-step operations (creating a chat, importing a document) are a
//! sequence of independent writes. There is no transaction across entity
//! types: a failure midway leaves the earlier records in place.

use chathub_types::chat::{
    ChatMessage, ChatMessageType, ChatParticipant, ChatSession, MemorySource, MemorySourceType,
};
use chathub_types::config::PromptOptions;
use chathub_types::error::{ChatError, RepositoryError};
use chathub_types::identity::UserIdentity;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::document::{self, DocumentKind, MAX_DOCUMENT_SIZE_BYTES};
use crate::ocr::BoxOcrEngine;
use crate::repository::{
    ChatMessageRepository, ChatParticipantRepository, ChatSessionRepository,
    MemorySourceRepository,
};
use crate::storage::StorageContext;

/// `count` value meaning "every remaining message".
pub const ALL_REMAINING: i64 = -1;

/// Result of creating a chat.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChat {
    pub session: ChatSession,
    pub initial_bot_message: ChatMessage,
}

/// Partial update of a chat session. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEdit {
    pub title: Option<String>,
    pub system_description: Option<String>,
    pub memory_balance: Option<f32>,
}

/// Result of importing a document into a chat.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedDocument {
    pub source: MemorySource,
    pub message: ChatMessage,
}

/// Orchestrates chat operations over the four repositories.
///
/// Generic over one storage context per entity type so that chathub-core
/// never depends on chathub-infra.
pub struct ChatService<SS, MS, PS, RS> {
    sessions: ChatSessionRepository<SS>,
    messages: ChatMessageRepository<MS>,
    participants: ChatParticipantRepository<PS>,
    sources: MemorySourceRepository<RS>,
    ocr: BoxOcrEngine,
    prompts: PromptOptions,
}

impl<SS, MS, PS, RS> ChatService<SS, MS, PS, RS>
where
    SS: StorageContext<ChatSession>,
    MS: StorageContext<ChatMessage>,
    PS: StorageContext<ChatParticipant>,
    RS: StorageContext<MemorySource>,
{
    pub fn new(
        sessions: ChatSessionRepository<SS>,
        messages: ChatMessageRepository<MS>,
        participants: ChatParticipantRepository<PS>,
        sources: MemorySourceRepository<RS>,
        ocr: BoxOcrEngine,
        prompts: PromptOptions,
    ) -> Self {
        Self {
            sessions,
            messages,
            participants,
            sources,
            ocr,
            prompts,
        }
    }

    pub fn sessions(&self) -> &ChatSessionRepository<SS> {
        &self.sessions
    }

    pub fn messages(&self) -> &ChatMessageRepository<MS> {
        &self.messages
    }

    pub fn participants(&self) -> &ChatParticipantRepository<PS> {
        &self.participants
    }

    pub fn sources(&self) -> &MemorySourceRepository<RS> {
        &self.sources
    }

    pub fn ocr_engine(&self) -> &BoxOcrEngine {
        &self.ocr
    }

    // --- Sessions ---

    /// Create a chat owned by `user`.
    ///
    /// Writes the session, then the initial bot message, then the creator's
    /// participant record.
    pub async fn create_chat(&self, user: &UserIdentity, title: &str) -> Result<NewChat, ChatError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ChatError::Validation("title must not be empty".to_string()));
        }

        let session = ChatSession::new(
            title,
            self.prompts.system_description.clone(),
            self.prompts.memory_balance,
        );
        self.sessions.create(&session).await?;

        let initial_bot_message =
            ChatMessage::from_bot(session.id, self.prompts.initial_bot_message.clone());
        self.messages.create(&initial_bot_message).await?;

        self.participants
            .create(&ChatParticipant::new(user.user_id.clone(), session.id))
            .await?;

        info!(chat_id = %session.id, user_id = %user.user_id, "Chat created");
        Ok(NewChat {
            session,
            initial_bot_message,
        })
    }

    /// All chats the user participates in, newest first.
    pub async fn list_chats(&self, user_id: &str) -> Result<Vec<ChatSession>, ChatError> {
        let memberships = self.participants.find_by_user_id(user_id).await?;
        let mut chats = Vec::with_capacity(memberships.len());
        for membership in memberships {
            match self.sessions.try_find_by_id(&membership.chat_id).await? {
                Some(session) => chats.push(session),
                None => warn!(
                    chat_id = %membership.chat_id,
                    user_id,
                    "Participant record points at a missing chat"
                ),
            }
        }
        chats.sort_by(|a, b| b.created_on.cmp(&a.created_on));
        Ok(chats)
    }

    pub async fn get_chat(&self, chat_id: &Uuid) -> Result<Option<ChatSession>, ChatError> {
        Ok(self.sessions.try_find_by_id(chat_id).await?)
    }

    /// Apply a partial edit and persist it. Returns the updated session.
    pub async fn edit_chat(&self, chat_id: &Uuid, edit: ChatEdit) -> Result<ChatSession, ChatError> {
        let mut session = self
            .sessions
            .try_find_by_id(chat_id)
            .await?
            .ok_or(ChatError::NotFound)?;

        if let Some(title) = edit.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(ChatError::Validation("title must not be empty".to_string()));
            }
            session.title = title.to_string();
        }
        if let Some(description) = edit.system_description {
            session.system_description = description;
        }
        if let Some(balance) = edit.memory_balance {
            if !(0.0..=1.0).contains(&balance) {
                return Err(ChatError::Validation(format!(
                    "memoryBalance {balance} is outside 0.0..=1.0"
                )));
            }
            session.memory_balance = balance;
        }

        self.sessions.upsert(&session).await?;
        info!(chat_id = %chat_id, "Chat edited");
        Ok(session)
    }

    // --- Messages ---

    /// Messages of a chat, newest first, skipping `start_idx` and taking
    /// `count` (or all remaining when `count` is [`ALL_REMAINING`]).
    pub async fn get_messages(
        &self,
        chat_id: &Uuid,
        start_idx: i64,
        count: i64,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        validate_page(start_idx, count)?;
        let messages = self.messages.find_by_chat_id(chat_id).await?;
        Ok(paginate(messages, start_idx, count))
    }

    // --- Participants ---

    pub async fn is_participant(&self, user_id: &str, chat_id: &Uuid) -> Result<bool, ChatError> {
        Ok(self.participants.is_user_in_chat(user_id, chat_id).await?)
    }

    pub async fn list_participants(&self, chat_id: &Uuid) -> Result<Vec<ChatParticipant>, ChatError> {
        Ok(self.participants.find_by_chat_id(chat_id).await?)
    }

    /// Add `user_id` to an existing chat.
    pub async fn join_chat(&self, user_id: &str, chat_id: &Uuid) -> Result<ChatParticipant, ChatError> {
        if self.sessions.try_find_by_id(chat_id).await?.is_none() {
            return Err(ChatError::NotFound);
        }
        if self.participants.is_user_in_chat(user_id, chat_id).await? {
            return Err(ChatError::AlreadyParticipant(user_id.to_string()));
        }

        let participant = ChatParticipant::new(user_id, *chat_id);
        match self.participants.create(&participant).await {
            Ok(()) => {}
            Err(RepositoryError::Conflict(_)) => {
                return Err(ChatError::AlreadyParticipant(user_id.to_string()));
            }
            Err(err) => return Err(err.into()),
        }
        info!(chat_id = %chat_id, user_id, "User joined chat");
        Ok(participant)
    }

    // --- Sources ---

    pub async fn list_sources(&self, chat_id: &Uuid) -> Result<Vec<MemorySource>, ChatError> {
        Ok(self.sources.find_by_chat_id(chat_id).await?)
    }

    /// Import a document into a chat's memory.
    ///
    /// Text documents are decoded as UTF-8; images go through the OCR engine.
    /// Records a memory source and a `Document` message announcing the upload.
    pub async fn import_document(
        &self,
        user: &UserIdentity,
        chat_id: &Uuid,
        file_name: &str,
        content: &[u8],
    ) -> Result<ImportedDocument, ChatError> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Err(ChatError::Validation("fileName must not be empty".to_string()));
        }
        if content.is_empty() {
            return Err(ChatError::Validation("document is empty".to_string()));
        }
        if content.len() > MAX_DOCUMENT_SIZE_BYTES {
            return Err(ChatError::Validation(format!(
                "document exceeds maximum size of {MAX_DOCUMENT_SIZE_BYTES} bytes"
            )));
        }
        if self.sessions.try_find_by_id(chat_id).await?.is_none() {
            return Err(ChatError::NotFound);
        }

        let text = match document::classify(file_name) {
            DocumentKind::Text => String::from_utf8(content.to_vec())
                .map_err(|_| ChatError::Validation("document is not valid UTF-8".to_string()))?,
            DocumentKind::Image(mime_type) => {
                tracing::debug!(engine = self.ocr.name(), file_name, "Running OCR");
                self.ocr.read_text(content, mime_type).await?
            }
            DocumentKind::Unsupported(ext) => {
                return Err(ChatError::Validation(format!(
                    "unsupported document type '.{ext}'"
                )));
            }
        };
        if text.trim().is_empty() {
            return Err(ChatError::Validation(
                "no text could be extracted from the document".to_string(),
            ));
        }

        let size = content.len() as u64;
        let source = MemorySource {
            id: Uuid::now_v7(),
            chat_id: *chat_id,
            name: file_name.to_string(),
            hyper_link: None,
            source_type: MemorySourceType::File,
            shared_by: user.user_id.clone(),
            created_on: Utc::now(),
            size,
            tokens: document::estimate_tokens(&text),
        };
        self.sources.create(&source).await?;

        let announcement = serde_json::json!({
            "documents": [{
                "name": file_name,
                "size": document::format_size(size),
                "isUploaded": true,
            }]
        });
        let message = ChatMessage::from_user(
            *chat_id,
            user.user_id.clone(),
            user.user_name.clone(),
            announcement.to_string(),
        )
        .with_type(ChatMessageType::Document);
        self.messages.create(&message).await?;

        info!(
            chat_id = %chat_id,
            file_name,
            size,
            tokens = source.tokens,
            "Document imported"
        );
        Ok(ImportedDocument { source, message })
    }
}

fn validate_page(start_idx: i64, count: i64) -> Result<(), ChatError> {
    if start_idx < 0 {
        return Err(ChatError::Validation("startIdx must not be negative".to_string()));
    }
    if count < ALL_REMAINING {
        return Err(ChatError::Validation(
            "count must be -1 (all remaining) or a non-negative number".to_string(),
        ));
    }
    Ok(())
}

/// Sort newest first and slice. Ties on timestamp fall back to id order.
fn paginate(mut messages: Vec<ChatMessage>, start_idx: i64, count: i64) -> Vec<ChatMessage> {
    messages.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.id.cmp(&a.id))
    });
    let remaining = messages.into_iter().skip(start_idx as usize);
    if count == ALL_REMAINING {
        remaining.collect()
    } else {
        remaining.take(count as usize).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{NullOcrEngine, OcrEngine};
    use crate::storage::testing::MapContext;
    use chathub_types::chat::AuthorRole;
    use chathub_types::error::OcrError;
    use chrono::Duration;

    type TestService = ChatService<
        MapContext<ChatSession>,
        MapContext<ChatMessage>,
        MapContext<ChatParticipant>,
        MapContext<MemorySource>,
    >;

    struct EchoOcr;

    impl OcrEngine for EchoOcr {
        fn name(&self) -> &str {
            "echo"
        }

        async fn read_text(&self, image: &[u8], _mime_type: &str) -> Result<String, OcrError> {
            Ok(format!("{} bytes of text", image.len()))
        }
    }

    fn service_with(ocr: BoxOcrEngine) -> TestService {
        ChatService::new(
            ChatSessionRepository::new(MapContext::new()),
            ChatMessageRepository::new(MapContext::new()),
            ChatParticipantRepository::new(MapContext::new()),
            MemorySourceRepository::new(MapContext::new()),
            ocr,
            PromptOptions::default(),
        )
    }

    fn service() -> TestService {
        service_with(BoxOcrEngine::new(NullOcrEngine))
    }

    fn alice() -> UserIdentity {
        UserIdentity::new("alice", "Alice")
    }

    #[tokio::test]
    async fn test_create_chat_writes_session_message_and_participant() {
        let svc = service();
        let created = svc.create_chat(&alice(), "  Trip planning ").await.unwrap();

        assert_eq!(created.session.title, "Trip planning");
        assert_eq!(created.initial_bot_message.author_role, AuthorRole::Bot);
        assert_eq!(
            created.initial_bot_message.content,
            PromptOptions::default().initial_bot_message
        );

        let stored = svc.get_chat(&created.session.id).await.unwrap().unwrap();
        assert_eq!(stored, created.session);
        assert!(svc.is_participant("alice", &created.session.id).await.unwrap());
        let messages = svc.get_messages(&created.session.id, 0, ALL_REMAINING).await.unwrap();
        assert_eq!(messages, vec![created.initial_bot_message]);
    }

    #[tokio::test]
    async fn test_create_chat_rejects_blank_title() {
        let svc = service();
        assert!(matches!(
            svc.create_chat(&alice(), "   ").await,
            Err(ChatError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_chats_only_returns_memberships() {
        let svc = service();
        let a = svc.create_chat(&alice(), "A").await.unwrap();
        let _b = svc
            .create_chat(&UserIdentity::new("bob", "Bob"), "B")
            .await
            .unwrap();

        let chats = svc.list_chats("alice").await.unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].id, a.session.id);
        assert!(svc.list_chats("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_message_pagination_newest_first() {
        let svc = service();
        let chat = svc.create_chat(&alice(), "Paging").await.unwrap().session;

        let base = Utc::now() + Duration::seconds(10);
        for i in 0..5 {
            let mut msg = ChatMessage::from_user(chat.id, "alice", "Alice", format!("m{i}"));
            msg.timestamp = base + Duration::seconds(i);
            svc.messages().create(&msg).await.unwrap();
        }

        let all = svc.get_messages(&chat.id, 0, ALL_REMAINING).await.unwrap();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].content, "m4");
        assert_eq!(all[5].author_role, AuthorRole::Bot);

        let page = svc.get_messages(&chat.id, 1, 2).await.unwrap();
        let contents: Vec<_> = page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m2"]);

        let tail = svc.get_messages(&chat.id, 4, ALL_REMAINING).await.unwrap();
        assert_eq!(tail.len(), 2);

        assert!(svc.get_messages(&chat.id, 10, 5).await.unwrap().is_empty());
        assert!(svc.get_messages(&chat.id, 0, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_message_pagination_rejects_bad_arguments() {
        let svc = service();
        let chat = Uuid::now_v7();
        assert!(matches!(
            svc.get_messages(&chat, -1, 5).await,
            Err(ChatError::Validation(_))
        ));
        assert!(matches!(
            svc.get_messages(&chat, 0, -2).await,
            Err(ChatError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_edit_chat_applies_present_fields() {
        let svc = service();
        let chat = svc.create_chat(&alice(), "Before").await.unwrap().session;

        let edited = svc
            .edit_chat(
                &chat.id,
                ChatEdit {
                    title: Some("After".to_string()),
                    memory_balance: Some(0.8),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.title, "After");
        assert_eq!(edited.system_description, chat.system_description);
        assert!((edited.memory_balance - 0.8).abs() < f32::EPSILON);
        assert_eq!(svc.get_chat(&chat.id).await.unwrap().unwrap(), edited);
    }

    #[tokio::test]
    async fn test_edit_chat_errors() {
        let svc = service();
        assert!(matches!(
            svc.edit_chat(&Uuid::now_v7(), ChatEdit::default()).await,
            Err(ChatError::NotFound)
        ));

        let chat = svc.create_chat(&alice(), "Chat").await.unwrap().session;
        let bad = ChatEdit {
            memory_balance: Some(2.0),
            ..Default::default()
        };
        assert!(matches!(
            svc.edit_chat(&chat.id, bad).await,
            Err(ChatError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_join_chat() {
        let svc = service();
        let chat = svc.create_chat(&alice(), "Shared").await.unwrap().session;

        svc.join_chat("bob", &chat.id).await.unwrap();
        assert_eq!(svc.list_participants(&chat.id).await.unwrap().len(), 2);

        assert!(matches!(
            svc.join_chat("bob", &chat.id).await,
            Err(ChatError::AlreadyParticipant(_))
        ));
        assert!(matches!(
            svc.join_chat("bob", &Uuid::now_v7()).await,
            Err(ChatError::NotFound)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_admit_one() {
        let svc = std::sync::Arc::new(service());
        let chat = svc.create_chat(&alice(), "Shared").await.unwrap().session;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let svc = svc.clone();
            let chat_id = chat.id;
            handles.push(tokio::spawn(async move { svc.join_chat("bob", &chat_id).await }));
        }
        let mut joined = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => joined += 1,
                Err(ChatError::AlreadyParticipant(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(joined, 1);
        assert_eq!(svc.list_participants(&chat.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_import_text_document() {
        let svc = service();
        let chat = svc.create_chat(&alice(), "Docs").await.unwrap().session;

        let imported = svc
            .import_document(&alice(), &chat.id, "notes.txt", b"twelve chars")
            .await
            .unwrap();
        assert_eq!(imported.source.tokens, 3);
        assert_eq!(imported.source.size, 12);
        assert_eq!(imported.message.message_type, ChatMessageType::Document);

        let sources = svc.list_sources(&chat.id).await.unwrap();
        assert_eq!(sources, vec![imported.source]);
    }

    #[tokio::test]
    async fn test_import_image_uses_ocr() {
        let svc = service_with(BoxOcrEngine::new(EchoOcr));
        let chat = svc.create_chat(&alice(), "Scans").await.unwrap().session;

        let imported = svc
            .import_document(&alice(), &chat.id, "scan.png", &[0u8; 8])
            .await
            .unwrap();
        assert_eq!(imported.source.name, "scan.png");
        assert!(imported.source.tokens > 0);
    }

    #[tokio::test]
    async fn test_import_image_without_ocr_fails() {
        let svc = service();
        let chat = svc.create_chat(&alice(), "Scans").await.unwrap().session;

        let err = svc
            .import_document(&alice(), &chat.id, "scan.png", &[1, 2, 3])
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Ocr(OcrError::NotSupported)));
        assert!(svc.list_sources(&chat.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_rejects_unsupported_and_missing_chat() {
        let svc = service();
        let chat = svc.create_chat(&alice(), "Docs").await.unwrap().session;

        assert!(matches!(
            svc.import_document(&alice(), &chat.id, "report.pdf", b"%PDF").await,
            Err(ChatError::Validation(_))
        ));
        assert!(matches!(
            svc.import_document(&alice(), &Uuid::now_v7(), "a.txt", b"hi").await,
            Err(ChatError::NotFound)
        ));
    }
}
