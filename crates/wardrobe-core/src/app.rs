//! Application facade wiring the state manager, navigator and the three
//! AI-backed clients together.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;
use wardrobe_provider::{
    ChatBackend, GeminiAnalyzer, GeminiChat, GeminiClient, GeminiVideo, ImageAnalyzer,
    VideoBackend,
};
use wardrobe_schema::{
    AspectRatio, ChatMessage, ClothingItem, Screen, SeasonFilter, StorageLocation,
};
use wardrobe_store::CollectionStore;

use crate::analysis::AnalysisClient;
use crate::chat::{ChatOutcome, ChatSessionManager, ChatState};
use crate::config::WardrobeConfig;
use crate::confirm::Confirm;
use crate::context::WardrobeContext;
use crate::draft::ItemDraft;
use crate::error::{AnalysisError, ChatError, StartupError, VideoError, WardrobeError};
use crate::navigation::{Navigator, View};
use crate::state::{DeleteOutcome, WardrobeState};
use crate::video::{VideoAsset, VideoJobClient, VideoState, DEFAULT_POLL_INTERVAL};

/// External services the app talks to.
pub struct Collaborators {
    pub analyzer: Arc<dyn ImageAnalyzer>,
    pub chat: Arc<dyn ChatBackend>,
    pub video: Arc<dyn VideoBackend>,
    pub video_credential: Option<String>,
    pub poll_interval: Duration,
}

impl Collaborators {
    pub fn new(
        analyzer: Arc<dyn ImageAnalyzer>,
        chat: Arc<dyn ChatBackend>,
        video: Arc<dyn VideoBackend>,
    ) -> Self {
        Self {
            analyzer,
            chat,
            video,
            video_credential: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Gemini-backed collaborators built from config.
    pub fn gemini(config: &WardrobeConfig) -> Result<Self, StartupError> {
        let api_key = config.api_key()?.to_string();
        let gemini = &config.gemini;
        let client = GeminiClient::new(gemini.base_url.clone(), config.request_timeout())
            .map_err(StartupError::Client)?;

        Ok(Self {
            analyzer: Arc::new(GeminiAnalyzer::new(
                client.clone(),
                api_key.clone(),
                gemini.analysis_model.clone(),
            )),
            chat: Arc::new(
                GeminiChat::new(client.clone(), api_key, gemini.chat_model.clone())
                    .with_thinking_budget(gemini.thinking_budget),
            ),
            video: Arc::new(GeminiVideo::new(
                client,
                gemini.video_model.clone(),
                gemini.video_resolution.clone(),
            )),
            video_credential: config.video.api_key.clone(),
            poll_interval: config.poll_interval(),
        })
    }
}

/// A search result with its location name resolved for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit<'a> {
    pub item: &'a ClothingItem,
    pub location_name: &'a str,
}

pub struct WardrobeApp {
    state: WardrobeState,
    navigator: Navigator,
    analysis: AnalysisClient,
    chat: ChatSessionManager,
    video: VideoJobClient,
    confirm: Arc<dyn Confirm>,
}

impl WardrobeApp {
    /// Open the configured store, load the wardrobe and connect to Gemini.
    pub async fn open(
        config: &WardrobeConfig,
        confirm: Arc<dyn Confirm>,
    ) -> Result<Self, StartupError> {
        let collaborators = Collaborators::gemini(config)?;
        let store = CollectionStore::new(config.open_store()?);
        let state = WardrobeState::load(store).await?;
        info!(data_dir = %config.data_dir.display(), "wardrobe app ready");
        Ok(Self::new(state, collaborators, confirm))
    }

    pub fn new(
        state: WardrobeState,
        collaborators: Collaborators,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        let video = VideoJobClient::new(collaborators.video)
            .with_poll_interval(collaborators.poll_interval)
            .with_credential(collaborators.video_credential);
        Self {
            state,
            navigator: Navigator::new(),
            analysis: AnalysisClient::new(collaborators.analyzer),
            chat: ChatSessionManager::new(collaborators.chat),
            video,
            confirm,
        }
    }

    pub fn state(&self) -> &WardrobeState {
        &self.state
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn current_view(&self) -> View<'_> {
        self.navigator.current_view(self.state.locations())
    }

    pub fn go_to(&mut self, screen: Screen) {
        self.navigator.go_to(screen);
    }

    pub fn select_location(&mut self, id: &str) {
        self.navigator.select_location(id);
    }

    pub async fn add_location(&mut self, name: &str) -> Result<StorageLocation, WardrobeError> {
        self.state.add_location(name).await
    }

    pub async fn delete_location(&mut self, id: &str) -> Result<DeleteOutcome, WardrobeError> {
        let result = self.state.delete_location(id, self.confirm.as_ref()).await;
        // A failed write still removed the location from memory.
        if self.state.location(id).is_none() {
            self.navigator.forget_location(id);
        }
        result
    }

    /// Items in the selected location, or none when nothing resolves.
    pub fn selected_location_items(&self) -> Vec<&ClothingItem> {
        match self.current_view() {
            View::Location(location) => self.state.query_by_location(&location.id),
            _ => Vec::new(),
        }
    }

    /// Analyze a photo and prefill a draft for `location_id`.
    pub async fn analyze_photo(
        &self,
        location_id: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<ItemDraft, AnalysisError> {
        let suggestion = self.analysis.analyze(image, mime_type).await?;
        Ok(ItemDraft::from_analysis(
            location_id,
            image,
            mime_type,
            suggestion,
        ))
    }

    pub async fn save_draft(&mut self, draft: ItemDraft) -> Result<ClothingItem, WardrobeError> {
        self.state.add_clothing_item(draft.into_new_item()).await
    }

    pub async fn delete_item(&mut self, id: &str) -> Result<DeleteOutcome, WardrobeError> {
        self.state
            .delete_clothing_item(id, self.confirm.as_ref())
            .await
    }

    pub fn search(&self, term: &str, filter: SeasonFilter) -> Vec<SearchHit<'_>> {
        self.state
            .search(term, filter)
            .into_iter()
            .map(|item| SearchHit {
                item,
                location_name: self.state.location_name(&item.storage_location_id),
            })
            .collect()
    }

    pub fn chat_messages(&self) -> &[ChatMessage] {
        self.chat.messages()
    }

    pub fn chat_state(&self) -> ChatState {
        self.chat.state()
    }

    /// Send a chat message with a snapshot of the current wardrobe.
    pub async fn send_chat<F>(
        &mut self,
        text: &str,
        cancel: &CancellationToken,
        observer: F,
    ) -> Result<ChatOutcome, ChatError>
    where
        F: FnMut(ChatState, &[ChatMessage]),
    {
        let context = WardrobeContext::capture(self.state.locations(), self.state.clothes());
        self.chat.send(text, &context, cancel, observer).await
    }

    pub fn reset_chat(&mut self) {
        self.chat.reset();
    }

    pub fn video_state(&self) -> &VideoState {
        self.video.state()
    }

    pub fn video_notice(&self) -> Option<&str> {
        self.video.notice()
    }

    pub fn select_video_credential(&mut self, credential: &str) -> Result<(), VideoError> {
        self.video.select_credential(credential)
    }

    pub async fn generate_video<F>(
        &mut self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        cancel: &CancellationToken,
        observer: F,
    ) -> Result<VideoAsset, VideoError>
    where
        F: FnMut(&VideoState),
    {
        self.video
            .submit(prompt, aspect_ratio, cancel, observer)
            .await
    }

    /// Retry writing collections left behind by an earlier failure.
    pub async fn flush(&mut self) -> Result<(), WardrobeError> {
        self.state.flush().await
    }
}
