pub mod analysis;
pub mod app;
pub mod chat;
pub mod config;
pub mod confirm;
pub mod context;
pub mod draft;
pub mod error;
pub mod ids;
pub mod logging;
pub mod navigation;
pub mod state;
pub mod video;

pub use analysis::{image_data_url, mime_for_path, AnalysisClient, SuggestedAttributes};
pub use app::{Collaborators, SearchHit, WardrobeApp};
pub use chat::{ChatOutcome, ChatSessionManager, ChatState};
pub use config::{StoreBackend, WardrobeConfig};
pub use confirm::{AutoConfirm, Confirm, ConfirmPrompt, ConfirmationRegistry};
pub use context::WardrobeContext;
pub use draft::{parse_tags, ItemDraft};
pub use error::{
    AnalysisError, ChatError, ConfigError, StartupError, ValidationError, VideoError,
    WardrobeError,
};
pub use logging::init_logging;
pub use navigation::{Navigator, View};
pub use state::{DeleteOutcome, WardrobeState};
pub use video::{VideoAsset, VideoJobClient, VideoState};
