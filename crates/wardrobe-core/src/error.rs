use wardrobe_store::StoreError;

/// Message shown in place of the bot reply when a chat exchange fails.
pub const CHAT_ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";
/// Message shown when image analysis fails for any reason.
pub const ANALYSIS_ERROR_MESSAGE: &str = "Failed to analyze image. Please try again.";
/// Message shown when the video service no longer recognizes the credential.
pub const INVALID_KEY_MESSAGE: &str =
    "API Key not valid. Please select a valid key from a paid project.";

/// Signature the video service returns for unknown or unauthorized credentials.
pub(crate) const ENTITY_NOT_FOUND: &str = "Requested entity was not found";

/// Input rejected before any work is done.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("location name must not be empty")]
    EmptyLocationName,
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("image must not be empty")]
    EmptyImage,
}

#[derive(Debug, thiserror::Error)]
pub enum WardrobeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("location not found: {0}")]
    LocationNotFound(String),
    #[error("clothing item not found: {0}")]
    ItemNotFound(String),
    #[error("failed to save wardrobe: {0}")]
    Persistence(#[from] StoreError),
}

impl WardrobeError {
    pub fn user_message(&self) -> String {
        match self {
            WardrobeError::Persistence(_) => {
                "Your changes could not be saved. Free up storage and try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to analyze image. Please try again.")]
    Failed(#[source] anyhow::Error),
}

impl AnalysisError {
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Validation(e) => e.to_string(),
            AnalysisError::Failed(_) => ANALYSIS_ERROR_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("chat transport error: {0:#}")]
    Transport(#[source] anyhow::Error),
}

impl ChatError {
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Validation(e) => e.to_string(),
            ChatError::Transport(_) => CHAT_ERROR_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("select an API key before generating a video")]
    NoCredential,
    #[error("{0}")]
    Job(String),
    #[error("Video generation failed to return a link.")]
    NoLink,
    #[error("Failed to fetch video: {0}")]
    Fetch(String),
    #[error("video generation cancelled")]
    Cancelled,
}

impl VideoError {
    pub(crate) fn job(error: anyhow::Error) -> Self {
        VideoError::Job(format!("{error:#}"))
    }

    /// The service rejected the credential; the user has to pick another one.
    pub fn is_invalid_credential(&self) -> bool {
        match self {
            VideoError::Job(message) | VideoError::Fetch(message) => {
                message.contains(ENTITY_NOT_FOUND)
            }
            _ => false,
        }
    }

    pub fn user_message(&self) -> String {
        if self.is_invalid_credential() {
            return INVALID_KEY_MESSAGE.to_string();
        }
        self.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("API_KEY environment variable not set.")]
    MissingApiKey,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Wardrobe(#[from] WardrobeError),
    #[error("failed to set up gemini client: {0:#}")]
    Client(#[source] anyhow::Error),
}
