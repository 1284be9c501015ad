//! Video job client: submits a generation job, polls it at a fixed interval
//! until it reports done, then fetches the produced asset.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wardrobe_provider::{VideoBackend, VideoRequest};
use wardrobe_schema::AspectRatio;

use crate::error::{ValidationError, VideoError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10_000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAsset {
    pub uri: String,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoState {
    /// No credential selected; submissions are refused.
    NoKey,
    Ready,
    Pending {
        handle: String,
    },
    Resolving,
    Complete(VideoAsset),
    Failed {
        message: String,
    },
}

impl VideoState {
    /// Job in flight; the UI shows an indeterminate progress indicator.
    pub fn is_busy(&self) -> bool {
        matches!(self, VideoState::Pending { .. } | VideoState::Resolving)
    }
}

pub struct VideoJobClient {
    backend: Arc<dyn VideoBackend>,
    credential: Option<String>,
    poll_interval: Duration,
    state: VideoState,
    /// Why the last credential was dropped, until another one is selected.
    notice: Option<String>,
}

impl VideoJobClient {
    pub fn new(backend: Arc<dyn VideoBackend>) -> Self {
        Self {
            backend,
            credential: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            state: VideoState::NoKey,
            notice: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Start Ready when a credential is already known.
    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        if let Some(key) = credential.filter(|k| !k.trim().is_empty()) {
            self.credential = Some(key);
            self.state = VideoState::Ready;
        }
        self
    }

    pub fn state(&self) -> &VideoState {
        &self.state
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// Message explaining a demotion to [`VideoState::NoKey`].
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Store the credential the user picked and move to Ready.
    pub fn select_credential(&mut self, credential: impl Into<String>) -> Result<(), VideoError> {
        let credential = credential.into();
        if credential.trim().is_empty() {
            return Err(VideoError::NoCredential);
        }
        self.credential = Some(credential);
        self.notice = None;
        if !self.state.is_busy() {
            self.state = VideoState::Ready;
        }
        info!("video credential selected");
        Ok(())
    }

    /// Run one job to completion. `observer` sees every state transition.
    pub async fn submit<F>(
        &mut self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        cancel: &CancellationToken,
        mut observer: F,
    ) -> Result<VideoAsset, VideoError>
    where
        F: FnMut(&VideoState),
    {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ValidationError::EmptyPrompt.into());
        }
        let Some(credential) = self.credential.clone() else {
            return Err(VideoError::NoCredential);
        };

        let request = VideoRequest {
            prompt: prompt.to_string(),
            aspect_ratio,
        };
        let result = self
            .run(&request, &credential, cancel, &mut observer)
            .await;

        match result {
            Ok(asset) => {
                info!(uri = %asset.uri, bytes = asset.data.len(), "video ready");
                self.transition(VideoState::Complete(asset.clone()), &mut observer);
                Ok(asset)
            }
            Err(VideoError::Cancelled) => {
                info!("video job cancelled");
                self.transition(VideoState::Ready, &mut observer);
                Err(VideoError::Cancelled)
            }
            Err(e) => {
                warn!(error = %e, "video generation failed");
                let message = e.user_message();
                self.transition(
                    VideoState::Failed {
                        message: message.clone(),
                    },
                    &mut observer,
                );
                if e.is_invalid_credential() {
                    self.credential = None;
                    self.notice = Some(message);
                    self.transition(VideoState::NoKey, &mut observer);
                }
                Err(e)
            }
        }
    }

    async fn run<F>(
        &mut self,
        request: &VideoRequest,
        credential: &str,
        cancel: &CancellationToken,
        observer: &mut F,
    ) -> Result<VideoAsset, VideoError>
    where
        F: FnMut(&VideoState),
    {
        if cancel.is_cancelled() {
            return Err(VideoError::Cancelled);
        }

        let mut job = self
            .backend
            .create_job(request, credential)
            .await
            .map_err(VideoError::job)?;
        let handle = job.handle.clone();
        info!(%handle, aspect_ratio = %request.aspect_ratio, "video job submitted");
        self.transition(
            VideoState::Pending {
                handle: handle.clone(),
            },
            observer,
        );

        let mut polls = 0u32;
        while !job.done {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(VideoError::Cancelled),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
            polls += 1;
            job = self
                .backend
                .job_status(&handle, credential)
                .await
                .map_err(VideoError::job)?;
            debug!(%handle, polls, done = job.done, "video job polled");
        }

        self.transition(VideoState::Resolving, observer);
        if let Some(message) = job.error {
            return Err(VideoError::Job(message));
        }
        let uri = job.result_uri.ok_or(VideoError::NoLink)?;

        let data = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(VideoError::Cancelled),
            fetched = self.backend.fetch_asset(&uri, credential) => {
                fetched.map_err(|e| VideoError::Fetch(format!("{e:#}")))?
            }
        };
        Ok(VideoAsset { uri, data })
    }

    fn transition<F>(&mut self, next: VideoState, observer: &mut F)
    where
        F: FnMut(&VideoState),
    {
        self.state = next;
        observer(&self.state);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use wardrobe_provider::VideoJob;

    use super::*;
    use crate::error::INVALID_KEY_MESSAGE;

    #[derive(Default)]
    struct FakeVideo {
        statuses: Mutex<VecDeque<anyhow::Result<VideoJob>>>,
        create_error: Option<String>,
        fetch_error: Option<String>,
        keys: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VideoBackend for FakeVideo {
        async fn create_job(
            &self,
            _request: &VideoRequest,
            api_key: &str,
        ) -> anyhow::Result<VideoJob> {
            self.keys.lock().unwrap().push(api_key.to_string());
            match &self.create_error {
                Some(message) => Err(anyhow::anyhow!(message.clone())),
                None => Ok(VideoJob::pending("operations/op-1")),
            }
        }

        async fn job_status(&self, _handle: &str, _api_key: &str) -> anyhow::Result<VideoJob> {
            self.statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(VideoJob::finished("operations/op-1", None)))
        }

        async fn fetch_asset(&self, _uri: &str, _api_key: &str) -> anyhow::Result<Bytes> {
            match &self.fetch_error {
                Some(message) => Err(anyhow::anyhow!(message.clone())),
                None => Ok(Bytes::from_static(b"MP4")),
            }
        }
    }

    fn finished_with_link() -> anyhow::Result<VideoJob> {
        Ok(VideoJob::finished(
            "operations/op-1",
            Some("https://files/v1".into()),
        ))
    }

    fn client(fake: FakeVideo) -> VideoJobClient {
        VideoJobClient::new(Arc::new(fake))
            .with_poll_interval(Duration::from_millis(10))
            .with_credential(Some("paid-key".into()))
    }

    #[tokio::test]
    async fn starts_without_key() {
        let client = VideoJobClient::new(Arc::new(FakeVideo::default()));
        assert_eq!(*client.state(), VideoState::NoKey);
        assert!(!client.has_credential());
    }

    #[tokio::test]
    async fn submit_without_key_is_refused() {
        let mut client = VideoJobClient::new(Arc::new(FakeVideo::default()));
        let err = client
            .submit("a cat", AspectRatio::Landscape, &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, VideoError::NoCredential));
        assert_eq!(*client.state(), VideoState::NoKey);
    }

    #[tokio::test]
    async fn blank_prompt_is_refused_before_any_request() {
        let fake = Arc::new(FakeVideo::default());
        let mut client = VideoJobClient::new(fake.clone()).with_credential(Some("k".into()));
        let err = client
            .submit("  ", AspectRatio::Portrait, &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VideoError::Validation(ValidationError::EmptyPrompt)
        ));
        assert!(fake.keys.lock().unwrap().is_empty());
        assert_eq!(*client.state(), VideoState::Ready);
    }

    #[tokio::test]
    async fn completed_job_walks_through_states() {
        let fake = FakeVideo {
            statuses: Mutex::new(VecDeque::from([finished_with_link()])),
            ..Default::default()
        };
        let mut client = client(fake);
        let mut seen = Vec::new();

        let asset = client
            .submit("a cat", AspectRatio::Landscape, &CancellationToken::new(), |s| {
                seen.push(s.clone())
            })
            .await
            .unwrap();

        assert_eq!(asset.data.as_ref(), b"MP4");
        assert_eq!(seen.len(), 3);
        assert!(matches!(seen[0], VideoState::Pending { ref handle } if handle == "operations/op-1"));
        assert_eq!(seen[1], VideoState::Resolving);
        assert!(matches!(seen[2], VideoState::Complete(_)));
    }

    #[tokio::test]
    async fn missing_link_fails() {
        let mut client = client(FakeVideo::default());
        let err = client
            .submit("a cat", AspectRatio::Landscape, &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, VideoError::NoLink));
        assert_eq!(
            *client.state(),
            VideoState::Failed {
                message: "Video generation failed to return a link.".into()
            }
        );
        assert!(client.has_credential());
    }

    #[tokio::test]
    async fn rejected_key_demotes_to_no_key() {
        let fake = FakeVideo {
            create_error: Some(
                "gemini api error (404 Not Found): Requested entity was not found.".into(),
            ),
            ..Default::default()
        };
        let mut client = client(fake);
        let mut seen = Vec::new();
        let err = client
            .submit("a cat", AspectRatio::Landscape, &CancellationToken::new(), |s| {
                seen.push(s.clone())
            })
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), INVALID_KEY_MESSAGE);
        assert_eq!(
            seen,
            vec![
                VideoState::Failed {
                    message: INVALID_KEY_MESSAGE.into()
                },
                VideoState::NoKey
            ]
        );
        assert_eq!(*client.state(), VideoState::NoKey);
        assert_eq!(client.notice(), Some(INVALID_KEY_MESSAGE));
        assert!(!client.has_credential());

        client.select_credential("fresh-key").unwrap();
        assert_eq!(client.notice(), None);
        assert_eq!(*client.state(), VideoState::Ready);
    }

    #[tokio::test]
    async fn fetch_failure_surfaces_message() {
        let fake = FakeVideo {
            statuses: Mutex::new(VecDeque::from([finished_with_link()])),
            fetch_error: Some("gemini api error (500): boom".into()),
            ..Default::default()
        };
        let mut client = client(fake);
        let err = client
            .submit("a cat", AspectRatio::Landscape, &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, VideoError::Fetch(_)));
        match client.state() {
            VideoState::Failed { message } => assert!(message.contains("boom")),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_client_can_submit_again() {
        let fake = FakeVideo {
            statuses: Mutex::new(VecDeque::from([
                Ok(VideoJob::finished("operations/op-1", None)),
                finished_with_link(),
            ])),
            ..Default::default()
        };
        let mut client = client(fake);
        let cancel = CancellationToken::new();
        assert!(client
            .submit("a cat", AspectRatio::Landscape, &cancel, |_| {})
            .await
            .is_err());
        assert!(client
            .submit("a cat", AspectRatio::Landscape, &cancel, |_| {})
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn selecting_a_credential_readies_client() {
        let mut client = VideoJobClient::new(Arc::new(FakeVideo::default()));
        assert!(client.select_credential(" ").is_err());
        client.select_credential("paid-key").unwrap();
        assert_eq!(*client.state(), VideoState::Ready);
    }
}
