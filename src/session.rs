//! Capture session: capture a frame, recognize it, clean the text, publish the result.
//!
//! State lives in an explicit machine (`SessionState` + `transition`). A capture is refused
//! while another one is in flight. Every awaited collaborator call is followed by a check of
//! the session's `CancelToken`; once the host has cancelled, results are dropped and neither
//! the state nor the displayed document is touched again.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::reflow::{
    prepare_words, reflow_words, CleanedDocument, FilteredWord, ReflowConfig, ReflowOutput,
};
use crate::system::{
    cleanup_with_fallback, spawn_ocr_worker, CaptureError, FrameSource, OcrEngine, OcrError,
    OcrHandle, RecognizedWord, TextGenerator,
};

/// Shown instead of an empty document.
pub const NO_CONTENT_MESSAGE: &str = "No text detected.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Engine or capture device could not be set up.
    Init,
    /// A frame could not be captured.
    Acquisition,
    /// The engine failed on a frame.
    Engine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFault {
    pub kind: FaultKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Initializing,
    Ready,
    Capturing,
    Analyzing,
    Error(SessionFault),
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Capturing => "capturing",
            Self::Analyzing => "analyzing",
            Self::Error(_) => "error",
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Capturing | Self::Analyzing)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(fault) => write!(f, "error ({:?}): {}", fault.kind, fault.message),
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Initialize,
    EngineReady,
    InitFailed(String),
    CaptureRequested,
    FrameCaptured,
    CaptureFailed(String),
    AnalysisFinished,
    AnalysisFailed(String),
    Shutdown,
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::EngineReady => "engine_ready",
            Self::InitFailed(_) => "init_failed",
            Self::CaptureRequested => "capture_requested",
            Self::FrameCaptured => "frame_captured",
            Self::CaptureFailed(_) => "capture_failed",
            Self::AnalysisFinished => "analysis_finished",
            Self::AnalysisFailed(_) => "analysis_failed",
            Self::Shutdown => "shutdown",
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("A capture is already in progress")]
    Busy,
    #[error("Session is not ready (state: {0})")]
    NotReady(String),
    #[error("Session was cancelled")]
    Cancelled,
    #[error("Invalid transition: {event} while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),
    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),
}

fn fault(kind: FaultKind, message: String) -> SessionState {
    SessionState::Error(SessionFault { kind, message })
}

/// Pure transition function of the session state machine.
pub fn transition(state: &SessionState, event: SessionEvent) -> Result<SessionState, SessionError> {
    use SessionEvent as E;
    use SessionState as S;

    let init_fault = matches!(state, S::Error(f) if f.kind == FaultKind::Init);
    let next = match (state, event) {
        (_, E::Shutdown) => S::Idle,
        (S::Idle, E::Initialize) => S::Initializing,
        (S::Error(_), E::Initialize) if init_fault => S::Initializing,
        (S::Initializing, E::EngineReady) => S::Ready,
        (S::Initializing, E::InitFailed(message)) => fault(FaultKind::Init, message),
        (S::Capturing | S::Analyzing, E::CaptureRequested) => return Err(SessionError::Busy),
        (S::Ready, E::CaptureRequested) => S::Capturing,
        (S::Error(_), E::CaptureRequested) if !init_fault => S::Capturing,
        (S::Idle | S::Initializing | S::Error(_), E::CaptureRequested) => {
            return Err(SessionError::NotReady(state.to_string()))
        }
        (S::Capturing, E::FrameCaptured) => S::Analyzing,
        (S::Capturing, E::CaptureFailed(message)) => fault(FaultKind::Acquisition, message),
        (S::Analyzing, E::AnalysisFinished) => S::Ready,
        (S::Analyzing, E::AnalysisFailed(message)) => fault(FaultKind::Engine, message),
        (state, event) => {
            return Err(SessionError::InvalidTransition {
                state: state.name(),
                event: event.name(),
            })
        }
    };
    Ok(next)
}

/// Shared cancellation flag. Clone it into the host; cancel when the host goes away.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How recognized text is turned into the final document.
pub enum CleanupStrategy {
    /// Local reflow pipeline.
    Local,
    /// Remote text generation over the filtered, sorted words; falls back to the raw text.
    Remote(Box<dyn TextGenerator>),
}

impl CleanupStrategy {
    /// Turns one frame's recognized words into the final document.
    pub async fn run(&self, words: &[RecognizedWord], config: &ReflowConfig) -> ReflowOutput {
        match self {
            Self::Local => reflow_words(words, config),
            Self::Remote(generator) => {
                let (filtered, joined) = prepare_words(words, config);
                let text = cleanup_with_fallback(generator.as_ref(), &joined).await;
                ReflowOutput {
                    document: CleanedDocument::from_external(text),
                    words: filtered,
                }
            }
        }
    }
}

impl fmt::Debug for CleanupStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("Local"),
            Self::Remote(_) => f.write_str("Remote"),
        }
    }
}

pub struct CaptureSession<S> {
    state: SessionState,
    source: Option<S>,
    engine: Option<OcrHandle>,
    cleanup: CleanupStrategy,
    reflow: ReflowConfig,
    output: ReflowOutput,
    token: CancelToken,
}

impl<S: FrameSource + 'static> CaptureSession<S> {
    pub fn new(
        source: S,
        reflow: ReflowConfig,
        cleanup: CleanupStrategy,
        token: CancelToken,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            source: Some(source),
            engine: None,
            cleanup,
            reflow,
            output: ReflowOutput::default(),
            token,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The last successfully produced document.
    pub fn document(&self) -> &CleanedDocument {
        &self.output.document
    }

    /// Words the last document was built from.
    pub fn words(&self) -> &[FilteredWord] {
        &self.output.words
    }

    /// Text to display: the document, or the "no content" indicator when it is empty.
    pub fn display_text(&self) -> &str {
        if self.output.document.is_empty() {
            NO_CONTENT_MESSAGE
        } else {
            self.output.document.as_str()
        }
    }

    fn apply(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        let next = transition(&self.state, event)?;
        debug!(from = %self.state, to = %next, "Session transition");
        self.state = next;
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), SessionError> {
        if self.token.is_cancelled() {
            debug!("Session cancelled, dropping result");
            return Err(SessionError::Cancelled);
        }
        Ok(())
    }

    /// Runs `f` against the frame source on the blocking pool and puts the source back.
    async fn with_source<T, F>(&mut self, f: F) -> Result<T, SessionError>
    where
        T: Send + 'static,
        F: FnOnce(&mut S) -> Result<T, CaptureError> + Send + 'static,
    {
        let mut source = self
            .source
            .take()
            .ok_or_else(|| SessionError::NotReady("frame source lost".into()))?;
        let joined = tokio::task::spawn_blocking(move || {
            let result = f(&mut source);
            (source, result)
        })
        .await;
        match joined {
            Ok((source, result)) => {
                self.source = Some(source);
                Ok(result?)
            }
            Err(e) => Err(CaptureError::Command(format!("capture task failed: {e}")).into()),
        }
    }

    /// Checks the frame source and starts the OCR worker. `make_engine` runs on the worker.
    pub async fn initialize<E, F>(&mut self, make_engine: F) -> Result<(), SessionError>
    where
        E: OcrEngine,
        F: FnOnce() -> Result<E, OcrError> + Send + 'static,
    {
        self.apply(SessionEvent::Initialize)?;
        info!("Initializing capture session");

        let prepared = self.with_source(|source| source.prepare()).await;
        self.ensure_live()?;
        if let Err(e) = prepared {
            warn!(error = %e, "Frame source unavailable");
            self.apply(SessionEvent::InitFailed(e.to_string()))?;
            return Err(e);
        }

        let (handle, ready) = spawn_ocr_worker(make_engine);
        let ready = ready
            .await
            .unwrap_or_else(|_| Err(OcrError::NotReady("OCR worker exited during startup".into())));
        if let Err(e) = self.ensure_live() {
            handle.shutdown();
            return Err(e);
        }
        match ready {
            Ok(()) => {
                self.engine = Some(handle);
                self.apply(SessionEvent::EngineReady)?;
                info!("Capture session ready");
                Ok(())
            }
            Err(e) => {
                handle.shutdown();
                self.apply(SessionEvent::InitFailed(e.to_string()))?;
                Err(e.into())
            }
        }
    }

    /// Captures one frame, recognizes it and replaces the displayed document.
    ///
    /// On failure the previous document is kept.
    pub async fn capture_and_read(&mut self) -> Result<&ReflowOutput, SessionError> {
        self.apply(SessionEvent::CaptureRequested)?;
        let Some(engine) = self.engine.clone() else {
            self.apply(SessionEvent::CaptureFailed("OCR engine not started".into()))?;
            return Err(SessionError::NotReady("OCR engine not started".into()));
        };

        let frame = self.with_source(|source| source.next_frame()).await;
        self.ensure_live()?;
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Capture failed");
                self.apply(SessionEvent::CaptureFailed(e.to_string()))?;
                return Err(e);
            }
        };
        debug!(?frame, "Frame captured");
        self.apply(SessionEvent::FrameCaptured)?;

        let words = engine.recognize(frame).await;
        self.ensure_live()?;
        let words = match words {
            Ok(words) => words,
            Err(e) => {
                self.apply(SessionEvent::AnalysisFailed(e.to_string()))?;
                return Err(e.into());
            }
        };

        let output = self.cleanup.run(&words, &self.reflow).await;
        self.ensure_live()?;

        info!(
            words = output.words.len(),
            chars = output.document.as_str().len(),
            "Capture analyzed"
        );
        self.output = output;
        self.apply(SessionEvent::AnalysisFinished)?;
        Ok(&self.output)
    }

    /// Stops the OCR worker and returns to `Idle`.
    pub fn shutdown(&mut self) {
        if let Some(engine) = self.engine.take() {
            engine.shutdown();
        }
        if let Err(e) = self.apply(SessionEvent::Shutdown) {
            warn!(error = %e, "Shutdown transition rejected");
        }
        info!("Capture session shut down");
    }
}

impl<S> Drop for CaptureSession<S> {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            engine.shutdown();
        }
    }
}
