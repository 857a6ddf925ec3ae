//! OCR worker thread.
//!
//! The engine is created on, and never leaves, a dedicated thread. Callers talk to it through
//! an `OcrHandle` (a channel sender); replies come back on a oneshot so async code can await
//! them. If the engine fails to initialize, the worker keeps running and answers every
//! request with `OcrError::NotReady`.

use std::sync::mpsc;

use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::{OcrEngine, OcrError, RecognizedWord};
use crate::system::Frame;

type Reply<T> = oneshot::Sender<Result<T, OcrError>>;

/// Request to the OCR worker thread.
pub enum OcrRequest {
    Recognize(Frame, Reply<Vec<RecognizedWord>>),
    Shutdown,
}

/// Sender side of the OCR worker. Cheap to clone.
#[derive(Clone)]
pub struct OcrHandle {
    tx: mpsc::Sender<OcrRequest>,
}

impl OcrHandle {
    /// Sends a frame to the engine and waits for the words.
    pub async fn recognize(&self, frame: Frame) -> Result<Vec<RecognizedWord>, OcrError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(OcrRequest::Recognize(frame, resp_tx))
            .map_err(|_| OcrError::NotReady("OCR worker has shut down".into()))?;
        resp_rx
            .await
            .map_err(|_| OcrError::NotReady("OCR worker disconnected".into()))?
    }

    /// Asks the worker to drop its engine and exit.
    pub fn shutdown(&self) {
        if self.tx.send(OcrRequest::Shutdown).is_err() {
            debug!("OCR worker already stopped");
        }
    }
}

/// Spawns the worker. `make_engine` runs on the worker thread; the returned receiver
/// resolves once the engine is ready (or failed to start).
pub fn spawn_ocr_worker<E, F>(make_engine: F) -> (OcrHandle, oneshot::Receiver<Result<(), OcrError>>)
where
    E: OcrEngine,
    F: FnOnce() -> Result<E, OcrError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let (ready_tx, ready_rx) = oneshot::channel();

    std::thread::spawn(move || {
        info!("Initializing OCR worker");
        let mut engine = match make_engine() {
            Ok(engine) => {
                info!("OCR worker initialized successfully");
                let _ = ready_tx.send(Ok(()));
                engine
            }
            Err(e) => {
                warn!(error = %e, "OCR not available: engine init failed");
                let reason = e.to_string();
                let _ = ready_tx.send(Err(e));
                while let Ok(req) = rx.recv() {
                    match req {
                        OcrRequest::Recognize(_, resp) => {
                            let _ = resp.send(Err(OcrError::NotReady(reason.clone())));
                        }
                        OcrRequest::Shutdown => break,
                    }
                }
                return;
            }
        };

        while let Ok(req) = rx.recv() {
            match req {
                OcrRequest::Recognize(frame, resp) => {
                    let result = engine.recognize(&frame);
                    if let Err(ref e) = result {
                        error!(error = %e, "OCR recognize failed");
                    }
                    let _ = resp.send(result);
                }
                OcrRequest::Shutdown => break,
            }
        }
        info!("OCR worker stopped");
    });

    (OcrHandle { tx }, ready_rx)
}
