//! Background thread running refinements off the interaction thread.
//!
//! The session encodes the mask, hands the image and label map to the worker
//! and polls for the refined labels. Jobs run one at a time in submit order.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use image::RgbImage;

use super::{CancelToken, LabelMap, SegmentationRefiner};
use crate::error::{Result, SegmenterError};

/// A refinement request sent to the background thread.
struct RefineJob {
    id: u64,
    image: Arc<RgbImage>,
    labels: LabelMap,
    iterations: usize,
    cancel: CancelToken,
}

/// Result of one refinement job.
#[derive(Debug)]
pub struct RefineOutcome {
    /// ID returned by [`RefineWorker::submit`]
    pub id: u64,
    /// Refined labels, or why the job failed
    pub result: Result<LabelMap>,
}

/// Message sent to the worker thread.
enum ThreadMessage {
    /// Refine a label map
    Refine(RefineJob),
    /// Shutdown the thread
    Shutdown,
}

/// Owns the refinement thread and its channels.
pub struct RefineWorker {
    /// Sender for jobs to the background thread
    request_tx: Sender<ThreadMessage>,
    /// Receiver for outcomes from the background thread
    result_rx: Receiver<RefineOutcome>,
    /// Handle to the background thread (for joining on drop)
    thread_handle: Option<JoinHandle<()>>,
    next_id: u64,
}

impl RefineWorker {
    /// Spawn the worker thread.
    pub fn spawn() -> Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<RefineOutcome>();

        let thread_handle = thread::Builder::new()
            .name("grabcut-refiner".to_string())
            .spawn(move || {
                log::info!("Refinement worker started");
                Self::thread_loop(request_rx, result_tx);
                log::info!("Refinement worker exiting");
            })
            .map_err(|e| {
                SegmenterError::WorkerUnavailable(format!("failed to spawn worker thread: {}", e))
            })?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            next_id: 0,
        })
    }

    fn thread_loop(request_rx: Receiver<ThreadMessage>, result_tx: Sender<RefineOutcome>) {
        loop {
            match request_rx.recv() {
                Ok(ThreadMessage::Refine(job)) => {
                    let refiner = SegmentationRefiner::with_iterations(job.iterations);
                    let result = refiner.refine_labels(&job.image, job.labels, &job.cancel);
                    if result_tx.send(RefineOutcome { id: job.id, result }).is_err() {
                        log::warn!("Result channel closed, refinement worker exiting");
                        break;
                    }
                }
                Ok(ThreadMessage::Shutdown) => {
                    log::debug!("Received shutdown signal");
                    break;
                }
                Err(_) => {
                    log::debug!("Request channel closed, refinement worker exiting");
                    break;
                }
            }
        }
    }

    /// Queue a refinement. Returns the job ID.
    pub fn submit(
        &mut self,
        image: Arc<RgbImage>,
        labels: LabelMap,
        iterations: usize,
        cancel: CancelToken,
    ) -> Result<u64> {
        let id = self.next_id;
        self.next_id += 1;

        let job = RefineJob {
            id,
            image,
            labels,
            iterations,
            cancel,
        };
        self.request_tx
            .send(ThreadMessage::Refine(job))
            .map_err(|_| SegmenterError::WorkerUnavailable("request channel closed".to_string()))?;
        log::debug!("Sent refinement job {}", id);
        Ok(id)
    }

    /// Take one finished outcome without blocking.
    pub fn try_recv(&self) -> Result<Option<RefineOutcome>> {
        match self.result_rx.try_recv() {
            Ok(outcome) => Ok(Some(outcome)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SegmenterError::WorkerUnavailable(
                "refinement worker disconnected".to_string(),
            )),
        }
    }

    /// Block until the next outcome arrives.
    pub fn wait(&self) -> Result<RefineOutcome> {
        self.result_rx.recv().map_err(|RecvError| {
            SegmenterError::WorkerUnavailable("refinement worker disconnected".to_string())
        })
    }
}

impl Drop for RefineWorker {
    fn drop(&mut self) {
        log::debug!("Shutting down refinement worker");
        let _ = self.request_tx.send(ThreadMessage::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Refinement worker panicked: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::SegLabel;
    use image::Rgb;

    fn image_and_seed() -> (Arc<RgbImage>, LabelMap) {
        let image = RgbImage::from_fn(8, 8, |_, y| if y < 4 { Rgb([250, 10, 10]) } else { Rgb([10, 10, 250]) });
        let mut labels = LabelMap::filled(8, 8, SegLabel::ProbableBackground).unwrap();
        for x in 0..8 {
            labels.set(x, 0, SegLabel::Foreground);
            labels.set(x, 7, SegLabel::Background);
        }
        (Arc::new(image), labels)
    }

    #[test]
    fn test_submit_and_wait() {
        let mut worker = RefineWorker::spawn().unwrap();
        let (image, labels) = image_and_seed();

        let id = worker.submit(image, labels, 2, CancelToken::new()).unwrap();
        let outcome = worker.wait().unwrap();
        assert_eq!(outcome.id, id);

        let refined = outcome.result.unwrap();
        assert_eq!(refined.get(3, 2), SegLabel::ProbableForeground);
        assert_eq!(refined.get(3, 5), SegLabel::ProbableBackground);
    }

    #[test]
    fn test_cancelled_job_reports_cancel() {
        let mut worker = RefineWorker::spawn().unwrap();
        let (image, labels) = image_and_seed();
        let token = CancelToken::new();
        token.cancel();

        worker.submit(image, labels, 2, token).unwrap();
        let outcome = worker.wait().unwrap();
        assert!(matches!(outcome.result, Err(SegmenterError::Cancelled)));
    }

    #[test]
    fn test_try_recv_empty() {
        let worker = RefineWorker::spawn().unwrap();
        assert!(worker.try_recv().unwrap().is_none());
    }
}
