// THEORY:
// The `parallel_pipeline` module runs anchor selection over many scenes at once.
// Selection of one scene is a pure, synchronous computation, so the only thing
// worth parallelising is independent scenes. A dispatcher hands scenes round-robin
// to a fixed set of workers; every worker owns nothing but a handle to the shared,
// read-only selector, and every scene brings its own grid, so no mutable state
// crosses scenes.
//
// The CPU-bound selection itself runs on tokio's blocking pool, which keeps the
// async workers free to accept and route further scenes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use log::{debug, error};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::SelectionConfig;
use crate::core_modules::pixel_grid::PixelGrid;
use crate::error::{SelectionError, SelectionResult};
use crate::pipeline::{AnchorPixels, PixelSelector};

/// One scene to process, tagged with a caller-chosen identifier.
#[derive(Debug, Clone)]
pub struct SceneJob {
    pub scene_id: u64,
    pub grid: PixelGrid,
}

/// Anchors of one scene, owned so they can outlive the grid they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneOutcome {
    pub scene_id: u64,
    pub anchors: AnchorPixels,
    pub elapsed: Duration,
}

struct SceneTask {
    job: SceneJob,
    result_sender: oneshot::Sender<SceneOutcome>,
}

pub struct BatchSelector {
    task_sender: mpsc::UnboundedSender<SceneTask>,
    workers: Vec<JoinHandle<()>>,
}

impl BatchSelector {
    /// One worker per logical CPU. Must be called from within a tokio runtime.
    pub fn new(config: SelectionConfig) -> SelectionResult<Self> {
        Self::with_workers(config, num_cpus::get())
    }

    pub fn with_workers(config: SelectionConfig, worker_count: usize) -> SelectionResult<Self> {
        let selector = Arc::new(PixelSelector::new(config)?);
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<SceneTask>();
        let mut workers = Vec::with_capacity(worker_count + 1);

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<SceneTask>())
            .unzip();

        // Dispatcher: round-robin over the workers until the batch side hangs up.
        workers.push(tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if worker_senders[worker_idx].send(task).is_err() {
                    error!("selection worker {} is gone, dropping scene", worker_idx);
                }
                worker_idx = (worker_idx + 1) % worker_senders.len();
            }
        }));

        for (worker_idx, mut worker_receiver) in worker_receivers.into_iter().enumerate() {
            let selector = Arc::clone(&selector);
            workers.push(tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let scene_id = task.job.scene_id;
                    let selector = Arc::clone(&selector);
                    let outcome =
                        tokio::task::spawn_blocking(move || Self::process_scene(&selector, task.job))
                            .await;
                    match outcome {
                        Ok(outcome) => {
                            // The submitter may have stopped waiting; that is not our problem.
                            let _ = task.result_sender.send(outcome);
                        }
                        Err(e) => error!(
                            "worker {} failed on scene {}: {}",
                            worker_idx, scene_id, e
                        ),
                    }
                }
            }));
        }

        debug!("batch selector started with {} workers", worker_count);
        Ok(Self {
            task_sender,
            workers,
        })
    }

    fn process_scene(selector: &PixelSelector, job: SceneJob) -> SceneOutcome {
        let started = Instant::now();
        let anchors = selector.select_anchors(&job.grid).to_anchors();
        SceneOutcome {
            scene_id: job.scene_id,
            anchors,
            elapsed: started.elapsed(),
        }
    }

    /// Queues one scene and waits for its anchors.
    pub async fn select(&self, job: SceneJob) -> SelectionResult<SceneOutcome> {
        let receiver = self.submit(job)?;
        receiver.await.map_err(|_| SelectionError::WorkerPool {
            reason: "worker dropped the scene before answering".into(),
        })
    }

    /// Queues every scene up front, then collects the outcomes in submission order.
    /// Scenes whose worker failed are logged and left out.
    pub async fn select_all(&self, jobs: Vec<SceneJob>) -> SelectionResult<Vec<SceneOutcome>> {
        let mut receivers = Vec::with_capacity(jobs.len());
        for job in jobs {
            let scene_id = job.scene_id;
            receivers.push((scene_id, self.submit(job)?));
        }

        let results = join_all(
            receivers
                .into_iter()
                .map(|(scene_id, receiver)| async move { (scene_id, receiver.await) }),
        )
        .await;

        Ok(results
            .into_iter()
            .filter_map(|(scene_id, result)| match result {
                Ok(outcome) => Some(outcome),
                Err(_) => {
                    error!("scene {} produced no outcome", scene_id);
                    None
                }
            })
            .collect())
    }

    fn submit(&self, job: SceneJob) -> SelectionResult<oneshot::Receiver<SceneOutcome>> {
        let (result_sender, result_receiver) = oneshot::channel();
        self.task_sender
            .send(SceneTask { job, result_sender })
            .map_err(|_| SelectionError::WorkerPool {
                reason: "dispatcher has stopped".into(),
            })?;
        Ok(result_receiver)
    }

    /// Stops accepting scenes and waits for the in-flight ones to finish.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!("selection worker ended abnormally: {}", e);
            }
        }
    }
}
