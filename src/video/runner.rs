use crate::core::JobEvent;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

/// Single-slot executor for merge work. Holds at most one worker thread;
/// the UI drains its events every frame with `poll()` and the worker is
/// joined as soon as its terminal event has been seen. There is no queue
/// and no cancellation: a running job finishes or fails.
pub struct JobRunner {
    active: Option<ActiveJob>,
}

struct ActiveJob {
    receiver: mpsc::Receiver<JobEvent>,
    handle: Option<thread::JoinHandle<()>>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self { active: None }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Run `job` on a dedicated worker thread. The job reports progress
    /// through the callback it is handed; its result (or panic) becomes
    /// the single terminal event.
    pub fn spawn<F>(&mut self, job: F) -> anyhow::Result<()>
    where
        F: FnOnce(&dyn Fn(u8)) -> anyhow::Result<PathBuf> + Send + 'static,
    {
        if self.active.is_some() {
            return Err(anyhow::anyhow!("a merge job is already running"));
        }

        let (events, receiver) = mpsc::channel::<JobEvent>();

        let handle = thread::Builder::new()
            .name("merge-worker".to_string())
            .spawn(move || {
                let progress = events.clone();
                let report = move |pct: u8| {
                    let _ = progress.send(JobEvent::Progress(pct));
                };

                let result = std::panic::catch_unwind(AssertUnwindSafe(|| job(&report)));

                let terminal = match result {
                    Ok(Ok(path)) => JobEvent::Finished(path),
                    Ok(Err(e)) => JobEvent::Failed(format!("{:#}", e)),
                    Err(panic) => {
                        let msg = panic
                            .downcast_ref::<&str>()
                            .map(|s| s.to_string())
                            .or_else(|| panic.downcast_ref::<String>().cloned())
                            .unwrap_or_else(|| "merge worker panicked".to_string());
                        log::error!("Merge job panicked: {}", msg);
                        JobEvent::Failed(msg)
                    }
                };

                let _ = events.send(terminal);
            })?;

        self.active = Some(ActiveJob {
            receiver,
            handle: Some(handle),
        });
        Ok(())
    }

    /// Non-blocking drain of pending events. After handing out a terminal
    /// event the worker thread is joined and the slot freed.
    pub fn poll(&mut self) -> Vec<JobEvent> {
        let mut events = Vec::new();
        let mut finished = false;

        if let Some(job) = self.active.as_mut() {
            while let Ok(event) = job.receiver.try_recv() {
                let terminal = event.is_terminal();
                events.push(event);
                if terminal {
                    finished = true;
                    break;
                }
            }
        }

        if finished {
            if let Some(mut job) = self.active.take() {
                if let Some(handle) = job.handle.take() {
                    if handle.join().is_err() {
                        log::warn!("Merge worker thread did not join cleanly");
                    }
                }
            }
        }

        events
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn drain_until_terminal(runner: &mut JobRunner) -> Vec<JobEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();

        while Instant::now() < deadline {
            events.extend(runner.poll());
            if events.iter().any(|e| e.is_terminal()) {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }

        events
    }

    #[test]
    fn test_successful_job_reports_progress_then_finishes() {
        let mut runner = JobRunner::new();
        runner
            .spawn(|report| {
                report(5);
                report(100);
                Ok(PathBuf::from("/out/merged.mp4"))
            })
            .unwrap();
        assert!(runner.is_active());

        let events = drain_until_terminal(&mut runner);

        assert!(events.iter().any(|e| matches!(e, JobEvent::Progress(5))));
        assert!(events.iter().any(|e| matches!(e, JobEvent::Progress(100))));
        assert!(matches!(
            events.last(),
            Some(JobEvent::Finished(p)) if p == &PathBuf::from("/out/merged.mp4")
        ));
        assert!(!runner.is_active());
    }

    #[test]
    fn test_failed_job_surfaces_message() {
        let mut runner = JobRunner::new();
        runner
            .spawn(|_report| Err(anyhow::anyhow!("corrupt input")))
            .unwrap();

        let events = drain_until_terminal(&mut runner);

        match events.last() {
            Some(JobEvent::Failed(msg)) => assert!(msg.contains("corrupt input")),
            other => panic!("expected failure event, got {:?}", other),
        }
        assert!(!runner.is_active());
    }

    #[test]
    fn test_panicking_job_becomes_failure_event() {
        let mut runner = JobRunner::new();
        runner.spawn(|_report| panic!("kaboom")).unwrap();

        let events = drain_until_terminal(&mut runner);

        match events.last() {
            Some(JobEvent::Failed(msg)) => assert!(msg.contains("kaboom")),
            other => panic!("expected failure event, got {:?}", other),
        }
        assert!(!runner.is_active());
    }

    #[test]
    fn test_second_job_rejected_while_active() {
        let mut runner = JobRunner::new();
        runner
            .spawn(|_report| {
                thread::sleep(Duration::from_millis(100));
                Ok(PathBuf::from("/out/first.mp4"))
            })
            .unwrap();

        let rejected = runner.spawn(|_report| Ok(PathBuf::from("/out/second.mp4")));
        assert!(rejected.is_err());

        let events = drain_until_terminal(&mut runner);
        assert!(matches!(
            events.last(),
            Some(JobEvent::Finished(p)) if p == &PathBuf::from("/out/first.mp4")
        ));
    }
}
