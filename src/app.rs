use crate::backend::HedgeFundBackend;
use crate::catalog::Catalog;
use crate::form::RunForm;
use crate::runner::{self, RunOutcome};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Screen state behind the form: the inputs, the one in-flight run and the
/// last outcome.
pub struct App {
    pub catalog: Catalog,
    pub form: RunForm,
    pub state: AppState,
    pub result: Option<Value>,
    pub error_msg: Option<String>,
    backend: Arc<dyn HedgeFundBackend>,
    run_rx: Option<mpsc::Receiver<RunOutcome>>,
}

impl App {
    pub fn new(catalog: Catalog, backend: Arc<dyn HedgeFundBackend>) -> Self {
        let form = RunForm::with_defaults(&catalog);
        Self {
            catalog,
            form,
            state: AppState::Idle,
            result: None,
            error_msg: None,
            backend,
            run_rx: None,
        }
    }

    pub fn backend_label(&self) -> String {
        self.backend.describe()
    }

    pub fn is_running(&self) -> bool {
        self.state == AppState::Running
    }

    /// Kicks off a run on the tokio runtime. Returns false when one is already
    /// in flight. Must be called from within a runtime context.
    pub fn start_run(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = AppState::Running;
        self.result = None;
        self.error_msg = None;

        let (tx, rx) = mpsc::channel(1);
        self.run_rx = Some(rx);
        let backend = self.backend.clone();
        let form = self.form.clone();

        tokio::spawn(async move {
            let task = tokio::spawn(async move { runner::run(backend.as_ref(), &form).await });
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Simulation task aborted: {}", e);
                    RunOutcome::failed(e)
                }
            };
            let _ = tx.send(outcome).await;
        });
        true
    }

    /// Polls the in-flight run; called once per frame.
    pub fn tick(&mut self) {
        let Some(rx) = &mut self.run_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(outcome) => {
                self.run_rx = None;
                self.apply_outcome(outcome);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.run_rx = None;
                self.apply_outcome(RunOutcome::failed("simulation task ended without a result"));
            }
        }
    }

    pub fn apply_outcome(&mut self, outcome: RunOutcome) {
        match outcome {
            RunOutcome::Success { result } => {
                self.state = AppState::Succeeded;
                self.result = Some(result);
                self.error_msg = None;
            }
            RunOutcome::Failed { message } => {
                self.state = AppState::Failed;
                self.result = None;
                self.error_msg = Some(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RunRequest;
    use crate::runner::tests::MockBackend;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::time::Duration;

    struct PanickingBackend;

    #[async_trait]
    impl HedgeFundBackend for PanickingBackend {
        async fn run_hedge_fund(&self, _request: RunRequest) -> Result<Value> {
            panic!("backend blew up");
        }

        fn describe(&self) -> String {
            "panicking".into()
        }
    }

    async fn wait_for_outcome(app: &mut App) {
        for _ in 0..200 {
            app.tick();
            if !app.is_running() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run did not finish");
    }

    #[tokio::test]
    async fn test_successful_run_stores_result() {
        let backend = Arc::new(MockBackend::ok(serde_json::json!({"decisions": {}})));
        let mut app = App::new(Catalog::default(), backend.clone());

        assert!(app.start_run());
        assert!(app.is_running());
        assert!(!app.start_run(), "second click while running is ignored");

        wait_for_outcome(&mut app).await;
        assert_eq!(app.state, AppState::Succeeded);
        assert_eq!(app.result, Some(serde_json::json!({"decisions": {}})));
        assert!(app.error_msg.is_none());
        assert_eq!(backend.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_run_shows_message_and_clears_result() {
        let mut app = App::new(Catalog::default(), Arc::new(MockBackend::failing("no API key")));
        app.result = Some(Value::Bool(true));

        app.start_run();
        wait_for_outcome(&mut app).await;
        assert_eq!(app.state, AppState::Failed);
        assert!(app.result.is_none());
        assert!(app.error_msg.as_deref().unwrap().contains("no API key"));
    }

    #[tokio::test]
    async fn test_panicking_backend_is_contained() {
        let mut app = App::new(Catalog::default(), Arc::new(PanickingBackend));
        app.start_run();
        wait_for_outcome(&mut app).await;
        assert_eq!(app.state, AppState::Failed);
        assert!(app.error_msg.is_some());
    }
}
