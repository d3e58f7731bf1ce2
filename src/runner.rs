use crate::backend::{HedgeFundBackend, RunRequest};
use crate::form::{ModelChoice, RunForm, format_date};
use crate::portfolio::PortfolioSnapshot;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{error, info};

pub const SUCCESS_MESSAGE: &str = "Simulation complete!";
pub const BUSY_MESSAGE: &str = "Simulating trading decisions with your AI team...";
pub const ERROR_PREFIX: &str = "Error running AI Hedge Fund";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunOutcome {
    Success { result: Value },
    Failed { message: String },
}

impl RunOutcome {
    pub fn failed(err: impl std::fmt::Display) -> Self {
        Self::Failed {
            message: format!("{}: {}", ERROR_PREFIX, err),
        }
    }
}

fn build_request(
    form: &RunForm,
    tickers: Vec<String>,
    portfolio: PortfolioSnapshot,
) -> Result<RunRequest> {
    let model = ModelChoice::parse(&form.model_choice)?;
    Ok(RunRequest {
        tickers,
        start_date: format_date(form.start_date),
        end_date: format_date(form.end_date),
        portfolio,
        show_reasoning: form.show_reasoning,
        selected_analysts: form.selected_analysts.clone(),
        model_name: model.name,
        model_provider: model.provider,
    })
}

/// One click of the run button. Never returns an error: anything that goes
/// wrong after the portfolio is built becomes `RunOutcome::Failed`.
pub async fn run(backend: &dyn HedgeFundBackend, form: &RunForm) -> RunOutcome {
    let form = form.clone().clamped();
    let tickers = form.ticker_list();
    let portfolio =
        PortfolioSnapshot::new(form.initial_cash as f64, form.margin_requirement, &tickers);

    let started = Instant::now();
    let result = match build_request(&form, tickers, portfolio) {
        Ok(request) => {
            info!(
                "Running simulation via {}: tickers={:?} {}..{} model={} ({}) analysts={}",
                backend.describe(),
                request.tickers,
                request.start_date,
                request.end_date,
                request.model_name,
                request.model_provider,
                request.selected_analysts.len()
            );
            backend.run_hedge_fund(request).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(value) => {
            info!("Simulation finished in {:.1}s", started.elapsed().as_secs_f64());
            RunOutcome::Success { result: value }
        }
        Err(e) => {
            error!("Simulation failed: {:#}", e);
            RunOutcome::failed(format!("{:#}", e))
        }
    }
}
