mod app;
mod backend;
mod catalog;
mod config;
mod form;
mod gui;
mod portfolio;
mod result_view;
mod runner;
mod webui;

use anyhow::{Result, anyhow};
use app::App;
use catalog::Catalog;
use clap::Parser;
use form::RunForm;
use runner::RunOutcome;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "AI Hedge Fund desk: configure a simulation run and show what the backend returns",
    after_help = "EXAMPLES:
    # One-shot run with the default form, result printed as JSON
    cargo run --release

    # Pick tickers, analysts and model
    cargo run --release -- --tickers AAPL,NVDA --analysts \"Warren Buffett,Ben Graham\" --model gpt-4o

    # Talk to a backend over HTTP
    cargo run --release -- --backend-url http://localhost:8000/run_hedge_fund

    # Launch GUI
    cargo run --release -- --gui

    # Launch WebUI
    cargo run --release -- --webui --webui-port 8501"
)]
struct Args {
    /// Launch in GUI mode
    #[arg(long)]
    gui: bool,

    /// Launch in WebUI mode
    #[arg(long)]
    webui: bool,

    /// WebUI server port (default: 8501, or HEDGEFUND_WEBUI_PORT)
    #[arg(long)]
    webui_port: Option<u16>,

    /// URL the run request is POSTed to (overrides HEDGEFUND_BACKEND_URL)
    #[arg(long)]
    backend_url: Option<String>,

    /// Command that reads the run request on stdin and prints the result (overrides HEDGEFUND_BACKEND_CMD)
    #[arg(long)]
    backend_cmd: Option<String>,

    /// JSON file with analyst and model tables (overrides HEDGEFUND_CATALOG)
    #[arg(long)]
    catalog: Option<String>,

    /// Print the available analysts and models, then exit
    #[arg(long)]
    list_options: bool,

    /// Comma-separated tickers (default: AAPL,GOOG,MSFT,NVDA,TSLA)
    #[arg(long)]
    tickers: Option<String>,

    /// Initial cash in dollars (default: 100000)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1_000..))]
    initial_cash: Option<u64>,

    /// Start date, YYYY-MM-DD (default: 2024-01-01)
    #[arg(long)]
    start_date: Option<String>,

    /// End date, YYYY-MM-DD (default: today)
    #[arg(long)]
    end_date: Option<String>,

    /// Comma-separated analyst names or ids (default: first two). Pass "" for none.
    #[arg(long)]
    analysts: Option<String>,

    /// Model as "name (provider)", display name, or bare model name (default: first model)
    #[arg(long)]
    model: Option<String>,

    /// Margin requirement in percent (default: 0)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    margin_requirement: Option<u8>,

    /// Ask the backend to print agent reasoning (default: true)
    #[arg(long)]
    show_reasoning: Option<bool>,

    /// Collected for parity with the GUI; has no effect on the run
    #[arg(long)]
    show_agent_graph: bool,
}

impl Args {
    fn config_sources(&self) -> config::ConfigSources {
        config::ConfigSources {
            backend_url: self.backend_url.clone(),
            backend_cmd: self.backend_cmd.clone(),
            catalog_path: self.catalog.clone(),
            webui_port: self.webui_port.map(|p| p.to_string()),
        }
    }

    fn build_form(&self, catalog: &Catalog) -> Result<RunForm> {
        let mut form = RunForm::with_defaults(catalog);
        if let Some(tickers) = &self.tickers {
            form.tickers = tickers.clone();
        }
        if let Some(cash) = self.initial_cash {
            form.initial_cash = cash;
        }
        if let Some(raw) = &self.start_date {
            form.start_date = form::parse_date(raw)?;
        }
        if let Some(raw) = &self.end_date {
            form.end_date = form::parse_date(raw)?;
        }
        if let Some(raw) = &self.analysts {
            let names: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            form.selected_analysts = catalog.resolve_analysts(&names)?;
        }
        if let Some(raw) = &self.model {
            form.model_choice = catalog.resolve_model_choice(raw)?;
        }
        if let Some(margin) = self.margin_requirement {
            form.margin_requirement = margin;
        }
        if let Some(show) = self.show_reasoning {
            form.show_reasoning = show;
        }
        form.show_agent_graph = self.show_agent_graph;
        Ok(form.clamped())
    }
}

fn print_options(catalog: &Catalog) {
    println!("Analysts:");
    for a in &catalog.analysts {
        println!("  {:<24} {}", a.display, a.value);
    }
    println!();
    println!("Models:");
    for m in &catalog.llms {
        println!("  {:<36} {}", m.choice_label(), m.display);
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("hedgefund_desk=info,wgpu_core=error,wgpu_hal=error")
    });
    // stdout carries the one-shot result.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    config::load_dotenv();
    let args = Args::parse();

    let cfg = config::resolve(config::ConfigSources::from_env().overlay(args.config_sources()))?;
    let catalog = Catalog::load(cfg.catalog_path.as_deref())?;

    if args.list_options {
        print_options(&catalog);
        return Ok(ExitCode::SUCCESS);
    }

    let backend = backend::build_backend(&cfg.backend);

    if args.gui {
        let options = eframe::NativeOptions::default();
        info!("Launching GUI");
        eframe::run_native(
            "AI Hedge Fund",
            options,
            Box::new(move |_cc| Ok(Box::new(gui::GuiApp::new(App::new(catalog, backend))))),
        )
        .map_err(|e| anyhow!("GUI failed: {}", e))?;
        return Ok(ExitCode::SUCCESS);
    }

    if args.webui {
        match webui::run_webui_server(cfg.webui_port, catalog, backend).await {
            Ok(_) => info!("WebUI exited."),
            Err(e) => {
                error!("WebUI failed: {:#}", e);
                return Ok(ExitCode::FAILURE);
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let form = args.build_form(&catalog)?;
    info!("{}", runner::BUSY_MESSAGE);
    match runner::run(backend.as_ref(), &form).await {
        RunOutcome::Success { result } => {
            info!("{}", runner::SUCCESS_MESSAGE);
            let rows = result_view::decision_rows(&result);
            if !rows.is_empty() {
                eprintln!("{}", result_view::render_decisions_table(&rows));
            }
            println!("{}", result_view::pretty_json(&result));
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Failed { message } => {
            eprintln!("{}", message);
            Ok(ExitCode::FAILURE)
        }
    }
}
