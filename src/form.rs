use crate::catalog::Catalog;
use anyhow::{Result, bail};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TICKERS: &str = "AAPL,GOOG,MSFT,NVDA,TSLA";
pub const DEFAULT_INITIAL_CASH: u64 = 100_000;
pub const MIN_INITIAL_CASH: u64 = 1_000;
pub const CASH_STEP: u64 = 1_000;
pub const MAX_MARGIN_REQUIREMENT: u8 = 100;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Everything the input form collects, as typed by the user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunForm {
    pub tickers: String,
    pub initial_cash: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub selected_analysts: Vec<String>,
    pub model_choice: String,
    pub margin_requirement: u8,
    pub show_reasoning: bool,
    /// Collected for parity with the screen; never sent to the backend.
    #[serde(default)]
    pub show_agent_graph: bool,
}

impl RunForm {
    pub fn with_defaults(catalog: &Catalog) -> Self {
        Self {
            tickers: DEFAULT_TICKERS.to_string(),
            initial_cash: DEFAULT_INITIAL_CASH,
            start_date: default_start_date(),
            end_date: Local::now().date_naive(),
            selected_analysts: catalog.default_analysts(),
            model_choice: catalog.default_model_choice(),
            margin_requirement: 0,
            show_reasoning: true,
            show_agent_graph: false,
        }
    }

    /// Applies the numeric bounds the input widgets enforce. Nothing else is
    /// checked: an empty ticker list, zero analysts or end < start all pass.
    pub fn clamped(mut self) -> Self {
        self.initial_cash = self.initial_cash.max(MIN_INITIAL_CASH);
        self.margin_requirement = self.margin_requirement.min(MAX_MARGIN_REQUIREMENT);
        self
    }

    pub fn ticker_list(&self) -> Vec<String> {
        parse_tickers(&self.tickers)
    }
}

pub fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// `"AAPL, , GOOG,"` -> `["AAPL", "GOOG"]`. Case is left alone.
pub fn parse_tickers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    match NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        Ok(d) => Ok(d),
        Err(_) => bail!("Invalid date '{}', use YYYY-MM-DD", trimmed),
    }
}

/// Parses `text`, falling back to `current` when it is not a valid date.
/// The flag is true when the fallback was used.
pub fn coerce_date(text: &str, current: NaiveDate) -> (NaiveDate, bool) {
    match parse_date(text) {
        Ok(d) => (d, false),
        Err(_) => (current, true),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelChoice {
    pub name: String,
    pub provider: String,
}

impl ModelChoice {
    /// Splits `"<name> (<provider>)"`. The composite must contain exactly one
    /// `" ("`; every `)` is stripped from the provider.
    pub fn parse(composite: &str) -> Result<Self> {
        let parts: Vec<&str> = composite.split(" (").collect();
        if parts.len() != 2 {
            bail!(
                "Invalid model selection '{}': expected '<model> (<provider>)'",
                composite
            );
        }
        Ok(Self {
            name: parts[0].to_string(),
            provider: parts[1].replace(')', ""),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tickers_trims_and_drops_empties() {
        assert_eq!(parse_tickers("AAPL, , GOOG,"), vec!["AAPL", "GOOG"]);
        assert_eq!(parse_tickers(" msft "), vec!["msft"]);
        assert!(parse_tickers("").is_empty());
        assert!(parse_tickers(" , ,").is_empty());
    }

    #[test]
    fn test_model_choice_parse() {
        let choice = ModelChoice::parse("gpt-4 (openai)").unwrap();
        assert_eq!(choice.name, "gpt-4");
        assert_eq!(choice.provider, "openai");

        let nested = ModelChoice::parse("llama-3.3-70b-versatile (Groq))").unwrap();
        assert_eq!(nested.provider, "Groq");
    }

    #[test]
    fn test_model_choice_rejects_malformed() {
        assert!(ModelChoice::parse("gpt-4").is_err());
        assert!(ModelChoice::parse("a (b) (c)").is_err());
        assert!(ModelChoice::parse("").is_err());
    }

    #[test]
    fn test_defaults_follow_catalog() {
        let catalog = Catalog::default();
        let form = RunForm::with_defaults(&catalog);
        assert_eq!(form.tickers, DEFAULT_TICKERS);
        assert_eq!(form.initial_cash, DEFAULT_INITIAL_CASH);
        assert_eq!(format_date(form.start_date), "2024-01-01");
        assert_eq!(form.selected_analysts, catalog.default_analysts());
        assert_eq!(form.model_choice, catalog.default_model_choice());
        assert_eq!(form.margin_requirement, 0);
        assert!(form.show_reasoning);
        assert!(!form.show_agent_graph);
    }

    #[test]
    fn test_clamped_applies_widget_bounds_only() {
        let catalog = Catalog::default();
        let mut form = RunForm::with_defaults(&catalog);
        form.initial_cash = 10;
        form.margin_requirement = 250;
        form.tickers = String::new();
        form.selected_analysts.clear();
        form.end_date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();

        let form = form.clamped();
        assert_eq!(form.initial_cash, MIN_INITIAL_CASH);
        assert_eq!(form.margin_requirement, MAX_MARGIN_REQUIREMENT);
        assert!(form.ticker_list().is_empty());
        assert!(form.selected_analysts.is_empty());
        assert!(form.end_date < form.start_date);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(" 2024-03-15 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert!(parse_date("03/15/2024").is_err());
    }

    #[test]
    fn test_coerce_date_keeps_last_valid_date() {
        let current = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            coerce_date("2024-07-04", current),
            (NaiveDate::from_ymd_opt(2024, 7, 4).unwrap(), false)
        );
        assert_eq!(coerce_date("2024-07-", current), (current, true));
        assert_eq!(coerce_date("", current), (current, true));
        assert_eq!(coerce_date("2024-02-30", current), (current, true));
    }

    #[test]
    fn test_form_json_defaults_agent_graph_off() {
        let raw = r#"{
            "tickers": "AAPL",
            "initial_cash": 5000,
            "start_date": "2024-01-01",
            "end_date": "2024-02-01",
            "selected_analysts": [],
            "model_choice": "gpt-4o (OpenAI)",
            "margin_requirement": 10,
            "show_reasoning": false
        }"#;
        let form: RunForm = serde_json::from_str(raw).unwrap();
        assert!(!form.show_agent_graph);
        assert_eq!(form.end_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }
}
