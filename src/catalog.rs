//! Ordering tables that populate the analyst and model selectors.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalystEntry {
    pub display: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmEntry {
    pub display: String,
    pub name: String,
    pub provider: String,
}

impl LlmEntry {
    /// The string shown in the model selector, e.g. `gpt-4o (OpenAI)`.
    pub fn choice_label(&self) -> String {
        format!("{} ({})", self.name, self.provider)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub analysts: Vec<AnalystEntry>,
    pub llms: Vec<LlmEntry>,
}

const ANALYST_ORDER: &[(&str, &str)] = &[
    ("Aswath Damodaran", "aswath_damodaran"),
    ("Ben Graham", "ben_graham"),
    ("Bill Ackman", "bill_ackman"),
    ("Cathie Wood", "cathie_wood"),
    ("Charlie Munger", "charlie_munger"),
    ("Michael Burry", "michael_burry"),
    ("Peter Lynch", "peter_lynch"),
    ("Phil Fisher", "phil_fisher"),
    ("Stanley Druckenmiller", "stanley_druckenmiller"),
    ("Warren Buffett", "warren_buffett"),
    ("Technical Analyst", "technical_analyst"),
    ("Fundamentals Analyst", "fundamentals_analyst"),
    ("Sentiment Analyst", "sentiment_analyst"),
    ("Valuation Analyst", "valuation_analyst"),
];

const LLM_ORDER: &[(&str, &str, &str)] = &[
    ("[openai] gpt-4o", "gpt-4o", "OpenAI"),
    ("[openai] gpt-4.5", "gpt-4.5-preview", "OpenAI"),
    ("[openai] o3-mini", "o3-mini", "OpenAI"),
    ("[anthropic] claude-3.5-haiku", "claude-3-5-haiku-latest", "Anthropic"),
    ("[anthropic] claude-3.7-sonnet", "claude-3-7-sonnet-latest", "Anthropic"),
    ("[deepseek] deepseek-r1", "deepseek-reasoner", "DeepSeek"),
    ("[deepseek] deepseek-v3", "deepseek-chat", "DeepSeek"),
    ("[gemini] gemini-2.0-flash", "gemini-2.0-flash", "Gemini"),
    ("[gemini] gemini-2.5-pro", "gemini-2.5-pro-exp-03-25", "Gemini"),
    ("[groq] llama-3.3 70b", "llama-3.3-70b-versatile", "Groq"),
];

impl Default for Catalog {
    fn default() -> Self {
        Self {
            analysts: ANALYST_ORDER
                .iter()
                .map(|(display, value)| AnalystEntry {
                    display: display.to_string(),
                    value: value.to_string(),
                })
                .collect(),
            llms: LLM_ORDER
                .iter()
                .map(|(display, name, provider)| LlmEntry {
                    display: display.to_string(),
                    name: name.to_string(),
                    provider: provider.to_string(),
                })
                .collect(),
        }
    }
}

impl Catalog {
    /// Built-in tables, or the JSON file at `path` when one is configured.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let catalog = Self::from_json(&raw)
            .with_context(|| format!("Invalid catalog {}", path.display()))?;
        info!(
            "Loaded catalog from {} ({} analysts, {} models)",
            path.display(),
            catalog.analysts.len(),
            catalog.llms.len()
        );
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(raw)?;
        if catalog.llms.is_empty() {
            return Err(anyhow!("catalog must list at least one model"));
        }
        Ok(catalog)
    }

    pub fn analyst_options(&self) -> Vec<String> {
        self.analysts.iter().map(|a| a.display.clone()).collect()
    }

    /// First two analysts, or all of them when there are fewer.
    pub fn default_analysts(&self) -> Vec<String> {
        self.analysts
            .iter()
            .take(2)
            .map(|a| a.display.clone())
            .collect()
    }

    pub fn model_choices(&self) -> Vec<String> {
        self.llms.iter().map(LlmEntry::choice_label).collect()
    }

    pub fn default_model_choice(&self) -> String {
        self.llms
            .first()
            .map(LlmEntry::choice_label)
            .unwrap_or_default()
    }

    /// Maps display names or internal values (any case) to display names,
    /// keeping the order given.
    pub fn resolve_analysts(&self, names: &[String]) -> Result<Vec<String>> {
        names
            .iter()
            .map(|name| {
                self.analysts
                    .iter()
                    .find(|a| {
                        a.display.eq_ignore_ascii_case(name) || a.value.eq_ignore_ascii_case(name)
                    })
                    .map(|a| a.display.clone())
                    .ok_or_else(|| anyhow!("Unknown analyst '{}'", name))
            })
            .collect()
    }

    /// Accepts a selector label, a display name or a bare model name.
    pub fn resolve_model_choice(&self, raw: &str) -> Result<String> {
        let raw = raw.trim();
        self.llms
            .iter()
            .find(|m| m.choice_label() == raw || m.display == raw || m.name == raw)
            .map(LlmEntry::choice_label)
            .ok_or_else(|| anyhow!("Unknown model '{}'", raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_analysts_are_first_two() {
        let catalog = Catalog::default();
        assert_eq!(
            catalog.default_analysts(),
            vec!["Aswath Damodaran".to_string(), "Ben Graham".to_string()]
        );
    }

    #[test]
    fn test_default_analysts_with_short_table() {
        let catalog = Catalog {
            analysts: vec![AnalystEntry {
                display: "Only One".into(),
                value: "only_one".into(),
            }],
            llms: Catalog::default().llms,
        };
        assert_eq!(catalog.default_analysts(), vec!["Only One".to_string()]);
    }

    #[test]
    fn test_model_choices_use_name_and_provider() {
        let catalog = Catalog::default();
        let choices = catalog.model_choices();
        assert_eq!(choices.len(), catalog.llms.len());
        assert_eq!(choices[0], "gpt-4o (OpenAI)");
        assert_eq!(catalog.default_model_choice(), "gpt-4o (OpenAI)");
        assert!(choices.iter().all(|c| c.matches(" (").count() == 1));
    }

    #[test]
    fn test_resolve_analysts() {
        let catalog = Catalog::default();
        let names = vec!["warren_buffett".to_string(), "ben graham".to_string()];
        assert_eq!(
            catalog.resolve_analysts(&names).unwrap(),
            vec!["Warren Buffett".to_string(), "Ben Graham".to_string()]
        );
        assert!(catalog.resolve_analysts(&[]).unwrap().is_empty());
        assert!(catalog.resolve_analysts(&["Jim Simons".to_string()]).is_err());
    }

    #[test]
    fn test_resolve_model_choice() {
        let catalog = Catalog::default();
        assert_eq!(
            catalog.resolve_model_choice("deepseek-chat").unwrap(),
            "deepseek-chat (DeepSeek)"
        );
        assert_eq!(
            catalog.resolve_model_choice("[groq] llama-3.3 70b").unwrap(),
            "llama-3.3-70b-versatile (Groq)"
        );
        assert_eq!(catalog.resolve_model_choice(" o3-mini (OpenAI) ").unwrap(), "o3-mini (OpenAI)");
        assert!(catalog.resolve_model_choice("gpt-2").is_err());
    }

    #[test]
    fn test_catalog_from_json() {
        let raw = r#"{
            "analysts": [{"display": "Warren Buffett", "value": "warren_buffett"}],
            "llms": [{"display": "[local] llama3", "name": "llama3", "provider": "Ollama"}]
        }"#;
        let catalog = Catalog::from_json(raw).unwrap();
        assert_eq!(catalog.model_choices(), vec!["llama3 (Ollama)".to_string()]);

        let no_models = r#"{"analysts": [], "llms": []}"#;
        assert!(Catalog::from_json(no_models).is_err());
    }
}
