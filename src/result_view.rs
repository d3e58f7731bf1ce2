use serde_json::Value;

/// One row of the decisions table, when the backend returns one.
#[derive(Clone, Debug, PartialEq)]
pub struct DecisionRow {
    pub ticker: String,
    pub action: String,
    pub quantity: Option<f64>,
    pub confidence: Option<f64>,
    pub reasoning: Option<String>,
}

pub fn pretty_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Pulls `{"decisions": {ticker: {action, quantity, confidence, reasoning}}}`
/// out of a result. Any other shape yields no rows.
pub fn decision_rows(value: &Value) -> Vec<DecisionRow> {
    let Some(decisions) = value.get("decisions").and_then(Value::as_object) else {
        return Vec::new();
    };

    decisions
        .iter()
        .filter_map(|(ticker, d)| {
            let d = d.as_object()?;
            Some(DecisionRow {
                ticker: ticker.clone(),
                action: d
                    .get("action")
                    .and_then(Value::as_str)
                    .unwrap_or("-")
                    .to_string(),
                quantity: d.get("quantity").and_then(Value::as_f64),
                confidence: d.get("confidence").and_then(Value::as_f64),
                reasoning: d.get("reasoning").map(|r| match r {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }),
            })
        })
        .collect()
}

/// Plain-text table for the terminal.
pub fn render_decisions_table(rows: &[DecisionRow]) -> String {
    let mut out = format!(
        "{:<8} {:<8} {:>10} {:>11}\n",
        "TICKER", "ACTION", "QUANTITY", "CONFIDENCE"
    );
    for row in rows {
        out.push_str(&format!(
            "{:<8} {:<8} {:>10} {:>11}\n",
            row.ticker,
            row.action.to_uppercase(),
            row.quantity.map(|q| format!("{:.0}", q)).unwrap_or_else(|| "-".into()),
            row.confidence
                .map(|c| format!("{:.1}%", c))
                .unwrap_or_else(|| "-".into()),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decision_rows_from_backend_shape() {
        let value = json!({
            "decisions": {
                "AAPL": {"action": "buy", "quantity": 25, "confidence": 72.5, "reasoning": "Strong moat"},
                "TSLA": {"action": "short", "quantity": 10}
            },
            "analyst_signals": {}
        });
        let rows = decision_rows(&value);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ticker, "AAPL");
        assert_eq!(rows[0].action, "buy");
        assert_eq!(rows[0].quantity, Some(25.0));
        assert_eq!(rows[0].confidence, Some(72.5));
        assert_eq!(rows[0].reasoning.as_deref(), Some("Strong moat"));
        assert_eq!(rows[1].confidence, None);
    }

    #[test]
    fn test_other_shapes_have_no_rows() {
        assert!(decision_rows(&json!(null)).is_empty());
        assert!(decision_rows(&json!("done")).is_empty());
        assert!(decision_rows(&json!({"decisions": null})).is_empty());
        assert!(decision_rows(&json!({"decisions": {"AAPL": "hold"}})).is_empty());
    }

    #[test]
    fn test_table_and_pretty_output() {
        let rows = decision_rows(&json!({
            "decisions": {"NVDA": {"action": "hold", "quantity": 0, "confidence": 50}}
        }));
        let table = render_decisions_table(&rows);
        assert!(table.starts_with("TICKER"));
        assert!(table.contains("NVDA"));
        assert!(table.contains("HOLD"));
        assert!(table.contains("50.0%"));

        assert_eq!(pretty_json(&json!("raw text")), "raw text");
        assert!(pretty_json(&json!({"a": 1})).contains("\"a\": 1"));
    }
}
