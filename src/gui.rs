use crate::app::{App, AppState};
use crate::form::{self, CASH_STEP, MAX_MARGIN_REQUIREMENT, MIN_INITIAL_CASH};
use crate::result_view::{self, DecisionRow};
use crate::runner::{BUSY_MESSAGE, SUCCESS_MESSAGE};
use eframe::egui;

// ──────────────────────────────────────────────────────────────────────────────
// Color Palette
// ──────────────────────────────────────────────────────────────────────────────

const ACCENT_TEAL: egui::Color32 = egui::Color32::from_rgb(15, 255, 193);
const ACCENT_PURPLE: egui::Color32 = egui::Color32::from_rgb(126, 72, 255);
const ACCENT_PINK: egui::Color32 = egui::Color32::from_rgb(255, 169, 249);
const ACCENT_GREEN: egui::Color32 = egui::Color32::from_rgb(34, 197, 94);
const ACCENT_RED: egui::Color32 = egui::Color32::from_rgb(239, 68, 68);
const ACCENT_YELLOW: egui::Color32 = egui::Color32::from_rgb(250, 204, 21);

const BG_DARK: egui::Color32 = egui::Color32::from_rgb(10, 20, 41);
const BG_CARD: egui::Color32 = egui::Color32::from_rgb(24, 27, 48);
const BG_ELEVATED: egui::Color32 = egui::Color32::from_rgb(12, 19, 36);
const TEXT_PRIMARY: egui::Color32 = egui::Color32::from_rgb(199, 247, 244);
const TEXT_SECONDARY: egui::Color32 = egui::Color32::from_rgb(179, 184, 255);
const BORDER_SUBTLE: egui::Color32 = egui::Color32::from_rgb(51, 51, 68);

pub struct GuiApp {
    app: App,
    start_date_input: String,
    end_date_input: String,
    start_date_invalid: bool,
    end_date_invalid: bool,
}

impl GuiApp {
    pub fn new(app: App) -> Self {
        let start_date_input = form::format_date(app.form.start_date);
        let end_date_input = form::format_date(app.form.end_date);
        Self {
            app,
            start_date_input,
            end_date_input,
            start_date_invalid: false,
            end_date_invalid: false,
        }
    }

    fn apply_theme(ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        style.visuals.window_rounding = egui::Rounding::same(18.0);
        style.visuals.widgets.noninteractive.rounding = egui::Rounding::same(12.0);
        style.visuals.widgets.inactive.rounding = egui::Rounding::same(12.0);
        style.visuals.widgets.active.rounding = egui::Rounding::same(12.0);
        style.visuals.widgets.hovered.rounding = egui::Rounding::same(12.0);

        style.visuals.dark_mode = true;
        style.visuals.panel_fill = BG_DARK;
        style.visuals.window_fill = BG_CARD;
        style.visuals.faint_bg_color = BG_ELEVATED;
        style.visuals.extreme_bg_color = BG_ELEVATED;

        style.visuals.widgets.noninteractive.bg_fill = BG_CARD;
        style.visuals.widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, TEXT_SECONDARY);
        style.visuals.widgets.inactive.bg_fill = BG_ELEVATED;
        style.visuals.widgets.inactive.bg_stroke = egui::Stroke::new(1.5, ACCENT_PURPLE);
        style.visuals.widgets.inactive.fg_stroke = egui::Stroke::new(1.0, TEXT_PRIMARY);
        style.visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(32, 53, 104);
        style.visuals.widgets.hovered.fg_stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);
        style.visuals.widgets.active.bg_fill = ACCENT_PURPLE;
        style.visuals.widgets.active.fg_stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);

        style.visuals.selection.bg_fill = ACCENT_PURPLE.linear_multiply(0.4);
        style.visuals.selection.stroke = egui::Stroke::new(1.0, ACCENT_TEAL);

        style.spacing.item_spacing = egui::vec2(10.0, 8.0);

        ctx.set_style(style);
    }
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        Self::apply_theme(ctx);
        self.app.tick();

        // ── Top Bar ──
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new("AI Hedge Fund")
                    .size(28.0)
                    .strong()
                    .color(ACCENT_TEAL));
                ui.label(egui::RichText::new("Next-gen AI-powered investment simulation platform")
                    .size(13.0)
                    .color(TEXT_SECONDARY));
            });
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.add_space(8.0);
                ui.label(egui::RichText::new(format!("backend: {}", self.app.backend_label()))
                    .size(10.0)
                    .color(TEXT_SECONDARY));
            });
            ui.add_space(4.0);
        });

        // ── Main Content ──
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.render_inputs(ui);
                ui.add_space(8.0);
                self.render_team(ui);
                ui.add_space(8.0);
                self.render_engine(ui);
                ui.add_space(12.0);
                self.render_run_button(ui);
                ui.add_space(12.0);
                self.render_results(ui);
            });
        });

        if self.app.is_running() {
            ctx.request_repaint();
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Form
// ──────────────────────────────────────────────────────────────────────────────

impl GuiApp {
    fn render_inputs(&mut self, ui: &mut egui::Ui) {
        card(ui, |ui| {
            egui::Grid::new("inputs_grid")
                .num_columns(2)
                .spacing([16.0, 10.0])
                .show(ui, |ui| {
                    field_label(ui, "Enter Stock Tickers (comma-separated)");
                    field_label(ui, "Initial Cash ($)");
                    ui.end_row();

                    ui.add(
                        egui::TextEdit::singleline(&mut self.app.form.tickers)
                            .desired_width(420.0)
                            .hint_text("e.g. AAPL,MSFT,NVDA"),
                    );
                    ui.add(
                        egui::DragValue::new(&mut self.app.form.initial_cash)
                            .speed(CASH_STEP as f64)
                            .range(MIN_INITIAL_CASH..=u64::MAX)
                            .prefix("$"),
                    );
                    ui.end_row();

                    field_label(ui, "Start Date");
                    field_label(ui, "End Date");
                    ui.end_row();

                    date_input(
                        ui,
                        &mut self.start_date_input,
                        &mut self.app.form.start_date,
                        &mut self.start_date_invalid,
                    );
                    date_input(
                        ui,
                        &mut self.end_date_input,
                        &mut self.app.form.end_date,
                        &mut self.end_date_invalid,
                    );
                    ui.end_row();
                });
        });
    }

    fn render_team(&mut self, ui: &mut egui::Ui) {
        let options = self.app.catalog.analyst_options();
        let selected = &mut self.app.form.selected_analysts;
        card(ui, |ui| {
            section_header(ui, "Select Your Virtual Investment Team");
            field_label(ui, "AI Analysts");
            ui.horizontal_wrapped(|ui| {
                for name in &options {
                    let mut checked = selected.contains(name);
                    if ui.checkbox(&mut checked, name.as_str()).changed() {
                        if checked {
                            selected.push(name.clone());
                        } else {
                            selected.retain(|s| s != name);
                        }
                    }
                }
            });
            if selected.is_empty() {
                ui.label(egui::RichText::new("No analysts selected")
                    .size(11.0)
                    .color(ACCENT_YELLOW));
            }
        });
    }

    fn render_engine(&mut self, ui: &mut egui::Ui) {
        let choices = self.app.catalog.model_choices();
        let form = &mut self.app.form;
        card(ui, |ui| {
            section_header(ui, "Choose Your LLM Engine");
            egui::ComboBox::from_label("Select LLM Model")
                .selected_text(form.model_choice.clone())
                .width(320.0)
                .show_ui(ui, |ui| {
                    for choice in &choices {
                        ui.selectable_value(
                            &mut form.model_choice,
                            choice.clone(),
                            choice.as_str(),
                        );
                    }
                });

            ui.add_space(6.0);
            ui.columns(3, |cols| {
                field_label(&mut cols[0], "Margin Requirement (%)");
                cols[0].add(
                    egui::DragValue::new(&mut form.margin_requirement)
                        .speed(1.0)
                        .range(0..=MAX_MARGIN_REQUIREMENT),
                );
                cols[1].add_space(18.0);
                cols[1].checkbox(&mut form.show_reasoning, "Show Reasoning");
                cols[2].add_space(18.0);
                cols[2].checkbox(&mut form.show_agent_graph, "Show Agent Graph");
            });
        });
    }

    fn render_run_button(&mut self, ui: &mut egui::Ui) {
        let running = self.app.is_running();
        let width = ui.available_width();
        let button = egui::Button::new(
            egui::RichText::new("Run AI Hedge Fund")
                .size(16.0)
                .strong()
                .color(egui::Color32::from_rgb(35, 38, 70)),
        )
        .fill(if running { BORDER_SUBTLE } else { ACCENT_TEAL })
        .rounding(egui::Rounding::same(18.0))
        .min_size(egui::vec2(width, 40.0));

        if ui.add_enabled(!running, button).clicked() {
            self.app.start_run();
        }
    }

    fn render_results(&self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Results")
            .size(20.0)
            .strong()
            .color(TEXT_PRIMARY));
        ui.add_space(4.0);

        match self.app.state {
            AppState::Idle => {
                ui.label(egui::RichText::new("Configure the run above and press Run.")
                    .size(12.0)
                    .color(TEXT_SECONDARY));
            }
            AppState::Running => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(egui::RichText::new(BUSY_MESSAGE).color(TEXT_PRIMARY));
                });
            }
            AppState::Succeeded => {
                ui.label(egui::RichText::new(SUCCESS_MESSAGE)
                    .strong()
                    .color(ACCENT_GREEN));
                if let Some(result) = &self.app.result {
                    let rows = result_view::decision_rows(result);
                    if !rows.is_empty() {
                        card(ui, |ui| render_decisions(ui, &rows));
                    }
                    card(ui, |ui| {
                        ui.label(egui::RichText::new(result_view::pretty_json(result))
                            .monospace()
                            .size(12.0)
                            .color(TEXT_PRIMARY));
                    });
                }
            }
            AppState::Failed => {
                if let Some(e) = &self.app.error_msg {
                    ui.label(egui::RichText::new(e).color(ACCENT_RED));
                }
            }
        }
    }
}

fn render_decisions(ui: &mut egui::Ui, rows: &[DecisionRow]) {
    section_header(ui, "Trading Decisions");
    egui::Grid::new("decisions_grid")
        .striped(true)
        .spacing([24.0, 6.0])
        .show(ui, |ui| {
            for heading in ["Ticker", "Action", "Quantity", "Confidence"] {
                field_label(ui, heading);
            }
            ui.end_row();

            for row in rows {
                let ticker =
                    ui.label(egui::RichText::new(&row.ticker).strong().color(TEXT_PRIMARY));
                if let Some(reasoning) = &row.reasoning {
                    ticker.on_hover_text(reasoning.as_str());
                }
                ui.label(egui::RichText::new(row.action.to_uppercase())
                    .strong()
                    .color(action_color(&row.action)));
                ui.label(row.quantity.map(|q| format!("{:.0}", q)).unwrap_or_else(|| "-".into()));
                ui.label(
                    row.confidence
                        .map(|c| format!("{:.1}%", c))
                        .unwrap_or_else(|| "-".into()),
                );
                ui.end_row();
            }
        });
}

fn action_color(action: &str) -> egui::Color32 {
    match action.to_ascii_lowercase().as_str() {
        "buy" | "cover" => ACCENT_GREEN,
        "sell" | "short" => ACCENT_RED,
        "hold" => ACCENT_YELLOW,
        _ => ACCENT_PINK,
    }
}

/// Text field for a date; unparseable text leaves the last valid date in place.
fn date_input(
    ui: &mut egui::Ui,
    text: &mut String,
    date: &mut chrono::NaiveDate,
    invalid: &mut bool,
) {
    ui.horizontal(|ui| {
        let response = ui.add(
            egui::TextEdit::singleline(text)
                .desired_width(120.0)
                .hint_text("YYYY-MM-DD"),
        );
        if response.changed() {
            (*date, *invalid) = form::coerce_date(text, *date);
        }
        if *invalid {
            ui.label(
                egui::RichText::new(format!("using {}", form::format_date(*date)))
                    .size(10.0)
                    .color(ACCENT_YELLOW),
            );
        }
    });
}

fn card(ui: &mut egui::Ui, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::none()
        .fill(BG_CARD)
        .rounding(egui::Rounding::same(22.0))
        .stroke(egui::Stroke::new(1.0, BORDER_SUBTLE))
        .inner_margin(egui::Margin::same(16.0))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            add_contents(ui);
        });
}

fn section_header(ui: &mut egui::Ui, text: &str) {
    ui.label(egui::RichText::new(text)
        .size(15.0)
        .strong()
        .color(TEXT_PRIMARY));
    ui.add_space(4.0);
}

fn field_label(ui: &mut egui::Ui, text: &str) {
    ui.label(egui::RichText::new(text).size(11.0).color(TEXT_SECONDARY));
}
