//! Reviewer window: the egui/eframe application.
//!
//! # Architecture
//!
//! [`ReviewApp`] is the top-level [`eframe::App`].  It owns the
//! [`ReviewSession`] and renders a projection of it every frame:
//!
//! * header with job id, position counter and the last error,
//! * utterance list (left) with current and confirmed indicators,
//! * the player controls, original text and the editable word tokens,
//! * the word input with autocomplete suggestions.
//!
//! Key presses are routed through [`shortcuts::dispatch`] before any widget
//! sees them; clicks map to the same [`Command`]s.  Delivery reports from
//! the outbox worker arrive on `report_rx` and are drained once per frame.

use std::path::PathBuf;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::session::{ReviewSession, Slot};
use crate::shortcuts::{self, Command, InputContext, Key, Modifiers};
use crate::transport::DeliveryReport;

const CONFIRMED: egui::Color32 = egui::Color32::from_rgb(80, 200, 120);
const CURRENT: egui::Color32 = egui::Color32::from_rgb(68, 136, 255);
const MUTED: egui::Color32 = egui::Color32::from_rgb(140, 140, 140);
const ERROR: egui::Color32 = egui::Color32::from_rgb(255, 136, 68);

// ---------------------------------------------------------------------------
// Key mapping
// ---------------------------------------------------------------------------

/// Translate an egui key into one the dispatcher understands.
fn map_key(key: egui::Key) -> Option<Key> {
    Some(match key {
        egui::Key::Enter => Key::Enter,
        egui::Key::ArrowUp => Key::ArrowUp,
        egui::Key::ArrowDown => Key::ArrowDown,
        egui::Key::ArrowLeft => Key::ArrowLeft,
        egui::Key::ArrowRight => Key::ArrowRight,
        egui::Key::Backspace => Key::Backspace,
        egui::Key::Tab => Key::Tab,
        egui::Key::J => Key::J,
        egui::Key::K => Key::K,
        _ => return None,
    })
}

fn map_modifiers(modifiers: egui::Modifiers) -> Modifiers {
    Modifiers {
        ctrl: modifiers.command,
    }
}

// ---------------------------------------------------------------------------
// ReviewApp
// ---------------------------------------------------------------------------

pub struct ReviewApp {
    session: ReviewSession,
    /// Outcomes of queued submissions.
    report_rx: mpsc::Receiver<DeliveryReport>,

    // ── Word input ───────────────────────────────────────────────────────
    input: String,
    input_id: egui::Id,
    /// Give the input keyboard focus on the next frame.
    focus_input: bool,

    /// Last error returned by a command.
    status: Option<String>,
    /// Where the suggestion list is written on exit.
    words_cache: Option<PathBuf>,
}

impl ReviewApp {
    pub fn new(
        session: ReviewSession,
        report_rx: mpsc::Receiver<DeliveryReport>,
        words_cache: Option<PathBuf>,
    ) -> Self {
        Self {
            session,
            report_rx,
            input: String::new(),
            input_id: egui::Id::new("word_input"),
            focus_input: true,
            status: None,
            words_cache,
        }
    }

    // ── Event sources ────────────────────────────────────────────────────

    fn poll_reports(&mut self) {
        while let Ok(report) = self.report_rx.try_recv() {
            self.session.handle_delivery(report);
        }
    }

    fn poll_playback(&mut self) {
        if let Err(e) = self.session.poll_playback() {
            self.report(e);
        }
    }

    /// Dispatch key presses and swallow the ones we handled so widgets do
    /// not act on them too.
    fn handle_keys(&mut self, ctx: &egui::Context) {
        let presses: Vec<(egui::Key, egui::Modifiers)> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        modifiers,
                        ..
                    } => Some((*key, *modifiers)),
                    _ => None,
                })
                .collect()
        });
        let input_focused = ctx.memory(|m| m.has_focus(self.input_id));

        for (egui_key, modifiers) in presses {
            let Some(key) = map_key(egui_key) else {
                continue;
            };
            let context = InputContext {
                input: &self.input,
                input_focused,
                buffer_empty: self.session.buffer().is_empty(),
            };
            let dispatch = shortcuts::dispatch(key, map_modifiers(modifiers), &context);

            if dispatch.suppress_default {
                ctx.input_mut(|i| i.consume_key(modifiers, egui_key));
            }
            if let Some(command) = dispatch.command {
                self.run(command);
            }
        }
    }

    // ── Command execution ────────────────────────────────────────────────

    fn run(&mut self, command: Command) {
        let clears = command.clears_input();
        let focuses = command.focuses_input();

        if let Err(e) = self.session.apply(command) {
            self.report(e);
        }
        if clears {
            self.input.clear();
        }
        if focuses {
            self.focus_input = true;
        }
    }

    fn report(&mut self, e: impl std::fmt::Display) {
        log::warn!("review: {e}");
        self.status = Some(e.to_string());
    }

    // ── Panels ───────────────────────────────────────────────────────────

    fn draw_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(format!("Job {}", self.session.job_id())).strong());
            ui.label(
                egui::RichText::new(self.session.counter_label()).color(MUTED),
            );
            ui.label(
                egui::RichText::new(format!(
                    "{} confirmed",
                    self.session.confirmed_count()
                ))
                .color(CONFIRMED),
            );

            let error = self
                .status
                .clone()
                .or_else(|| self.session.last_error().map(str::to_string));
            if let Some(msg) = error {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("x").clicked() {
                        self.status = None;
                        self.session.clear_error();
                    }
                    ui.label(egui::RichText::new(msg).color(ERROR));
                });
            }
        });
    }

    /// One row per utterance; clicking jumps to it.
    fn draw_utterance_list(&self, ui: &mut egui::Ui, commands: &mut Vec<Command>) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            let current = self.session.current_index();
            for (i, utterance) in self.session.utterances().iter().enumerate() {
                let mark = if self.session.is_confirmed(i) { "✔" } else { " " };
                let color = if i == current {
                    CURRENT
                } else if self.session.is_confirmed(i) {
                    CONFIRMED
                } else {
                    MUTED
                };
                let text = egui::RichText::new(format!(
                    "{mark} {:>3}  {}",
                    utterance.index, utterance.original_text
                ))
                .color(color);

                if ui.selectable_label(i == current, text).clicked() && i != current {
                    commands.push(Command::JumpTo(utterance.id.clone()));
                }
            }
        });
    }

    fn draw_controls(&self, ui: &mut egui::Ui, commands: &mut Vec<Command>) {
        ui.horizontal(|ui| {
            if ui.button("⏮").on_hover_text("Previous (Ctrl+J, ↑)").clicked() {
                commands.push(Command::PreviousUtterance);
            }
            if ui
                .button(self.session.icon().label())
                .on_hover_text("Play / pause")
                .clicked()
            {
                commands.push(Command::TogglePlayPause);
            }
            if ui.button("↺").on_hover_text("Replay (Tab)").clicked() {
                commands.push(Command::Replay);
            }
            if ui.button("⏭").on_hover_text("Next (↓)").clicked() {
                commands.push(Command::NextUtterance);
            }

            ui.label(
                egui::RichText::new(format!(
                    "{:.1}s / {:.1}s",
                    self.session.current_time(),
                    self.session.current_utterance().audio_duration_secs
                ))
                .color(MUTED),
            );

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let tick = if self.session.is_confirmed(self.session.current_index()) {
                    egui::RichText::new("✔ Confirmed").color(CONFIRMED)
                } else {
                    egui::RichText::new("✔ Confirm")
                };
                if ui.button(tick).on_hover_text("Confirm (Enter)").clicked() {
                    commands.push(Command::Confirm);
                }
                if ui
                    .button("Copy down")
                    .on_hover_text("Copy the original text (Enter on empty)")
                    .clicked()
                {
                    commands.push(Command::CopyDown);
                }
            });
        });
    }

    /// Sentinel, word tokens and the add affordance.
    fn draw_tokens(&self, ui: &mut egui::Ui, commands: &mut Vec<Command>) {
        let buffer = self.session.buffer();
        ui.horizontal_wrapped(|ui| {
            let at_begin = buffer.active() == Slot::Begin;
            if ui
                .selectable_label(at_begin, "⟨")
                .on_hover_text("Insert at the beginning")
                .clicked()
            {
                commands.push(Command::SelectToken(Slot::Begin));
            }

            for (i, word) in buffer.words().iter().enumerate() {
                let active = buffer.active() == Slot::Word(i);
                if ui.selectable_label(active, word.as_str()).clicked() {
                    commands.push(Command::SelectToken(Slot::Word(i)));
                }
            }

            if ui.button("+").on_hover_text("Add a word").clicked() {
                commands.push(Command::FocusInput);
            }
        });
    }

    fn draw_input(&mut self, ui: &mut egui::Ui, commands: &mut Vec<Command>) {
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.input)
                    .id(self.input_id)
                    .hint_text("type a word, Enter to add")
                    .desired_width(320.0),
            );
            if self.focus_input {
                response.request_focus();
                self.focus_input = false;
            }

            let typed = self.input.trim().to_string();
            if ui
                .add_enabled(!typed.is_empty(), egui::Button::new("Add"))
                .clicked()
            {
                commands.push(Command::InsertToken(typed.clone()));
            }
            if ui
                .add_enabled(!typed.is_empty(), egui::Button::new("Common"))
                .on_hover_text("Remember as a common word (Ctrl+Enter)")
                .clicked()
            {
                commands.push(Command::AddCommonWord(typed));
            }
        });

        if self.input.trim().is_empty() {
            return;
        }
        ui.horizontal_wrapped(|ui| {
            for word in self.session.suggestions().query(&self.input) {
                if ui.small_button(word).clicked() {
                    commands.push(Command::InsertToken(word.to_string()));
                }
            }
        });
    }

    fn draw_review(&mut self, ui: &mut egui::Ui, commands: &mut Vec<Command>) {
        self.draw_controls(ui, commands);
        ui.separator();

        ui.label(egui::RichText::new("Original").color(MUTED).size(11.0));
        ui.label(
            egui::RichText::new(self.session.current_utterance().original_text.as_str())
                .size(15.0),
        );
        ui.add_space(8.0);

        ui.label(egui::RichText::new("Edit").color(MUTED).size(11.0));
        self.draw_tokens(ui, commands);
        ui.add_space(8.0);

        self.draw_input(ui, commands);
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for ReviewApp {
    /// Called every frame by eframe.  Drains events, dispatches keys, then
    /// renders the session.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_reports();
        self.poll_playback();
        self.handle_keys(ctx);

        let mut commands = Vec::new();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            self.draw_header(ui);
        });
        egui::SidePanel::left("utterances")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                self.draw_utterance_list(ui, &mut commands);
            });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_review(ui, &mut commands);
        });

        for command in commands {
            self.run(command);
        }

        // Keep the play head and the icon moving while audio plays; slower
        // polling otherwise so delivery reports still show up.
        let interval = if self.session.is_playing() { 33 } else { 250 };
        ctx.request_repaint_after(Duration::from_millis(interval));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(path) = &self.words_cache {
            match self.session.suggestions().save_to(path) {
                Ok(()) => log::info!("suggestions saved to {}", path.display()),
                Err(e) => log::warn!("could not save suggestions: {e}"),
            }
        }
        log::info!(
            "review window closing ({} confirmed)",
            self.session.confirmed_count()
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
