//! Main MyTarot application struct and eframe integration
//!
//! Renders one screen per phase. Every click becomes a [`SessionAction`]
//! sent through the controller; worker results are pumped once per frame.

use crate::config::TarotConfig;
use crate::deck::{deck, SPREAD_COUNT};
use crate::processor::SessionController;
use crate::state::{Notice, Phase, RequestState, SessionAction, SessionState, SharedSession, MAX_SELECTION};
use crate::testconfig::{AssertionResult, Scenario, ScenarioCommand, ScenarioRunner};
use crate::ui::assets::AssetCatalog;
use crate::ui::components::{CardTile, ReadingDisplay, VoiceButton, READING_CARD_SIZE};
use crate::ui::theme::{install_fonts, Theme};
use crate::Result;
use egui::{Button, CentralPanel, Color32, RichText, ScrollArea, TextEdit, Ui, Vec2};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const TITLE: &str = "마이타로";
pub const START_LABEL: &str = "타로 상담 시작하기";
pub const SUBMIT_LABEL: &str = "질문 제출";
pub const SELECT_HEADING: &str = "3장의 카드를 선택해주세요";
pub const COMPLETE_LABEL: &str = "선택 완료";
pub const RETRY_LABEL: &str = "다시 시도";
pub const RESULT_HEADING: &str = "타로 해석";
pub const RESTART_LABEL: &str = "다시 시작하기";

/// Seconds the welcome title takes to fade in
const FADE_IN_SECS: f64 = 1.2;

/// Exit code requested by a scenario, read by `main` after the window closes
pub type ExitCode = Arc<AtomicI32>;

/// Main MyTarot application
pub struct TarotApp {
    initialized: bool,
    controller: SessionController,
    theme: Theme,
    assets: AssetCatalog,
    scenario: Option<ScenarioRunner>,
    exit_code: ExitCode,
    pending_exit: Option<i32>,
    intro_started: Option<f64>,
}

impl TarotApp {
    /// Create the app from a window creation context
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: &TarotConfig,
        scenario: Option<Scenario>,
        exit_code: ExitCode,
    ) -> Result<Self> {
        install_fonts(&cc.egui_ctx, &config.ui);
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let controller = SessionController::from_config(config)?;
        let theme = Theme::from_mode(config.ui.theme);
        theme.apply(&cc.egui_ctx);

        let mut app = Self::with_controller(controller, theme, AssetCatalog::scan(&config.ui));
        app.scenario = scenario.map(ScenarioRunner::new);
        app.exit_code = exit_code;
        Ok(app)
    }

    /// Build around an existing controller (used by tests)
    pub fn with_controller(controller: SessionController, theme: Theme, assets: AssetCatalog) -> Self {
        Self {
            initialized: false,
            controller,
            theme,
            assets,
            scenario: None,
            exit_code: Arc::new(AtomicI32::new(0)),
            pending_exit: None,
            intro_started: None,
        }
    }

    pub fn session(&self) -> &SharedSession {
        self.controller.session()
    }

    /// Apply a user action (the same path buttons take)
    pub fn dispatch(&mut self, action: SessionAction) {
        self.controller.dispatch(action);
    }

    /// Drain worker results; true if the session changed
    pub fn pump(&mut self) -> bool {
        self.controller.pump()
    }

    fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        if let Some(ref mut runner) = self.scenario {
            runner.start();
        }

        info!("MyTarot UI initialized");
    }

    fn process_scenario(&mut self, ctx: &egui::Context) {
        let mut due = Vec::new();
        if let Some(ref mut runner) = self.scenario {
            while let Some(step) = runner.poll() {
                due.push(step);
            }
        }

        for (command, assertion) in due {
            match command {
                ScenarioCommand::Dispatch(action) => {
                    info!("[SCENARIO] Executing: {:?}", action);
                    self.controller.dispatch(action);
                }
                ScenarioCommand::Noop => {}
                ScenarioCommand::Exit { code } => {
                    info!("[SCENARIO] Exit requested with code {}", code);
                    self.pending_exit = Some(code);
                }
            }

            if let Some(assertion) = assertion {
                // Let any already-finished work land before checking
                self.controller.pump();
                let snapshot = self.controller.session().snapshot();
                if let Some(ref mut runner) = self.scenario {
                    if let AssertionResult::Failed(_) = runner.check_assertion(&assertion, &snapshot) {
                        if self.pending_exit == Some(0) {
                            self.pending_exit = Some(1);
                        }
                    }
                }
            }
        }

        if let Some(ref runner) = self.scenario {
            if runner.is_completed() {
                if let Some(code) = self.pending_exit.take() {
                    info!("{}", runner.summary());
                    let final_code = if runner.passed() { code } else { 1 };
                    info!("[SCENARIO] Exiting with code {}", final_code);
                    self.exit_code.store(final_code, Ordering::SeqCst);
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            }
        }
    }

    /// Render one frame
    pub fn show(&mut self, ctx: &egui::Context) {
        self.initialize();

        if self.controller.pump() {
            ctx.request_repaint();
        }

        self.process_scenario(ctx);

        // Keep polling while a worker may deliver results
        if self.scenario.is_some() || self.controller.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        let snapshot = self.controller.session().snapshot();
        let mut actions = Vec::new();

        CentralPanel::default().show(ctx, |ui| match snapshot.phase {
            Phase::Welcome => self.welcome_screen(ui, &mut actions),
            Phase::QuestionCapture => self.question_screen(ui, &snapshot, &mut actions),
            Phase::CardSelection => self.selection_screen(ui, &snapshot, &mut actions),
            Phase::ResultDisplay => self.result_screen(ui, &snapshot, &mut actions),
        });

        if snapshot.phase != Phase::Welcome {
            self.intro_started = None;
        }

        for action in actions {
            self.controller.dispatch(action);
        }
    }

    fn welcome_screen(&mut self, ui: &mut Ui, actions: &mut Vec<SessionAction>) {
        let now = ui.input(|i| i.time);
        let started = *self.intro_started.get_or_insert(now);
        let alpha = ((now - started) / FADE_IN_SECS).clamp(0.0, 1.0) as f32;
        if alpha < 1.0 {
            ui.ctx().request_repaint();
        }

        ui.vertical_centered(|ui| {
            ui.add_space(120.0);
            ui.label(
                RichText::new(TITLE)
                    .size(56.0)
                    .strong()
                    .color(self.theme.text_primary.gamma_multiply(alpha)),
            );
            ui.add_space(12.0);
            ui.label(
                RichText::new("세 장의 카드가 당신의 질문에 답합니다")
                    .size(16.0)
                    .color(self.theme.text_secondary.gamma_multiply(alpha)),
            );
            ui.add_space(60.0);

            let start = Button::new(RichText::new(START_LABEL).size(18.0).color(Color32::WHITE))
                .fill(self.theme.primary)
                .rounding(self.theme.button_rounding)
                .min_size(Vec2::new(220.0, 48.0));
            if ui.add(start).clicked() {
                actions.push(SessionAction::Start);
            }
        });
    }

    fn question_screen(
        &mut self,
        ui: &mut Ui,
        snapshot: &SessionState,
        actions: &mut Vec<SessionAction>,
    ) {
        ui.vertical_centered(|ui| {
            ui.add_space(60.0);
            ui.heading(RichText::new("무엇이 궁금하신가요?").color(self.theme.text_primary));
            ui.add_space(self.theme.spacing_lg);

            let mut question = snapshot.question.clone();
            let edit = TextEdit::multiline(&mut question)
                .hint_text("질문을 입력하거나 음성으로 말해주세요")
                .desired_rows(4)
                .desired_width(480.0);
            if ui.add(edit).changed() {
                actions.push(SessionAction::EditQuestion(question));
            }

            if let Some(notice) = &snapshot.notice {
                ui.add_space(self.theme.spacing_sm);
                let color = match notice {
                    Notice::EmptyQuestion => self.theme.warning,
                    Notice::Voice(_) => self.theme.error,
                };
                ui.label(RichText::new(notice.message()).size(14.0).color(color));
            }

            ui.add_space(self.theme.spacing);
            ui.horizontal(|ui| {
                // Center the two buttons as a group
                let width = 180.0 + 140.0 + self.theme.spacing;
                ui.add_space(((ui.available_width() - width) / 2.0).max(0.0));

                if VoiceButton::new(snapshot.listening, &self.theme)
                    .show(ui)
                    .clicked()
                {
                    actions.push(SessionAction::StartVoiceCapture);
                }

                ui.add_space(self.theme.spacing);

                let submit = Button::new(RichText::new(SUBMIT_LABEL).color(Color32::WHITE))
                    .fill(self.theme.primary)
                    .rounding(self.theme.button_rounding)
                    .min_size(Vec2::new(140.0, 40.0));
                if ui.add(submit).clicked() {
                    actions.push(SessionAction::SubmitQuestion);
                }
            });
        });
    }

    fn selection_screen(
        &mut self,
        ui: &mut Ui,
        snapshot: &SessionState,
        actions: &mut Vec<SessionAction>,
    ) {
        ui.vertical_centered(|ui| {
            ui.add_space(self.theme.spacing);
            ui.heading(RichText::new(SELECT_HEADING).color(self.theme.text_primary));
            ui.label(
                RichText::new(format!(
                    "{} / {}",
                    snapshot.selection.len(),
                    MAX_SELECTION
                ))
                .color(self.theme.text_muted),
            );
        });
        ui.add_space(self.theme.spacing_sm);

        let footer_height = 110.0;
        ScrollArea::vertical()
            .max_height((ui.available_height() - footer_height).max(120.0))
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for spread in deck().spreads(SPREAD_COUNT) {
                    ui.horizontal_wrapped(|ui| {
                        for card in spread {
                            let picked = snapshot.selection.contains(&card.id);
                            let response = CardTile::new(card, &self.theme)
                                .face_up(picked)
                                .highlighted(picked)
                                .images(self.assets.back(), self.assets.front(card))
                                .show(ui);
                            if response.clicked() {
                                actions.push(SessionAction::ToggleCard(card.id.clone()));
                            }
                        }
                    });
                    ui.add_space(self.theme.spacing);
                }
            });

        ui.vertical_centered(|ui| {
            ui.add_space(self.theme.spacing_sm);
            match &snapshot.request {
                RequestState::Pending { .. } => {
                    ui.horizontal(|ui| {
                        ui.add_space((ui.available_width() / 2.0 - 110.0).max(0.0));
                        ui.spinner();
                        ui.label(
                            RichText::new("카드를 해석하는 중...").color(self.theme.text_secondary),
                        );
                    });
                }
                RequestState::Failed {
                    message,
                    recoverable,
                    ..
                } => {
                    ui.label(RichText::new(message).color(self.theme.error));
                    if !recoverable {
                        ui.label(
                            RichText::new("설정을 확인한 뒤 다시 시도해주세요.")
                                .size(12.0)
                                .color(self.theme.text_muted),
                        );
                    }
                    ui.horizontal(|ui| {
                        ui.add_space((ui.available_width() / 2.0 - 130.0).max(0.0));
                        if ui.button(RETRY_LABEL).clicked() {
                            actions.push(SessionAction::RetryInterpretation);
                        }
                        if ui.button(RESTART_LABEL).clicked() {
                            actions.push(SessionAction::Reset);
                        }
                    });
                }
                RequestState::Idle if snapshot.selection.is_complete() => {
                    let complete = Button::new(RichText::new(COMPLETE_LABEL).color(Color32::WHITE))
                        .fill(self.theme.primary)
                        .rounding(self.theme.button_rounding)
                        .min_size(Vec2::new(160.0, 44.0));
                    if ui.add(complete).clicked() {
                        actions.push(SessionAction::CompleteSelection);
                    }
                }
                RequestState::Idle => {}
            }
        });
    }

    fn result_screen(
        &mut self,
        ui: &mut Ui,
        snapshot: &SessionState,
        actions: &mut Vec<SessionAction>,
    ) {
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(self.theme.spacing);
                    ui.heading(RichText::new(RESULT_HEADING).color(self.theme.text_primary));
                    ui.add_space(self.theme.spacing);

                    let cards = snapshot.selection.cards();
                    let row_width = cards.len() as f32 * (READING_CARD_SIZE.x + self.theme.spacing);
                    ui.horizontal(|ui| {
                        ui.add_space(((ui.available_width() - row_width) / 2.0).max(0.0));
                        for card in cards {
                            ui.vertical(|ui| {
                                CardTile::new(card, &self.theme)
                                    .face_up(true)
                                    .size(READING_CARD_SIZE)
                                    .images(self.assets.back(), self.assets.front(card))
                                    .show(ui);
                                ui.label(
                                    RichText::new(card.name)
                                        .size(13.0)
                                        .color(self.theme.text_secondary),
                                );
                            });
                            ui.add_space(self.theme.spacing);
                        }
                    });

                    ui.add_space(self.theme.spacing);
                    ui.label(
                        RichText::new(format!("“{}”", snapshot.question))
                            .italics()
                            .color(self.theme.text_muted),
                    );
                    ui.add_space(self.theme.spacing_sm);
                });

                // Long readings scroll inside the panel so the restart button stays close
                let panel_height = (ui.ctx().screen_rect().height() * 0.45).max(200.0);
                ReadingDisplay::new(&snapshot.interpretation, snapshot.received_at, &self.theme)
                    .max_height(panel_height)
                    .show(ui);

                ui.vertical_centered(|ui| {
                    ui.add_space(self.theme.spacing_lg);
                    let restart = Button::new(RichText::new(RESTART_LABEL).color(Color32::WHITE))
                        .fill(self.theme.secondary)
                        .rounding(self.theme.button_rounding)
                        .min_size(Vec2::new(180.0, 44.0));
                    if ui.add(restart).clicked() {
                        actions.push(SessionAction::Reset);
                    }
                });
            });
    }
}

impl eframe::App for TarotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show(ctx);
    }
}
