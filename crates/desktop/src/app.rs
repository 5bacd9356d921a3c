//! BizLocate Desktop — egui app state and chat UI.

use bizlocate::conversation::Message;
use bizlocate::error::contact_failure_message;
use bizlocate::llm::OpenAiClient;
use bizlocate::{Assistant, ChatSession, ContextSnapshot, Submission};
use eframe::egui;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

const CHAT_INPUT_ROWS: usize = 2;
const BADGE_SIZE: f32 = 28.0;
const INPUT_HINT: &str = "Ask about location analysis results...";

pub struct BizLocateApp {
    /// Conversation and the pending flag. Only touched from the UI thread.
    chat: ChatSession,
    /// Shared with the worker thread of the in-flight turn.
    assistant: Arc<Assistant<OpenAiClient>>,
    /// Analysis context loaded at startup.
    context: Arc<ContextSnapshot>,
    /// Current input text.
    chat_input: String,
    /// When Some, a turn is in flight; the reply text arrives here.
    turn_receiver: Option<mpsc::Receiver<String>>,
    /// Set by the conversation listener on every append or pending change; cleared once we
    /// scrolled to it.
    scroll_to_latest: Arc<AtomicBool>,
    /// Config or context loading problem, shown under the header.
    load_error: Option<String>,
}

impl BizLocateApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let mut load_error = None;
        let (config, config_path) = match bizlocate::config::load_config(None) {
            Ok(pair) => pair,
            Err(e) => {
                log::error!("failed to load config: {:#}", e);
                load_error = Some(format!("failed to load config: {}", e));
                (
                    bizlocate::config::Config::default(),
                    bizlocate::config::default_config_path(),
                )
            }
        };
        let context = match bizlocate::config::resolve_context_path(&config, &config_path) {
            Some(path) => bizlocate::context::load_context(&path).unwrap_or_else(|e| {
                log::error!("failed to load context: {:#}", e);
                load_error = Some(format!("failed to load context: {}", e));
                ContextSnapshot::default()
            }),
            None => ContextSnapshot::default(),
        };

        let scroll_to_latest = Arc::new(AtomicBool::new(true));
        let mut chat = ChatSession::new();
        let flag = Arc::clone(&scroll_to_latest);
        chat.conversation_mut()
            .subscribe(move |_| flag.store(true, Ordering::Relaxed));

        log::info!("desktop started");
        Self {
            chat,
            assistant: Arc::new(Assistant::from_config(&config)),
            context: Arc::new(context),
            chat_input: String::new(),
            turn_receiver: None,
            scroll_to_latest,
            load_error,
        }
    }

    /// Start a turn on a background thread if the input is accepted.
    fn start_chat_turn(&mut self) {
        let text = match self.chat.begin_turn(&self.chat_input) {
            Submission::Ignored => return,
            Submission::Send(text) => text,
        };
        self.chat_input.clear();

        let assistant = Arc::clone(&self.assistant);
        let context = Arc::clone(&self.context);
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let reply = run_assistant_turn(&assistant, &text, &context);
            let _ = tx.send(reply);
        });
        self.turn_receiver = Some(rx);
    }

    /// Poll for the in-flight turn's reply and append it. Call each frame.
    fn poll_chat_turn(&mut self) {
        let Some(rx) = &self.turn_receiver else {
            return;
        };
        match rx.try_recv() {
            Ok(reply) => {
                self.turn_receiver = None;
                self.chat.complete_turn(reply);
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => {
                self.turn_receiver = None;
                self.chat.complete_turn(contact_failure_message());
            }
        }
    }

    fn render_badge(ui: &mut egui::Ui, is_user: bool) {
        let (rect, _) =
            ui.allocate_exact_size(egui::vec2(BADGE_SIZE, BADGE_SIZE), egui::Sense::hover());
        let visuals = ui.style().visuals.clone();
        let (fill, text_color) = if is_user {
            (egui::Color32::WHITE, egui::Color32::BLACK)
        } else {
            (visuals.widgets.inactive.bg_fill, visuals.text_color())
        };
        ui.painter()
            .circle_filled(rect.center(), BADGE_SIZE / 2.0, fill);
        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            if is_user { "U" } else { "AI" },
            egui::FontId::proportional(12.0),
            text_color,
        );
    }

    /// One message row: badge, bubble with text and time. User rows are mirrored.
    fn render_chat_message(ui: &mut egui::Ui, m: &Message) {
        let layout = if m.is_user() {
            egui::Layout::right_to_left(egui::Align::TOP)
        } else {
            egui::Layout::left_to_right(egui::Align::TOP)
        };
        ui.with_layout(layout, |ui| {
            Self::render_badge(ui, m.is_user());
            ui.add_space(6.0);
            let fill = if m.is_user() {
                ui.style().visuals.extreme_bg_color
            } else {
                ui.style().visuals.faint_bg_color
            };
            egui::Frame::none()
                .fill(fill)
                .rounding(egui::Rounding::same(8.0))
                .inner_margin(egui::Margin::same(8.0))
                .show(ui, |ui| {
                    ui.set_max_width((ui.available_width() - BADGE_SIZE).max(80.0));
                    ui.vertical(|ui| {
                        ui.label(m.text());
                        ui.label(egui::RichText::new(m.time_label()).small().weak());
                    });
                });
        });
    }

    fn render_typing_indicator(ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            Self::render_badge(ui, false);
            ui.add_space(6.0);
            let t = ui.input(|i| i.time);
            let dots = (t * 3.0) as usize % 3 + 1;
            ui.label(egui::RichText::new("●".repeat(dots)).weak());
        });
    }

    fn ui_header(&self, ui: &mut egui::Ui) {
        ui.heading("BizLocate AI");
        ui.label(
            egui::RichText::new("Ask questions about your location analysis results").weak(),
        );
        let info = bizlocate::prompt::compose_context_info(&self.context);
        if !info.trim().is_empty() {
            egui::CollapsingHeader::new("Current context")
                .default_open(false)
                .show(ui, |ui| {
                    ui.label(info.trim());
                });
        }
        if let Some(ref err) = self.load_error {
            ui.colored_label(egui::Color32::RED, err);
        }
        if !self.assistant.has_api_key() {
            ui.colored_label(
                egui::Color32::YELLOW,
                format!("{} is not set", bizlocate::config::API_KEY_ENV),
            );
        }
        ui.separator();
    }

    fn ui_input(&mut self, ui: &mut egui::Ui) {
        let pending = self.chat.is_pending();
        let input_id = egui::Id::new("chat_input");
        // Enter sends, Shift+Enter falls through to the text edit as a newline.
        let enter_pressed = !pending
            && ui.memory(|m| m.has_focus(input_id))
            && ui.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Enter));

        let mut send_now = enter_pressed;
        ui.horizontal(|ui| {
            let can_send = self.chat.can_submit(&self.chat_input);
            let button_width = 56.0;
            ui.add_enabled(
                !pending,
                egui::TextEdit::multiline(&mut self.chat_input)
                    .id(input_id)
                    .desired_rows(CHAT_INPUT_ROWS)
                    .desired_width(ui.available_width() - button_width)
                    .hint_text(INPUT_HINT),
            );
            if ui
                .add_enabled(can_send, egui::Button::new("Send"))
                .clicked()
            {
                send_now = true;
            }
        });
        if send_now {
            self.start_chat_turn();
        }
    }

    fn ui_messages(&mut self, ui: &mut egui::Ui) {
        let scroll = self.scroll_to_latest.swap(false, Ordering::Relaxed);
        egui::ScrollArea::vertical()
            .stick_to_bottom(true)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for m in self.chat.conversation().messages() {
                    Self::render_chat_message(ui, m);
                    ui.add_space(8.0);
                }
                if self.chat.is_pending() {
                    Self::render_typing_indicator(ui);
                }
                if scroll {
                    ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                }
            });
    }
}

impl eframe::App for BizLocateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_chat_turn();
        if self.chat.is_pending() {
            // Keep polling the worker and animating the typing indicator.
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            self.ui_header(ui);
        });
        egui::TopBottomPanel::bottom("input").show(ctx, |ui| {
            ui.add_space(8.0);
            self.ui_input(ui);
            ui.add_space(8.0);
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.ui_messages(ui);
        });
    }
}

/// Run one assistant turn on its own runtime (called from a worker thread).
fn run_assistant_turn(
    assistant: &Assistant<OpenAiClient>,
    text: &str,
    context: &ContextSnapshot,
) -> String {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("failed to start runtime: {}", e);
            return contact_failure_message();
        }
    };
    rt.block_on(assistant.reply(text, context))
}
