use std::time::{Duration, Instant};

use chrono::Utc;
use eframe::egui;
use tokio::sync::mpsc;

use crate::common::ChannelEvent;
use crate::network::Dispatcher;
use crate::state::{Action, AppState, Tab};

use super::components::{assignments, chat_area, dashboard, input_bar, sidebar, study_session};

const TICK: Duration = Duration::from_secs(1);

pub struct DashboardApp {
    state: AppState,
    dispatcher: Dispatcher,
    event_receiver: mpsc::Receiver<ChannelEvent>,
    last_tick: Instant,
}

impl DashboardApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        state: AppState,
        dispatcher: Dispatcher,
        event_receiver: mpsc::Receiver<ChannelEvent>,
    ) -> Self {
        Self {
            state,
            dispatcher,
            event_receiver,
            last_tick: Instant::now(),
        }
    }

    /// The single entry point for model changes.
    fn dispatch(&mut self, action: Action) {
        match self.state.update(action, Utc::now()) {
            Ok(Some(event)) => {
                if let Err(err) = self.dispatcher.dispatch(event) {
                    self.state.notice = Some(err.to_string());
                }
            }
            Ok(None) => {}
            Err(err) => {
                log::debug!("Rejected action: {err}");
                self.state.notice = Some(err.to_string());
            }
        }
    }

    fn handle_channel_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            self.dispatch(Action::Channel(event));
        }
    }

    fn handle_clock(&mut self) {
        while self.last_tick.elapsed() >= TICK {
            self.last_tick += TICK;
            self.dispatch(Action::Tick);
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_channel_events();
        self.handle_clock();

        let mut actions = Vec::new();

        egui::SidePanel::left("navigation")
            .resizable(false)
            .default_width(180.0)
            .show(ctx, |ui| {
                actions.extend(sidebar::render(ui, &self.state));
            });

        if let Some(notice) = self.state.notice.clone() {
            egui::TopBottomPanel::bottom("notice").show(ctx, |ui| {
                ui.colored_label(egui::Color32::LIGHT_RED, notice);
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| match self.state.tab {
            Tab::Dashboard => dashboard::render(ui, &self.state),
            Tab::StudySessions => actions.extend(study_session::render(ui, &mut self.state)),
            Tab::Assignments => actions.extend(assignments::render(ui, &mut self.state)),
            Tab::Chat => {
                ui.heading("Group Chat");
                ui.separator();
                chat_area::render(ui, &self.state.messages);
                ui.separator();
                if input_bar::render(ui, &mut self.state.compose) {
                    actions.push(Action::SendMessage);
                }
            }
        });

        for action in actions {
            self.dispatch(action);
        }

        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

impl Drop for DashboardApp {
    fn drop(&mut self) {
        self.dispatcher.shutdown();
    }
}
