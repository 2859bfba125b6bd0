use eframe::egui::{Button, Grid, TextEdit, Ui};
use tracing::debug;

use super::common::{create_frame, UiColors};
use crate::mqtt::controller::ConnectionController;

/// Connect panel: two input fields, the connect action and the outcome.
pub struct ConnectMenuData {
    controller: ConnectionController,
    host_buffer: String,
    port_buffer: String,
}

impl ConnectMenuData {
    pub fn new(controller: ConnectionController) -> Self {
        let host_buffer = controller.server_ip_address();
        let port_buffer = controller.server_port();
        Self {
            controller,
            host_buffer,
            port_buffer,
        }
    }

    pub fn is_busy(&self) -> bool {
        !self.controller.input_enabled()
    }

    /// Renders the panel. Applies pending state updates first.
    pub fn render(&mut self, ui: &mut Ui) {
        let applied = self.controller.pump();
        if applied > 0 {
            debug!("Applied {} state updates", applied);
        }
        let state = self.controller.state();

        ui.horizontal(|ui| {
            ui.heading("MQTT Broker");
            if !state.input_enabled {
                ui.spinner();
            } else if state.error_text.is_empty() {
                ui.colored_label(UiColors::ACTIVE, "\u{2B24}");
            } else {
                ui.colored_label(UiColors::INACTIVE, "\u{2B24}");
            }
            if let Some(at) = self.controller.last_attempt_at() {
                ui.weak(format!("last attempt {}", at.format("%H:%M:%S")));
            }
        });

        create_frame(UiColors::MAIN_BG, UiColors::BORDER).show(ui, |ui| {
            Grid::new("connect_form")
                .num_columns(2)
                .spacing([8.0, 6.0])
                .show(ui, |ui| {
                    ui.label("Server IP");
                    let host = ui.add_enabled(
                        state.input_enabled,
                        TextEdit::singleline(&mut self.host_buffer).hint_text("192.168.1.5"),
                    );
                    if host.changed() {
                        self.controller
                            .set_server_ip_address(self.host_buffer.clone());
                    }
                    ui.end_row();

                    ui.label("Port");
                    let port = ui.add_enabled(
                        state.input_enabled,
                        TextEdit::singleline(&mut self.port_buffer).hint_text("1883"),
                    );
                    if port.changed() {
                        self.controller.set_server_port(self.port_buffer.clone());
                    }
                    ui.end_row();
                });

            ui.add_space(6.0);
            let connect = Button::new("Connect").min_size([120.0, 24.0].into());
            if ui
                .add_enabled(self.controller.can_connect(), connect)
                .clicked()
            {
                self.controller.connect();
            }

            if !state.error_text.is_empty() {
                ui.add_space(4.0);
                ui.colored_label(UiColors::INACTIVE, state.error_text.as_str());
            }
        });
    }
}
