//! # Connect Panel User Interface
//!
//! egui front end for [`ConnectionController`]. The UI thread is the controller's
//! owner: every frame it drains the hand-off channel, then renders the current
//! state. Background attempts wake it through `request_repaint`, so an outcome is
//! shown as soon as it is posted rather than on the next input event.

pub mod common;
pub mod connect_menu;

use eframe::egui;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::mqtt::controller::ConnectionController;

use self::connect_menu::ConnectMenuData;

pub struct MqttConnectUI {
    connect_menu_data: ConnectMenuData,
}

impl MqttConnectUI {
    pub fn new(cc: &eframe::CreationContext<'_>, mut controller: ConnectionController) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);

        let ctx = cc.egui_ctx.clone();
        controller.set_waker(Arc::new(move || ctx.request_repaint()));
        info!("Connect panel ready");

        MqttConnectUI {
            connect_menu_data: ConnectMenuData::new(controller),
        }
    }
}

impl eframe::App for MqttConnectUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            self.connect_menu_data.render(ui);
        });

        if self.connect_menu_data.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(33));
        }
    }
}
