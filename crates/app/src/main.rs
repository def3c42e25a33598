use std::sync::Arc;

use eframe::egui;
use parking_lot::Mutex;

mod state;
mod ui;
mod utils;

use state::AppState;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0]),
        vsync: true, // Limit to monitor refresh rate
        ..Default::default()
    };
    eframe::run_native(
        "Parley",
        options,
        Box::new(|_cc| {
            Box::new(ParleyApp {
                state: Arc::new(Mutex::new(AppState::new())),
            })
        }),
    )
}

struct ParleyApp {
    state: Arc<Mutex<AppState>>,
}

impl eframe::App for ParleyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut s = self.state.lock();

        // Drain background work (non-blocking)
        s.poll_dispatch();
        s.poll_models();
        s.poll_admin();

        // Keep polling while anything is in flight
        if s.dispatch_rx.is_some() || s.models_rx.is_some() || s.admin_rx.is_some() {
            ctx.request_repaint();
        }

        ui::draw(ctx, &mut s);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        let mut s = self.state.lock();
        s.sync_settings();
        utils::save_settings(&s.settings);
    }
}
