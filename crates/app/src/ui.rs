//! Window layout: toolbar, conversation view, raw panel, composer.

use providers::online;
use shared::settings::BackendKind;

use crate::state::AppState;

pub fn draw(ctx: &egui::Context, s: &mut AppState) {
    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.heading("Parley");
            ui.separator();
            ui.selectable_value(
                &mut s.settings.backend,
                BackendKind::LocalServer,
                "Local server",
            );
            ui.selectable_value(&mut s.settings.backend, BackendKind::Hosted, "Hosted");
            ui.separator();
            ui.label("Server:");
            ui.add(
                egui::TextEdit::singleline(&mut s.settings.base_url)
                    .desired_width(220.0)
                    .hint_text("http://127.0.0.1:8080/"),
            );
            if ui
                .add_enabled(s.models_rx.is_none(), egui::Button::new("Refresh models"))
                .clicked()
            {
                s.refresh_models();
            }
            if ui
                .add_enabled(s.admin_rx.is_none(), egui::Button::new("Unload model"))
                .clicked()
            {
                s.unload_model();
            }
        });
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.label("Model:");
            let models = s.local_models.clone();
            let current_model = s.selected_model.clone().unwrap_or_default();
            egui::ComboBox::from_id_source("model_select")
                .width(220.0)
                .selected_text(current_model.as_str())
                .show_ui(ui, |ui| {
                    for m in &models {
                        ui.selectable_value(&mut s.selected_model, Some(m.clone()), m);
                    }
                });
            ui.label("Provider:");
            let current_provider = s.selected_provider.clone();
            egui::ComboBox::from_id_source("provider_select")
                .width(110.0)
                .selected_text(current_provider.as_str())
                .show_ui(ui, |ui| {
                    for name in online::display_names() {
                        ui.selectable_value(&mut s.selected_provider, name.to_string(), name);
                    }
                });
            ui.separator();
            if ui.button("Load…").clicked() {
                if let Some(path) = conversation_dialog().pick_file() {
                    s.load_conversation(&path);
                }
            }
            if ui.button("Save…").clicked() {
                if let Some(path) = conversation_dialog()
                    .set_file_name("conversation.txt")
                    .save_file()
                {
                    s.save_conversation(&path);
                }
            }
            ui.separator();
            ui.checkbox(&mut s.settings.show_raw_panel, "Show raw response");
        });
        ui.add_space(6.0);
    });

    egui::TopBottomPanel::bottom("composer").show(ctx, |ui| {
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(&s.status).weak());
            if s.dispatch_rx.is_some() || s.models_rx.is_some() || s.admin_rx.is_some() {
                ui.spinner();
            }
        });
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            let sending = s.dispatch_rx.is_some();
            let response = ui.add_sized(
                [ui.available_width() - 80.0, 64.0],
                egui::TextEdit::multiline(&mut s.input_text)
                    .desired_rows(3)
                    .hint_text("Type a message; Ctrl+Enter sends"),
            );
            let shortcut = response.has_focus()
                && ui.input_mut(|i| i.consume_key(egui::Modifiers::COMMAND, egui::Key::Enter));
            let clicked = ui
                .add_enabled(
                    !sending,
                    egui::Button::new("Send").min_size(egui::vec2(70.0, 64.0)),
                )
                .clicked();
            if (clicked || shortcut) && !sending {
                s.send_message();
            }
        });
        ui.add_space(6.0);
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        let show_raw = s.settings.show_raw_panel && !s.raw_label.is_empty();
        let chat_height = if show_raw {
            ui.available_height() - 200.0
        } else {
            ui.available_height()
        };

        egui::ScrollArea::vertical()
            .id_source("conversation")
            .max_height(chat_height)
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.add_sized(
                    [ui.available_width(), chat_height - 8.0],
                    egui::TextEdit::multiline(&mut s.transcript.as_str())
                        .desired_width(f32::INFINITY)
                        .interactive(false),
                );
            });

        if show_raw {
            ui.separator();
            egui::CollapsingHeader::new(s.raw_label.as_str())
                .id_source("raw_panel")
                .default_open(false)
                .show(ui, |ui| {
                    egui::ScrollArea::vertical()
                        .id_source("raw_scroll")
                        .max_height(150.0)
                        .show(ui, |ui| {
                            ui.add(
                                egui::TextEdit::multiline(&mut s.raw_response.as_str())
                                    .font(egui::TextStyle::Monospace)
                                    .desired_width(f32::INFINITY)
                                    .interactive(false),
                            );
                        });
                });
        }
    });
}

fn conversation_dialog() -> rfd::FileDialog {
    rfd::FileDialog::new()
        .add_filter("Conversation", &["txt"])
        .add_filter("Archive", &["tgz", "gz"])
}
