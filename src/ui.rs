use crate::about;
use crate::dispatch::{Action, Session};
use crate::driver::{LuciDriver, Pin, LUCI_OK};
use crate::state::State;
use crate::{LuciControl, INITIAL_WIDTH, PROGRAM_TITLE};
use eframe::egui::{self, Color32, Context, ScrollArea, Ui};
use std::time::Instant;

const FIELD_WIDTH: f32 = 48.0;

// Main eframe application loop
impl<D: LuciDriver> eframe::App for LuciControl<D> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Keep frames coming so the watcher gets polled without input
        if let Some(interval) = self.watcher.interval() {
            ctx.request_repaint_after(interval);
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            draw_status_bar(&self.session, ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.state {
            State::Initialising => {
                ui.centered_and_justified(|ui| {
                    ui.label("Initialising...");
                });
                self.init();
            }
            State::About => {
                draw_about_screen(self, ui);
            }
            State::Running => {
                self.session
                    .poll_device_change(&mut self.watcher, Instant::now());
                draw_running_state(self, ui, ctx);
            }
        });
    }
}

// --- UI Drawing Functions ---

pub(crate) fn draw_about_screen<D: LuciDriver>(app: &mut LuciControl<D>, ui: &mut Ui) {
    ui.set_width(INITIAL_WIDTH);
    ui.vertical_centered(|ui| {
        ui.heading(format!("About {}", PROGRAM_TITLE));
        ui.separator();
        for line in about::about() {
            ui.label(line);
        }
        ui.separator();
        if ui.button("OK").clicked() {
            app.state = State::Running;
        }
    });
}

pub(crate) fn draw_running_state<D: LuciDriver>(
    app: &mut LuciControl<D>,
    ui: &mut Ui,
    ctx: &Context,
) {
    draw_device_list(&mut app.session, ui);
    ui.separator();

    // Buttons only record what was pressed, the session runs it afterwards
    let mut action = None;
    draw_id_section(&mut app.session, ui, &mut action);
    ui.separator();
    draw_outputs_section(&mut app.session, ui, &mut action);
    ui.separator();
    draw_pins_section(&app.session, ui, &mut action);
    ui.separator();

    ui.horizontal(|ui| {
        if ui.button("LED on").clicked() {
            action = Some(Action::LedOn);
        }
        if ui.button("LED off").clicked() {
            action = Some(Action::LedOff);
        }
        if ui.button("Update firmware").clicked() {
            action = Some(Action::FirmwareUpdate);
        }
        ui.add_space(20.0);
        if ui.button("Refresh").clicked() {
            log::info!("Refreshing device list manually.");
            app.session.on_device_change();
        }
        if ui.button("About").clicked() {
            app.state = State::About;
        }
        if ui.button("Exit").clicked() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    });

    if let Some(action) = action {
        app.session.handle(action);
    }
}

fn draw_device_list<D: LuciDriver>(session: &mut Session<D>, ui: &mut Ui) {
    ui.heading("Interfaces");
    let devices = session.devices();
    let lines = devices.lines();
    let selected = devices.selected_position();
    let has_devices = devices.device_count() > 0;

    let mut clicked = None;
    ScrollArea::vertical()
        .max_height(90.0)
        .auto_shrink([false, true])
        .show(ui, |ui| {
            if !has_devices {
                // Sentinel line, nothing to select
                ui.label(egui::RichText::new(&lines[0]).color(Color32::GRAY));
                return;
            }
            for (position, line) in lines.iter().enumerate() {
                if ui
                    .selectable_label(selected == Some(position), line)
                    .clicked()
                    && selected != Some(position)
                {
                    clicked = Some(position);
                }
            }
        });

    if let Some(position) = clicked {
        session.on_device_list_position_changed(position);
    }
}

fn draw_id_section<D: LuciDriver>(
    session: &mut Session<D>,
    ui: &mut Ui,
    action: &mut Option<Action>,
) {
    ui.horizontal(|ui| {
        ui.label("Adapter ID:");
        ui.add(
            egui::TextEdit::singleline(session.id_text_mut())
                .desired_width(FIELD_WIDTH)
                .char_limit(5),
        );
        if ui.button("Read ID").clicked() {
            *action = Some(Action::ReadId);
        }
        if ui.button("Write ID").clicked() {
            *action = Some(Action::WriteId);
        }
    });
}

fn draw_outputs_section<D: LuciDriver>(
    session: &mut Session<D>,
    ui: &mut Ui,
    action: &mut Option<Action>,
) {
    ui.heading("Outputs");
    let mut changed = false;
    {
        let outputs = session.outputs_mut();
        changed |= draw_bank(ui, "High:", &mut outputs.high, 8);
        changed |= draw_bank(ui, "Low:", &mut outputs.low, 0);
    }
    ui.horizontal(|ui| {
        ui.label("Port high:");
        readonly_field(ui, &session.fields().port_high);
        ui.label("Port low:");
        readonly_field(ui, &session.fields().port_low);
    });
    if changed {
        *action = Some(Action::WriteOutputs);
    }
}

/// Draws one bank of eight toggles, most significant bit first.
/// Returns true when any toggle changed.
fn draw_bank(ui: &mut Ui, label: &str, bank: &mut [bool; 8], first_output: usize) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label(label);
        for bit in (0..8).rev() {
            let text = format!("{}", first_output + bit);
            changed |= ui.checkbox(&mut bank[bit], text).changed();
        }
    });
    changed
}

fn draw_pins_section<D: LuciDriver>(
    session: &Session<D>,
    ui: &mut Ui,
    action: &mut Option<Action>,
) {
    ui.horizontal(|ui| {
        for pin in Pin::ALL {
            if ui.button(format!("Test {}", pin)).clicked() {
                *action = Some(Action::TestPin(pin));
            }
            readonly_field(ui, session.fields().pin(pin));
            ui.add_space(10.0);
        }
    });
}

fn readonly_field(ui: &mut Ui, text: &str) {
    let mut text = text;
    ui.add(egui::TextEdit::singleline(&mut text).desired_width(FIELD_WIDTH));
}

fn draw_status_bar<D: LuciDriver>(session: &Session<D>, ui: &mut Ui) {
    ui.horizontal(|ui| {
        let devices = session.devices();
        ui.label(format!(
            "Interfaces: {}   Selected: {}",
            devices.device_count(),
            devices.selected_index()
        ));
        ui.separator();
        match session.last_call() {
            Some(call) if call.code == LUCI_OK => {
                ui.label(format!("{} {}: OK", call.at.format("%H:%M:%S"), call.action));
            }
            Some(call) => {
                ui.colored_label(
                    Color32::RED,
                    format!(
                        "{} {}: failed (status {})",
                        call.at.format("%H:%M:%S"),
                        call.action,
                        call.code
                    ),
                );
            }
            None => {
                ui.label("Ready");
            }
        }
    });
}
