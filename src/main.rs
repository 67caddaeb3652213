#[cfg(feature = "gui")]
use eframe::egui;

#[cfg(feature = "gui")]
use std::time::Instant;

#[cfg(feature = "gui")]
use tracing::{info, warn};

#[cfg(feature = "gui")]
use beatgrid::{
    midi::drum_note, midi_note_name, AudioOutput, Config, FrameTimer, Instrument,
    MidiOutputDevice, SampleBank, Sequencer, StepGrid, Tempo, Tick, STEPS,
};

#[cfg(feature = "gui")]
fn main() -> Result<(), eframe::Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    info!(sample_dir = ?config.sample_dir(), bpm = config.initial_bpm, "Starting");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 420.0])
            .with_title("BEATGRID - Drum Sequencer"),
        ..Default::default()
    };

    eframe::run_native(
        "BEATGRID",
        options,
        Box::new(move |_cc| Ok(Box::new(DrumMachineApp::new(&config)))),
    )
}

#[cfg(not(feature = "gui"))]
fn main() {
    eprintln!("This binary requires the 'gui' feature to be enabled");
    std::process::exit(1);
}

#[cfg(feature = "gui")]
struct DrumMachineApp {
    sequencer: Sequencer,
    grid: StepGrid,
    bpm: f32,
    timer: FrameTimer,
    audio_output: AudioOutput,
    midi_output: MidiOutputDevice,

    // UI state
    available_midi_ports: Vec<String>,
    selected_port: Option<usize>,
}

#[cfg(feature = "gui")]
impl DrumMachineApp {
    fn new(config: &Config) -> Self {
        let bank = SampleBank::preload(config);

        Self {
            sequencer: Sequencer::new(),
            grid: StepGrid::new(),
            bpm: Tempo::new(config.initial_bpm).bpm(),
            timer: FrameTimer::new(),
            audio_output: AudioOutput::new(bank),
            midi_output: MidiOutputDevice::new(),
            available_midi_ports: MidiOutputDevice::available_ports(),
            selected_port: None,
        }
    }

    fn tempo(&self) -> Tempo {
        Tempo::new(self.bpm)
    }

    fn start_playback(&mut self) {
        let tempo = self.tempo();
        let tick = self
            .sequencer
            .start(&mut self.timer, &self.grid, tempo, &mut self.audio_output);
        self.mirror_to_midi(tick);
    }

    fn stop_playback(&mut self) {
        self.sequencer.stop();
    }

    fn run_due_tick(&mut self) {
        if !self.timer.poll(Instant::now()) {
            return;
        }
        let tempo = self.tempo();
        let tick = self
            .sequencer
            .tick(&mut self.timer, &self.grid, tempo, &mut self.audio_output);
        self.mirror_to_midi(tick);
    }

    fn mirror_to_midi(&mut self, tick: Option<Tick>) {
        let Some(tick) = tick else {
            return;
        };
        for instrument in tick.triggered {
            if let Err(e) = self.midi_output.send_hit(instrument) {
                warn!(err = %e, "Failed to send MIDI hit");
            }
        }
    }
}

#[cfg(feature = "gui")]
fn instrument_color(instrument: Instrument) -> egui::Color32 {
    match instrument {
        Instrument::Kick => egui::Color32::from_rgb(0, 200, 0),
        Instrument::Snare => egui::Color32::from_rgb(0, 200, 200),
        Instrument::Hat => egui::Color32::from_rgb(0, 0, 220),
    }
}

#[cfg(feature = "gui")]
impl eframe::App for DrumMachineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.run_due_tick();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("BEATGRID - Drum Sequencer");
            ui.add_space(10.0);

            // Transport controls
            ui.horizontal(|ui| {
                if ui
                    .add(egui::Button::new("▶ Start").min_size(egui::vec2(120.0, 40.0)))
                    .clicked()
                {
                    self.start_playback();
                }
                if ui
                    .add(egui::Button::new("■ Stop").min_size(egui::vec2(120.0, 40.0)))
                    .clicked()
                {
                    self.stop_playback();
                }
                if ui.button("Clear").clicked() {
                    self.grid.clear();
                }
            });

            ui.add_space(10.0);

            // Step grid, one row per instrument
            for instrument in Instrument::ALL {
                ui.horizontal(|ui| {
                    let label = format!(
                        "{} ({})",
                        instrument.label(),
                        midi_note_name(drum_note(instrument))
                    );
                    ui.add_sized([60.0, 30.0], egui::Label::new(label));

                    for step in 0..STEPS {
                        let enabled = self.grid.is_on(instrument, step);
                        let fill = if enabled {
                            instrument_color(instrument)
                        } else {
                            egui::Color32::from_rgb(40, 40, 40)
                        };

                        let button = egui::Button::new("")
                            .min_size(egui::vec2(40.0, 30.0))
                            .fill(fill);

                        if ui.add(button).clicked() {
                            self.grid.toggle(instrument, step);
                        }
                    }
                });
            }

            // Beat row
            ui.horizontal(|ui| {
                ui.add_space(68.0);
                for &lit in self.sequencer.highlights() {
                    let color = if lit {
                        egui::Color32::from_gray(128)
                    } else {
                        egui::Color32::WHITE
                    };
                    let (rect, _) =
                        ui.allocate_exact_size(egui::vec2(40.0, 14.0), egui::Sense::hover());
                    ui.painter().rect_filled(rect, 2.0, color);
                }
            });

            ui.add_space(10.0);

            ui.horizontal(|ui| {
                ui.label("Tempo:");
                ui.add(
                    egui::Slider::new(&mut self.bpm, Tempo::MIN_BPM..=Tempo::MAX_BPM)
                        .show_value(false),
                );
                ui.label(format!("{} BPM", self.bpm as u32));
            });

            ui.add_space(10.0);

            // MIDI Port Selection
            let mut selected_port_changed = None;
            ui.horizontal(|ui| {
                ui.label("MIDI Output:");
                if self.available_midi_ports.is_empty() {
                    ui.label("No MIDI ports available");
                } else {
                    egui::ComboBox::from_label("")
                        .selected_text(
                            self.selected_port
                                .map(|i| self.available_midi_ports[i].as_str())
                                .unwrap_or("Select port..."),
                        )
                        .show_ui(ui, |ui| {
                            for (i, port_name) in self.available_midi_ports.iter().enumerate() {
                                if ui
                                    .selectable_label(self.selected_port == Some(i), port_name)
                                    .clicked()
                                {
                                    selected_port_changed = Some(i);
                                }
                            }
                        });
                }
            });

            if let Some(port_idx) = selected_port_changed {
                match self.midi_output.connect(port_idx) {
                    Ok(()) => self.selected_port = Some(port_idx),
                    Err(e) => warn!(err = %e, "MIDI connect failed"),
                }
            }

            ui.separator();
            for instrument in Instrument::ALL {
                if !self.audio_output.bank().is_loaded(instrument) {
                    ui.colored_label(
                        egui::Color32::YELLOW,
                        format!("⚠ No sample for {} - it will stay silent", instrument.label()),
                    );
                }
            }
        });

        if let Some(wait) = self.timer.time_until(Instant::now()) {
            ctx.request_repaint_after(wait);
        }
    }
}
