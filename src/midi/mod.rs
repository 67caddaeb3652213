/// MIDI output using midir - mirrors every drum hit as a General MIDI note
use midir::{MidiOutput, MidiOutputConnection};
use tracing::info;

use crate::error::MidiError;
use crate::sequencer::Instrument;

const CLIENT_NAME: &str = "BEATGRID MIDI Output";

/// General MIDI percussion lives on channel 10.
const DRUM_CHANNEL: u8 = 9;
const NOTE_ON: u8 = 0x90 | DRUM_CHANNEL;
const NOTE_OFF: u8 = 0x80 | DRUM_CHANNEL;
pub const HIT_VELOCITY: u8 = 100;

/// General MIDI drum map note for an instrument.
pub fn drum_note(instrument: Instrument) -> u8 {
    match instrument {
        Instrument::Kick => 36,
        Instrument::Snare => 38,
        Instrument::Hat => 42,
    }
}

pub fn hit_messages(instrument: Instrument) -> [[u8; 3]; 2] {
    let note = drum_note(instrument);
    [[NOTE_ON, note, HIT_VELOCITY], [NOTE_OFF, note, 0]]
}

pub struct MidiOutputDevice {
    connection: Option<MidiOutputConnection>,
}

impl MidiOutputDevice {
    pub fn new() -> Self {
        Self { connection: None }
    }

    pub fn available_ports() -> Vec<String> {
        if let Ok(midi_out) = MidiOutput::new(CLIENT_NAME) {
            midi_out
                .ports()
                .iter()
                .filter_map(|p| midi_out.port_name(p).ok())
                .collect()
        } else {
            vec![]
        }
    }

    pub fn connect(&mut self, port_index: usize) -> Result<(), MidiError> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;

        let ports = midi_out.ports();
        let port = ports
            .get(port_index)
            .ok_or(MidiError::InvalidPort(port_index))?;
        let name = midi_out.port_name(port).unwrap_or_default();

        let connection = midi_out
            .connect(port, "beatgrid")
            .map_err(|e| MidiError::Connect(e.to_string()))?;

        info!(port = %name, "Connected MIDI output");
        self.connection = Some(connection);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Sends a note-on immediately followed by its note-off. Drum voices
    /// ignore the release, so the hit rings out for its full length.
    pub fn send_hit(&mut self, instrument: Instrument) -> Result<(), MidiError> {
        if let Some(ref mut conn) = self.connection {
            for message in hit_messages(instrument) {
                conn.send(&message)?;
            }
        }
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close();
        }
    }
}

impl Default for MidiOutputDevice {
    fn default() -> Self {
        Self::new()
    }
}

pub fn midi_note_name(note: u8) -> String {
    let note_names = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
    let octave = (note / 12) as i32 - 1;
    let note_index = (note % 12) as usize;
    format!("{}{}", note_names[note_index], octave)
}
