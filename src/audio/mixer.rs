/// Voice mixing for overlapping one-shot clips
use std::sync::Arc;

use super::loader::Sample;

/// Oldest voices are dropped past this many.
pub const MAX_VOICES: usize = 32;

const GAIN: f32 = 0.5;

/// One playing instance of a clip.
#[derive(Debug, Clone)]
struct Voice {
    sample: Arc<Sample>,
    position: f64,
}

impl Voice {
    fn is_finished(&self) -> bool {
        self.position >= self.sample.frames() as f64
    }

    /// Linear interpolation between the two frames around `position`.
    fn value(&self, channel: usize) -> f32 {
        let frame = self.position as usize;
        let frac = self.position.fract() as f32;
        let a = self.sample.value(frame, channel);
        let b = self.sample.value(frame + 1, channel);
        a + (b - a) * frac
    }
}

/// Sums active voices into interleaved output buffers.
#[derive(Debug)]
pub struct Mixer {
    voices: Vec<Voice>,
    output_rate: u32,
    channels: usize,
}

impl Mixer {
    pub fn new(output_rate: u32, channels: u16) -> Self {
        Self {
            voices: Vec::with_capacity(MAX_VOICES),
            output_rate: output_rate.max(1),
            channels: channels.max(1) as usize,
        }
    }

    pub fn trigger(&mut self, sample: Arc<Sample>) {
        if self.voices.len() >= MAX_VOICES {
            self.voices.remove(0);
        }
        self.voices.push(Voice {
            sample,
            position: 0.0,
        });
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn clear(&mut self) {
        self.voices.clear();
    }

    /// Overwrites `out` with the next block of mixed audio.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);

        let channels = self.channels;
        let output_rate = self.output_rate as f64;

        for voice in &mut self.voices {
            let step = voice.sample.sample_rate as f64 / output_rate;
            for frame in out.chunks_mut(channels) {
                if voice.is_finished() {
                    break;
                }
                for (channel, slot) in frame.iter_mut().enumerate() {
                    *slot += voice.value(channel) * GAIN;
                }
                voice.position += step;
            }
        }

        self.voices.retain(|voice| !voice.is_finished());

        for slot in out.iter_mut() {
            *slot = slot.clamp(-1.0, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(data: Vec<f32>, sample_rate: u32, channels: u16) -> Arc<Sample> {
        Arc::new(Sample {
            data,
            sample_rate,
            channels,
        })
    }

    #[test]
    fn test_silence_without_voices() {
        let mut mixer = Mixer::new(48_000, 2);
        let mut out = [1.0; 8];
        mixer.render(&mut out);
        assert_eq!(out, [0.0; 8]);
    }

    #[test]
    fn test_mono_clip_fills_every_channel() {
        let mut mixer = Mixer::new(48_000, 2);
        mixer.trigger(clip(vec![1.0, 0.5], 48_000, 1));

        let mut out = [0.0; 6];
        mixer.render(&mut out);
        assert_eq!(out, [0.5, 0.5, 0.25, 0.25, 0.0, 0.0]);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_retrigger_overlaps() {
        let mut mixer = Mixer::new(48_000, 1);
        let sample = clip(vec![0.5; 4], 48_000, 1);
        mixer.trigger(sample.clone());
        mixer.trigger(sample);

        let mut out = [0.0; 2];
        mixer.render(&mut out);
        assert_eq!(out, [0.5, 0.5]);
        assert_eq!(mixer.active_voices(), 2);
    }

    #[test]
    fn test_rate_conversion_interpolates() {
        let mut mixer = Mixer::new(48_000, 1);
        mixer.trigger(clip(vec![0.0, 1.0], 24_000, 1));

        let mut out = [0.0; 4];
        mixer.render(&mut out);
        assert_eq!(out, [0.0, 0.25, 0.5, 0.25]);
    }

    #[test]
    fn test_voice_cap_drops_oldest() {
        let mut mixer = Mixer::new(48_000, 1);
        for _ in 0..(MAX_VOICES + 4) {
            mixer.trigger(clip(vec![0.1; 16], 48_000, 1));
        }
        assert_eq!(mixer.active_voices(), MAX_VOICES);
        mixer.clear();
        assert_eq!(mixer.active_voices(), 0);
    }
}
