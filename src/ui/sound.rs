/// Sound engine: procedural sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time and
/// played fire-and-forget through a detached rodio `Sink`.
///
/// Build without the "sound" feature to disable audio entirely
/// (the stub `SoundEngine` does nothing).

use crate::sim::event::GameEvent;

/// One-shot effects, one per buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Kick,
    Whiff,
    Grab,
    Climb,
    Fall,
    Bump,
}

impl Sfx {
    pub const ALL: [Sfx; 6] = [Sfx::Kick, Sfx::Whiff, Sfx::Grab, Sfx::Climb, Sfx::Fall, Sfx::Bump];

    /// Effect for a simulation event, if it has one.
    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::KickStarted => Some(Sfx::Kick),
            GameEvent::KickWhiffed => Some(Sfx::Whiff),
            GameEvent::BootGrabbed { .. } => Some(Sfx::Grab),
            GameEvent::ClimbStarted { .. } => Some(Sfx::Climb),
            GameEvent::FallStarted { .. } => Some(Sfx::Fall),
            GameEvent::WallBumped => Some(Sfx::Bump),
            GameEvent::GrabStarted { .. } | GameEvent::KickFinished => None,
        }
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use tracing::warn;

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        /// Indexed by `Sfx as usize`.
        buffers: Vec<Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "no audio output; sound disabled");
                    return None;
                }
            };
            let buffers = Sfx::ALL.iter().map(|&s| Arc::new(make_wav(&generate(s)))).collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let buf = &self.buffers[sfx as usize];
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }

    fn generate(sfx: Sfx) -> Vec<f32> {
        match sfx {
            // short thump with a noisy attack
            Sfx::Kick => mix(&sweep(220.0, 90.0, 0.08, 0.35), &noise(0.03, 0.25, 7)),
            // airy hiss, falling off
            Sfx::Whiff => noise(0.14, 0.15, 99),
            // bright rising arpeggio
            Sfx::Grab => arpeggio(&[784.0, 988.0, 1175.0, 1568.0], 0.05, 0.25),
            // two quick upward hops
            Sfx::Climb => {
                let mut s = sweep(300.0, 600.0, 0.09, 0.25);
                s.extend(sweep(450.0, 900.0, 0.09, 0.25));
                s
            }
            // whistle down
            Sfx::Fall => sweep(700.0, 200.0, 0.22, 0.25),
            Sfx::Bump => sweep(120.0, 80.0, 0.04, 0.3),
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce mono f32 samples
    // ════════════════════════════════════════════════════════════

    fn sample_count(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Sine glide from `f0` to `f1` with a linear fade.
    fn sweep(f0: f32, f1: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = sample_count(duration);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (f0 + (f1 - f0) * t) / SAMPLE_RATE as f32;
                (phase * TAU).sin() * (1.0 - t) * volume
            })
            .collect()
    }

    /// LCG white noise with a steep fade.
    fn noise(duration: f32, volume: f32, seed: u32) -> Vec<f32> {
        let n = sample_count(duration);
        let mut rng = seed;
        (0..n)
            .map(|i| {
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let v = (rng >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                v * (1.0 - i as f32 / n as f32).powi(2) * volume
            })
            .collect()
    }

    /// Notes back to back, each a sine plus a third harmonic.
    fn arpeggio(notes: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let n = sample_count(note_dur);
        notes.iter()
            .flat_map(|&freq| {
                (0..n).map(move |i| {
                    let t = i as f32 / SAMPLE_RATE as f32;
                    let env = 1.0 - (i as f32 / n as f32).sqrt();
                    let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 3.0 * TAU).sin() * 0.3;
                    wave * env * volume
                })
            })
            .collect()
    }

    /// Sum two buffers, padding the shorter with silence.
    fn mix(a: &[f32], b: &[f32]) -> Vec<f32> {
        (0..a.len().max(b.len()))
            .map(|i| a.get(i).copied().unwrap_or(0.0) + b.get(i).copied().unwrap_or(0.0))
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit mono PCM
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let block_align = CHANNELS * BITS / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_size = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&CHANNELS.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&BITS.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

/// Play whatever the step's events call for.
pub fn play_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let Some(engine) = sound else { return };
    for sfx in events.iter().filter_map(Sfx::for_event) {
        engine.play(sfx);
    }
}
