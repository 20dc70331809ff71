/// Sound engine: procedural chiptune effects via rodio.
///
/// Every effect is a short note sequence rendered to an in-memory WAV
/// buffer at startup. Playback is fire-and-forget through a detached Sink.
///
/// Without the "sound" feature the stub SoundEngine does nothing. With it,
/// `SoundEngine::new` returns None when no output device exists and the
/// game runs silent.

use crate::sim::event::GameEvent;

/// The effects the game can play.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Pickup,
    Door,
    Hit,
    Level,
    Escape,
}

impl Sfx {
    pub const ALL: [Sfx; 5] = [Sfx::Pickup, Sfx::Door, Sfx::Hit, Sfx::Level, Sfx::Escape];

    /// Effect for a simulation event, if it has one.
    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::ItemCollected { .. } => Some(Sfx::Pickup),
            GameEvent::DoorAppeared { .. } => Some(Sfx::Door),
            GameEvent::HitBadItem => Some(Sfx::Hit),
            GameEvent::LevelEntered { .. } => Some(Sfx::Level),
            GameEvent::Escaped => Some(Sfx::Escape),
            GameEvent::LevelReset => None,
        }
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;

    #[derive(Clone, Copy)]
    enum Wave {
        /// Sine plus a third harmonic, a soft square.
        Chip,
        Sine,
        /// Tone mixed with LCG noise.
        Crunch,
    }

    /// One note: frequency sweep from `from` to `to` Hz over `secs`.
    #[derive(Clone, Copy)]
    struct Note {
        from: f32,
        to: f32,
        secs: f32,
        wave: Wave,
    }

    const fn note(hz: f32, secs: f32, wave: Wave) -> Note {
        Note { from: hz, to: hz, secs, wave }
    }

    // C6 E6 G6
    const PICKUP: &[Note] = &[
        note(1047.0, 0.04, Wave::Chip),
        note(1319.0, 0.04, Wave::Chip),
        note(1568.0, 0.05, Wave::Chip),
    ];
    // G5 C6, held
    const DOOR: &[Note] = &[
        note(784.0, 0.08, Wave::Sine),
        note(1047.0, 0.22, Wave::Sine),
    ];
    const HIT: &[Note] = &[
        Note { from: 520.0, to: 90.0, secs: 0.30, wave: Wave::Crunch },
    ];
    // C5 E5 G5
    const LEVEL: &[Note] = &[
        note(523.0, 0.09, Wave::Chip),
        note(659.0, 0.09, Wave::Chip),
        note(784.0, 0.16, Wave::Chip),
    ];
    // C5 E5 G5 C6, last one long
    const ESCAPE: &[Note] = &[
        note(523.0, 0.10, Wave::Chip),
        note(659.0, 0.10, Wave::Chip),
        note(784.0, 0.10, Wave::Chip),
        note(1047.0, 0.35, Wave::Sine),
    ];

    fn score(sfx: Sfx) -> &'static [Note] {
        match sfx {
            Sfx::Pickup => PICKUP,
            Sfx::Door => DOOR,
            Sfx::Hit => HIT,
            Sfx::Level => LEVEL,
            Sfx::Escape => ESCAPE,
        }
    }

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        /// WAV buffers indexed like `Sfx::ALL`.
        buffers: Vec<Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };
            let buffers = Sfx::ALL
                .iter()
                .map(|&sfx| Arc::new(make_wav(&render(score(sfx)))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let idx = sfx as usize;
            let buf = match self.buffers.get(idx) {
                Some(b) => b,
                None => return,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Synth: note sequences → mono f32 samples
    // ════════════════════════════════════════════════════════════

    fn render(notes: &[Note]) -> Vec<f32> {
        let mut samples = Vec::new();
        let mut noise: u32 = 0x2545_f491;
        for n in notes {
            let len = (SAMPLE_RATE as f32 * n.secs) as usize;
            let mut phase = 0.0_f32;
            for i in 0..len {
                let t = i as f32 / len as f32;
                let freq = n.from + (n.to - n.from) * t;
                phase += freq / SAMPLE_RATE as f32;
                let s = (phase * TAU).sin();
                let wave = match n.wave {
                    Wave::Sine => s,
                    Wave::Chip => s * 0.7 + (phase * 3.0 * TAU).sin() * 0.3,
                    Wave::Crunch => {
                        noise = noise.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                        let white = (noise >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                        s * 0.5 + white * 0.5
                    }
                };
                let env = (1.0 - t).powf(0.7);
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit PCM mono
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let channels: u16 = 1;
        let bits: u16 = 16;
        let byte_rate = SAMPLE_RATE * u32::from(channels) * u32::from(bits) / 8;
        let block_align = channels * bits / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn every_effect_renders_audible_bounded_samples() {
            for sfx in Sfx::ALL {
                let s = render(score(sfx));
                assert!(s.len() > SAMPLE_RATE as usize / 20, "{:?} too short", sfx);
                assert!(s.iter().all(|v| v.abs() <= 1.0), "{:?} clips", sfx);
                assert!(s.iter().any(|v| v.abs() > 0.05), "{:?} silent", sfx);
            }
        }

        #[test]
        fn wav_header_matches_payload() {
            let wav = make_wav(&[0.0, 0.5, -0.5]);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + 6);
            assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 6);
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API, no-ops when the sound feature is off
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
