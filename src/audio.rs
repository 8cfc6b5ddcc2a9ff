//! Web Audio feedback tones
//!
//! Every effect is synthesized from oscillators; there are no sound files.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::game::Feedback;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Laser fired
    Shot,
    /// Correct asteroid destroyed
    CorrectHit,
    /// Wrong asteroid destroyed
    WrongHit,
    /// Correct asteroid got past
    Missed,
    GameOver,
}

impl From<Feedback> for SoundEffect {
    fn from(feedback: Feedback) -> Self {
        match feedback {
            Feedback::Shot => SoundEffect::Shot,
            Feedback::CorrectHit => SoundEffect::CorrectHit,
            Feedback::WrongHit => SoundEffect::WrongHit,
            Feedback::Missed => SoundEffect::Missed,
            Feedback::GameOver => SoundEffect::GameOver,
        }
    }
}

/// One oscillator note with an exponential fade
#[derive(Debug, Clone, Copy)]
struct Tone {
    freq: f32,
    /// Frequency reached at the end of the note, if it sweeps
    sweep_to: Option<f32>,
    wave: OscillatorType,
    gain: f32,
    delay: f64,
    length: f64,
}

impl Tone {
    fn new(freq: f32, wave: OscillatorType, gain: f32, length: f64) -> Self {
        Self {
            freq,
            sweep_to: None,
            wave,
            gain,
            delay: 0.0,
            length,
        }
    }

    fn sweep(mut self, to: f32) -> Self {
        self.sweep_to = Some(to);
        self
    }

    fn after(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }
}

pub struct AudioManager {
    ctx: Option<AudioContext>,
    volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // Fails outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("AudioContext unavailable, sound disabled");
        }
        Self {
            ctx,
            volume: 0.8,
            muted: false,
        }
    }

    /// Browsers keep the context suspended until a user gesture
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn play(&self, effect: SoundEffect) {
        if self.muted || self.volume <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        use OscillatorType::{Sawtooth, Sine, Square, Triangle};
        let tones: Vec<Tone> = match effect {
            SoundEffect::Shot => vec![Tone::new(900.0, Square, 0.12, 0.08).sweep(300.0)],
            SoundEffect::CorrectHit => vec![
                Tone::new(660.0, Triangle, 0.3, 0.12),
                Tone::new(880.0, Triangle, 0.3, 0.18).after(0.08),
            ],
            SoundEffect::WrongHit => vec![Tone::new(220.0, Sawtooth, 0.25, 0.3).sweep(110.0)],
            SoundEffect::Missed => vec![Tone::new(330.0, Sine, 0.3, 0.35).sweep(165.0)],
            SoundEffect::GameOver => [400.0, 350.0, 300.0, 200.0]
                .iter()
                .enumerate()
                .map(|(i, &freq)| Tone::new(freq, Sine, 0.3, 0.4).after(i as f64 * 0.2))
                .collect(),
        };

        for tone in tones {
            self.play_tone(ctx, tone);
        }
    }

    fn create_osc(&self, ctx: &AudioContext, tone: &Tone) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(tone.wave);
        osc.frequency().set_value(tone.freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    fn play_tone(&self, ctx: &AudioContext, tone: Tone) {
        let Some((osc, gain)) = self.create_osc(ctx, &tone) else {
            return;
        };
        let t = ctx.current_time() + tone.delay;
        let end = t + tone.length;

        gain.gain().set_value_at_time(self.volume * tone.gain, t).ok();
        gain.gain().exponential_ramp_to_value_at_time(0.01, end).ok();
        if let Some(to) = tone.sweep_to {
            osc.frequency().set_value_at_time(tone.freq, t).ok();
            osc.frequency().exponential_ramp_to_value_at_time(to, end).ok();
        }

        osc.start_with_when(t).ok();
        osc.stop_with_when(end + 0.05).ok();
    }
}
