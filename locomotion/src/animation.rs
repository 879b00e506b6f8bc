//! Animation collaborator seam and a table-driven implementation.

use std::collections::HashMap;

/// Clip names the locomotion states play.
pub mod clips {
    pub const IDLE: &str = "idle";
    pub const RUN: &str = "run";
    pub const SPRINT: &str = "sprint";
    pub const STOP: &str = "stop";
    pub const JUMP_IDLE: &str = "jump_idle";
    pub const JUMP_RUNNING: &str = "jump_running";
    pub const FALLING: &str = "falling";
    pub const DROP_IDLE: &str = "drop_idle";
    pub const DROP_RUNNING: &str = "drop_running";
    pub const DROP_RUNNING_ROLL: &str = "drop_running_roll";
    pub const CLAP: &str = "clap";
    pub const WAVE: &str = "wave";
    pub const DANCE: &str = "dance";
    pub const SIT_DOWN: &str = "sit_down";
    pub const SITTING: &str = "sitting";
    pub const STAND_UP: &str = "stand_up";
}

/// Every clip an avatar needs. Construction fails if the player lacks one.
pub const REQUIRED_CLIPS: &[&str] = &[
    clips::IDLE,
    clips::RUN,
    clips::SPRINT,
    clips::STOP,
    clips::JUMP_IDLE,
    clips::JUMP_RUNNING,
    clips::FALLING,
    clips::DROP_IDLE,
    clips::DROP_RUNNING,
    clips::DROP_RUNNING_ROLL,
    clips::CLAP,
    clips::WAVE,
    clips::DANCE,
    clips::SIT_DOWN,
    clips::SITTING,
    clips::STAND_UP,
];

pub trait AnimationPlayer {
    /// Stop whatever is playing and start `clip`, fading in over `fade_in` seconds.
    ///
    /// Returns the clip duration, or `None` if the clip is unknown.
    fn play(&mut self, clip: &str, fade_in: f32) -> Option<f32>;

    fn is_running(&self, clip: &str) -> bool;

    fn clip_duration(&self, clip: &str) -> Option<f32>;

    fn current_clip(&self) -> Option<&str>;

    fn update(&mut self, dt: f32);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipInfo {
    pub duration: f32,
    pub looping: bool,
}

#[derive(Clone, Debug, PartialEq)]
struct Playback {
    clip: String,
    elapsed: f32,
    fade_in: f32,
}

/// Clip durations keyed by name, plus the single clip currently playing.
#[derive(Clone, Debug, Default)]
pub struct ClipLibrary {
    clips: HashMap<String, ClipInfo>,
    current: Option<Playback>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clip(mut self, name: impl Into<String>, duration: f32, looping: bool) -> Self {
        self.insert(name, duration, looping);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, duration: f32, looping: bool) {
        self.clips
            .insert(name.into(), ClipInfo { duration, looping });
    }

    /// The stock humanoid clip set.
    pub fn standard() -> Self {
        Self::new()
            .with_clip(clips::IDLE, 2.0, true)
            .with_clip(clips::RUN, 0.8, true)
            .with_clip(clips::SPRINT, 0.6, true)
            .with_clip(clips::STOP, 0.5, false)
            .with_clip(clips::JUMP_IDLE, 1.0, false)
            .with_clip(clips::JUMP_RUNNING, 0.8, false)
            .with_clip(clips::FALLING, 1.0, true)
            .with_clip(clips::DROP_IDLE, 0.6, false)
            .with_clip(clips::DROP_RUNNING, 0.6, false)
            .with_clip(clips::DROP_RUNNING_ROLL, 1.0, false)
            .with_clip(clips::CLAP, 2.0, true)
            .with_clip(clips::WAVE, 2.0, true)
            .with_clip(clips::DANCE, 4.0, true)
            .with_clip(clips::SIT_DOWN, 1.2, false)
            .with_clip(clips::SITTING, 2.0, true)
            .with_clip(clips::STAND_UP, 1.0, false)
    }

    pub fn info(&self, clip: &str) -> Option<ClipInfo> {
        self.clips.get(clip).copied()
    }

    /// Seconds since the current clip started.
    pub fn elapsed(&self) -> Option<f32> {
        self.current.as_ref().map(|p| p.elapsed)
    }

    /// Blend weight of the current clip, ramping from 0 to 1 over its fade-in.
    pub fn weight(&self) -> f32 {
        match &self.current {
            Some(p) if p.fade_in > 0.0 => (p.elapsed / p.fade_in).min(1.0),
            Some(_) => 1.0,
            None => 0.0,
        }
    }
}

impl AnimationPlayer for ClipLibrary {
    fn play(&mut self, clip: &str, fade_in: f32) -> Option<f32> {
        let Some(info) = self.info(clip) else {
            log::error!("animation clip `{clip}` not found");
            return None;
        };
        self.current = Some(Playback {
            clip: clip.to_owned(),
            elapsed: 0.0,
            fade_in: fade_in.max(0.0),
        });
        Some(info.duration)
    }

    fn is_running(&self, clip: &str) -> bool {
        let Some(p) = self.current.as_ref().filter(|p| p.clip == clip) else {
            return false;
        };
        self.info(clip)
            .is_some_and(|info| info.looping || p.elapsed < info.duration)
    }

    fn clip_duration(&self, clip: &str) -> Option<f32> {
        self.info(clip).map(|info| info.duration)
    }

    fn current_clip(&self) -> Option<&str> {
        self.current.as_ref().map(|p| p.clip.as_str())
    }

    fn update(&mut self, dt: f32) {
        if let Some(p) = self.current.as_mut() {
            p.elapsed += dt.max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_library_has_every_required_clip() {
        let library = ClipLibrary::standard();
        for clip in REQUIRED_CLIPS {
            assert!(library.clip_duration(clip).is_some(), "missing {clip}");
        }
    }

    #[test]
    fn one_shot_clip_stops_running_after_its_duration() {
        let mut library = ClipLibrary::standard();
        assert_eq!(library.play(clips::STOP, 0.1), Some(0.5));
        assert!(library.is_running(clips::STOP));
        assert!(!library.is_running(clips::IDLE));

        library.update(0.6);
        assert!(!library.is_running(clips::STOP));
        assert_eq!(library.current_clip(), Some(clips::STOP));
    }

    #[test]
    fn looping_clip_keeps_running() {
        let mut library = ClipLibrary::standard();
        library.play(clips::DANCE, 0.0);
        library.update(10.0);
        assert!(library.is_running(clips::DANCE));
        assert_eq!(library.weight(), 1.0);
    }

    #[test]
    fn unknown_clip_reports_no_duration_and_keeps_current() {
        let mut library = ClipLibrary::standard();
        library.play(clips::IDLE, 0.2);
        library.update(0.1);
        assert_eq!(library.play("backflip", 0.1), None);
        assert_eq!(library.current_clip(), Some(clips::IDLE));
        assert!((library.weight() - 0.5).abs() < 1.0e-6);
    }
}
