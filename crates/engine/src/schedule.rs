use std::time::{Duration, Instant};

/// Multiplier from wall-clock seconds to shader-clock seconds, before the
/// user speed factor. Part of the scene's tuned feel.
const TIME_SCALE: f32 = 5.0;

/// Clamp on a single frame delta so a debugger stop or suspend does not jump
/// the animation.
const MAX_FRAME_DT: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No frame produced yet.
    Ready,
    Running,
    Paused,
}

/// Timing handed to the frame that is about to render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Wall-clock seconds since the previous frame. Zero on the first frame.
    pub dt: f32,
    /// Accumulated shader-clock time.
    pub time: f32,
}

/// Drives the per-frame clock: wall time in, shader time and dt out.
///
/// All methods take an explicit `now` so tests control time directly.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    state: SchedulerState,
    last_tick: Option<Instant>,
    time: f32,
    frames_since_fps_update: u32,
    last_fps_update: Option<Instant>,
    fps: f32,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Ready,
            last_tick: None,
            time: 0.0,
            frames_since_fps_update: 0,
            last_fps_update: None,
            fps: 0.0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Rolling frames-per-second, updated once a second.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Pauses or resumes the clock. Resuming re-anchors the tick instant so
    /// the pause span never leaks into the next frame's dt.
    pub fn set_paused(&mut self, paused: bool, now: Instant) {
        match (self.state, paused) {
            (SchedulerState::Running, true) => {
                self.state = SchedulerState::Paused;
            }
            (SchedulerState::Paused, false) => {
                self.state = SchedulerState::Running;
                self.last_tick = Some(now);
            }
            _ => {}
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state == SchedulerState::Paused
    }

    /// Starts a frame. Returns `None` while paused: no tick, no time motion,
    /// and the caller skips integration entirely.
    pub fn begin_frame(&mut self, now: Instant, speed: f32) -> Option<FrameTick> {
        if self.state == SchedulerState::Paused {
            return None;
        }

        let dt = match self.last_tick {
            Some(last) => now
                .saturating_duration_since(last)
                .as_secs_f32()
                .min(MAX_FRAME_DT),
            None => 0.0,
        };
        self.last_tick = Some(now);
        self.state = SchedulerState::Running;

        self.time += dt * speed * TIME_SCALE;
        self.update_fps(now);

        Some(FrameTick {
            dt,
            time: self.time,
        })
    }

    fn update_fps(&mut self, now: Instant) {
        self.frames_since_fps_update += 1;
        let anchor = *self.last_fps_update.get_or_insert(now);
        let elapsed = now.saturating_duration_since(anchor);
        if elapsed >= Duration::from_secs(1) {
            self.fps = self.frames_since_fps_update as f32 / elapsed.as_secs_f32();
            self.frames_since_fps_update = 0;
            self.last_fps_update = Some(now);
        }
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: Duration = Duration::from_millis(16);

    #[test]
    fn first_frame_has_zero_dt() {
        let mut scheduler = FrameScheduler::new();
        assert_eq!(scheduler.state(), SchedulerState::Ready);

        let tick = scheduler.begin_frame(Instant::now(), 1.0).unwrap();
        assert_eq!(tick.dt, 0.0);
        assert_eq!(tick.time, 0.0);
        assert_eq!(scheduler.state(), SchedulerState::Running);
    }

    #[test]
    fn time_advances_by_dt_speed_and_scale() {
        let mut scheduler = FrameScheduler::new();
        let start = Instant::now();
        scheduler.begin_frame(start, 0.5).unwrap();

        let tick = scheduler.begin_frame(start + DT, 0.5).unwrap();
        let expected = tick.dt * 0.5 * TIME_SCALE;
        assert!((tick.time - expected).abs() < 1.0e-6);
    }

    #[test]
    fn pause_freezes_time_and_skips_frames() {
        let mut scheduler = FrameScheduler::new();
        let start = Instant::now();
        scheduler.begin_frame(start, 1.0).unwrap();
        scheduler.begin_frame(start + DT, 1.0).unwrap();
        let frozen = scheduler.time();

        scheduler.set_paused(true, start + 2 * DT);
        assert!(scheduler.begin_frame(start + 3 * DT, 1.0).is_none());
        assert!(scheduler.begin_frame(start + 10 * DT, 1.0).is_none());
        assert_eq!(scheduler.time(), frozen);
    }

    #[test]
    fn resume_excludes_the_pause_span() {
        let mut scheduler = FrameScheduler::new();
        let start = Instant::now();
        scheduler.begin_frame(start, 1.0).unwrap();
        scheduler.begin_frame(start + DT, 1.0).unwrap();
        let frozen = scheduler.time();

        scheduler.set_paused(true, start + DT);
        // A long pause.
        let resume_at = start + Duration::from_secs(30);
        scheduler.set_paused(false, resume_at);

        let tick = scheduler.begin_frame(resume_at + DT, 1.0).unwrap();
        assert!((tick.dt - DT.as_secs_f32()).abs() < 1.0e-4);
        let expected = frozen + tick.dt * 1.0 * TIME_SCALE;
        assert!((tick.time - expected).abs() < 1.0e-5);
    }

    #[test]
    fn long_stalls_are_clamped() {
        let mut scheduler = FrameScheduler::new();
        let start = Instant::now();
        scheduler.begin_frame(start, 1.0).unwrap();

        let tick = scheduler
            .begin_frame(start + Duration::from_secs(10), 1.0)
            .unwrap();
        assert_eq!(tick.dt, 0.25);
    }

    #[test]
    fn fps_reflects_a_steady_cadence() {
        let mut scheduler = FrameScheduler::new();
        let start = Instant::now();
        let step = Duration::from_millis(10);
        for i in 0..=101u32 {
            scheduler.begin_frame(start + i * step, 1.0);
        }
        assert!((scheduler.fps() - 100.0).abs() < 2.0, "fps {}", scheduler.fps());
    }
}
