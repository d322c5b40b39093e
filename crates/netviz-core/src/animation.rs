use crate::architecture::{NetworkGraph, NeuronKey};
use crate::config::ConfigError;
use crate::draw::{self, DrawOptions};
use crate::geometry::Point;
use crate::style::Style;
use crate::surface::{GradientStop, Paint, RadialGradient, Surface};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Chance that a connection spawns a particle on each spawn tick.
    pub spawn_probability: f64,
    pub spawn_interval_ms: u64,
    /// Progress added per frame; each particle draws its speed from this range.
    pub min_speed: f64,
    pub max_speed: f64,
    /// Frame period used by the simulated scheduler.
    pub frame_interval_ms: u64,
    pub seed: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            spawn_probability: 0.2,
            spawn_interval_ms: 100,
            min_speed: 0.01,
            max_speed: 0.03,
            frame_interval_ms: 16,
            seed: 42,
        }
    }
}

impl AnimationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.spawn_probability) {
            return Err(ConfigError::InvalidProbability {
                field: "spawn_probability",
                value: self.spawn_probability,
            });
        }
        if !(self.min_speed > 0.0 && self.min_speed <= self.max_speed && self.max_speed <= 1.0) {
            return Err(ConfigError::InvalidRange {
                field: "particle_speed",
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        if self.spawn_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "spawn_interval_ms",
            });
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "frame_interval_ms",
            });
        }
        Ok(())
    }

    /// Pull every field into the range `validate` accepts. A valid config
    /// comes back unchanged; non-finite values fall back to the defaults.
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        let min = finite_or(self.min_speed, defaults.min_speed).clamp(f64::MIN_POSITIVE, 1.0);
        let max = finite_or(self.max_speed, defaults.max_speed).clamp(f64::MIN_POSITIVE, 1.0);
        Self {
            spawn_probability: finite_or(self.spawn_probability, 0.0).clamp(0.0, 1.0),
            spawn_interval_ms: self.spawn_interval_ms.max(1),
            min_speed: min.min(max),
            max_speed: min.max(max),
            frame_interval_ms: self.frame_interval_ms.max(1),
            seed: self.seed,
        }
    }
}

/// Marker travelling along one connection. Coordinates are re-resolved from
/// the neuron keys every frame so a relayout moves particles with it.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub source: NeuronKey,
    pub target: NeuronKey,
    pub position: Point,
    pub target_position: Point,
    /// In [0, 1); the particle is dropped once it reaches 1.
    pub progress: f64,
    pub speed: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Host-provided timing: one-shot frame requests and a periodic timer.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
    fn start_timer(&mut self, period: Duration) -> TimerHandle;
    fn cancel_timer(&mut self, handle: TimerHandle);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationState {
    Idle,
    Running {
        frame: FrameHandle,
        timer: TimerHandle,
    },
}

/// Owns particle state and the scheduler handles. Callbacks receive the
/// current graph explicitly and are ignored if their handle is stale.
pub struct AnimationController<S: FrameScheduler> {
    scheduler: S,
    config: AnimationConfig,
    state: AnimationState,
    particles: Vec<Particle>,
    rng: ChaCha12Rng,
}

impl<S: FrameScheduler> AnimationController<S> {
    /// Out-of-range settings are clamped (see [`AnimationConfig::clamped`]);
    /// use [`Self::try_new`] to reject them instead.
    pub fn new(scheduler: S, config: AnimationConfig) -> Self {
        let config = config.clamped();
        let rng = ChaCha12Rng::seed_from_u64(config.seed);
        Self {
            scheduler,
            config,
            state: AnimationState::Idle,
            particles: Vec::new(),
            rng,
        }
    }

    pub fn try_new(scheduler: S, config: AnimationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(scheduler, config))
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, AnimationState::Running { .. })
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// `idle → running`. Returns `false` if already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        let frame = self.scheduler.request_frame();
        let timer = self
            .scheduler
            .start_timer(Duration::from_millis(self.config.spawn_interval_ms));
        self.state = AnimationState::Running { frame, timer };
        debug!("particle animation started");
        true
    }

    /// `running → idle`: cancel handles, drop particles, redraw without them.
    pub fn stop<Sf: Surface + ?Sized>(
        &mut self,
        graph: &NetworkGraph,
        style: &Style,
        options: &DrawOptions,
        surface: &mut Sf,
    ) -> bool {
        if !self.release() {
            return false;
        }
        draw::draw_network(surface, graph, style, options);
        debug!("particle animation stopped");
        true
    }

    pub fn toggle<Sf: Surface + ?Sized>(
        &mut self,
        graph: &NetworkGraph,
        style: &Style,
        options: &DrawOptions,
        surface: &mut Sf,
    ) -> bool {
        if self.is_running() {
            self.stop(graph, style, options, surface);
        } else {
            self.start();
        }
        self.is_running()
    }

    fn release(&mut self) -> bool {
        let AnimationState::Running { frame, timer } = self.state else {
            return false;
        };
        self.scheduler.cancel_frame(frame);
        self.scheduler.cancel_timer(timer);
        self.state = AnimationState::Idle;
        self.particles.clear();
        true
    }

    /// Spawn tick. Returns how many particles were created.
    pub fn on_spawn_tick(&mut self, handle: TimerHandle, graph: &NetworkGraph) -> usize {
        match self.state {
            AnimationState::Running { timer, .. } if timer == handle => {}
            _ => return 0,
        }
        let mut spawned = 0;
        for connection in graph.connections() {
            if !self.rng.random_bool(self.config.spawn_probability) {
                continue;
            }
            let speed = self
                .rng
                .random_range(self.config.min_speed..=self.config.max_speed);
            let (Some(from), Some(to)) =
                (graph.position(connection.source), graph.position(connection.target))
            else {
                continue;
            };
            self.particles.push(Particle {
                source: connection.source,
                target: connection.target,
                position: from,
                target_position: to,
                progress: 0.0,
                speed,
            });
            spawned += 1;
        }
        spawned
    }

    /// Frame callback: advance, cull, redraw, request the next frame.
    /// Returns `false` (and draws nothing) for a stale handle.
    pub fn on_frame<Sf: Surface + ?Sized>(
        &mut self,
        handle: FrameHandle,
        graph: &NetworkGraph,
        style: &Style,
        options: &DrawOptions,
        surface: &mut Sf,
    ) -> bool {
        let timer = match self.state {
            AnimationState::Running { frame, timer } if frame == handle => timer,
            _ => return false,
        };

        self.particles.retain_mut(|p| {
            let (Some(from), Some(to)) = (graph.position(p.source), graph.position(p.target))
            else {
                return false;
            };
            p.progress += p.speed;
            if p.progress >= 1.0 {
                return false;
            }
            p.position = from.lerp(to, p.progress);
            p.target_position = to;
            true
        });

        draw::draw_network(surface, graph, style, options);
        draw_particles(surface, &self.particles, style);

        let frame = self.scheduler.request_frame();
        self.state = AnimationState::Running { frame, timer };
        true
    }
}

impl<S: FrameScheduler> Drop for AnimationController<S> {
    fn drop(&mut self) {
        self.release();
    }
}

pub fn draw_particles<Sf: Surface + ?Sized>(surface: &mut Sf, particles: &[Particle], style: &Style) {
    let glow = Paint::Radial(RadialGradient::centred(vec![
        GradientStop {
            offset: 0.0,
            color: style.particle_color.with_alpha(0.6),
        },
        GradientStop {
            offset: 1.0,
            color: style.particle_color.with_alpha(0.0),
        },
    ]));
    let body = Paint::Solid(style.particle_color);
    for p in particles {
        surface.fill_circle(p.position, style.particle_radius * 3.0, &glow);
        surface.fill_circle(p.position, style.particle_radius, &body);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduledEvent {
    Frame(FrameHandle),
    Timer(TimerHandle),
}

/// Deterministic clock-driven scheduler for offline rendering and tests.
/// Periods shorter than a millisecond are raised to one.
#[derive(Clone, Debug)]
pub struct SimulatedScheduler {
    now: Duration,
    frame_interval: Duration,
    next_id: u64,
    pending_frame: Option<(FrameHandle, Duration)>,
    timers: Vec<(TimerHandle, Duration, Duration)>,
}

impl SimulatedScheduler {
    const MIN_PERIOD: Duration = Duration::from_millis(1);

    pub fn new(frame_interval: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            frame_interval: frame_interval.max(Self::MIN_PERIOD),
            next_id: 0,
            pending_frame: None,
            timers: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending_frame.map(|(h, _)| h)
    }

    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }

    fn next_handle(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Pop the earliest event due at or before `deadline`, advancing the
    /// clock to it. When nothing is due the clock moves to `deadline`.
    pub fn next_event(&mut self, deadline: Duration) -> Option<ScheduledEvent> {
        let frame_due = self.pending_frame.map(|(_, due)| due);
        let timer_due = self
            .timers
            .iter()
            .enumerate()
            .min_by_key(|(_, (_, _, due))| *due)
            .map(|(i, (_, _, due))| (i, *due));

        let take_frame = match (frame_due, timer_due) {
            (Some(f), Some((_, t))) => f <= t,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => {
                self.now = self.now.max(deadline);
                return None;
            }
        };

        if take_frame {
            let (handle, due) = self.pending_frame?;
            if due > deadline {
                self.now = self.now.max(deadline);
                return None;
            }
            self.pending_frame = None;
            self.now = due;
            Some(ScheduledEvent::Frame(handle))
        } else {
            let (i, due) = timer_due?;
            if due > deadline {
                self.now = self.now.max(deadline);
                return None;
            }
            let (handle, period, next_due) = &mut self.timers[i];
            *next_due += *period;
            self.now = due;
            Some(ScheduledEvent::Timer(*handle))
        }
    }
}

impl FrameScheduler for SimulatedScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_handle());
        self.pending_frame = Some((handle, self.now + self.frame_interval));
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending_frame.map(|(h, _)| h) == Some(handle) {
            self.pending_frame = None;
        }
    }

    fn start_timer(&mut self, period: Duration) -> TimerHandle {
        let period = period.max(Self::MIN_PERIOD);
        let handle = TimerHandle(self.next_handle());
        self.timers.push((handle, period, self.now + period));
        handle
    }

    fn cancel_timer(&mut self, handle: TimerHandle) {
        self.timers.retain(|(h, _, _)| *h != handle);
    }
}

impl AnimationController<SimulatedScheduler> {
    /// Run the simulated clock forward by `dt`, dispatching every due event.
    /// `on_frame` sees the surface after each drawn frame. Returns frames drawn.
    pub fn advance<Sf: Surface + ?Sized>(
        &mut self,
        dt: Duration,
        graph: &NetworkGraph,
        style: &Style,
        options: &DrawOptions,
        surface: &mut Sf,
        mut on_frame: impl FnMut(&Sf),
    ) -> usize {
        let deadline = self.scheduler.now() + dt;
        let mut frames = 0;
        while let Some(event) = self.scheduler.next_event(deadline) {
            match event {
                ScheduledEvent::Timer(handle) => {
                    self.on_spawn_tick(handle, graph);
                }
                ScheduledEvent::Frame(handle) => {
                    if self.on_frame(handle, graph, style, options, surface) {
                        frames += 1;
                        on_frame(surface);
                    }
                }
            }
        }
        frames
    }
}
