use std::time::{Duration, Instant};

const INITIAL_PROGRESS: f64 = 5.0;
const FAST_STEP: f64 = 1.2;
const SLOW_STEP: f64 = 0.25;
const FAST_CEILING: f64 = 80.0;
const SIMULATED_CEILING: f64 = 95.0;
const COMPLETION_HOLD: Duration = Duration::from_millis(350);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    Idle,
    Loading,
    /// The real asset finished; the full bar is held briefly before the
    /// machine settles so completion is visible.
    Completing,
    Loaded,
    Failed,
}

/// Simulated progress for an image fetching out-of-band. Purely cosmetic:
/// it never gates the real request, it only drives the meter. The machine
/// is advanced by explicit ticks so progress curves are deterministic
/// under test.
#[derive(Debug, Clone)]
pub struct ProgressiveLoader {
    state: LoaderState,
    progress: f64,
    url: Option<String>,
    hold_until: Option<Instant>,
}

impl ProgressiveLoader {
    pub fn new() -> Self {
        Self {
            state: LoaderState::Idle,
            progress: 0.0,
            url: None,
            hold_until: None,
        }
    }

    pub fn state(&self) -> LoaderState {
        self.state
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoaderState::Loading | LoaderState::Completing)
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Starts (or restarts) loading for `url`. Beginning with a new URL
    /// while a load is in flight abandons the old one entirely; stale
    /// ticks cannot touch the new load because the machine is reset here.
    pub fn begin(&mut self, url: impl Into<String>) {
        self.state = LoaderState::Loading;
        self.progress = INITIAL_PROGRESS;
        self.url = Some(url.into());
        self.hold_until = None;
    }

    /// Advances simulated progress while loading, and resolves the
    /// completion hold once its deadline passes.
    pub fn tick(&mut self, now: Instant) {
        match self.state {
            LoaderState::Loading => {
                let step = if self.progress < FAST_CEILING {
                    FAST_STEP
                } else {
                    SLOW_STEP
                };
                self.progress = (self.progress + step).min(SIMULATED_CEILING);
            }
            LoaderState::Completing => {
                let due = self
                    .hold_until
                    .map(|deadline| now >= deadline)
                    .unwrap_or(true);
                if due {
                    self.state = LoaderState::Loaded;
                    self.hold_until = None;
                }
            }
            LoaderState::Idle | LoaderState::Loaded | LoaderState::Failed => {}
        }
    }

    /// The real asset finished: snap to 100 and hold the full bar for
    /// 350 ms before `tick` settles the machine into `Loaded`.
    pub fn succeed(&mut self, now: Instant) {
        if self.state != LoaderState::Loading {
            return;
        }
        self.progress = 100.0;
        self.state = LoaderState::Completing;
        self.hold_until = Some(now + COMPLETION_HOLD);
    }

    /// The real load errored: fail immediately, progress frozen where it
    /// was. No 100 snap, no hold.
    pub fn fail(&mut self) {
        if self.state != LoaderState::Loading {
            return;
        }
        self.state = LoaderState::Failed;
        self.hold_until = None;
    }

    pub fn reset(&mut self) {
        self.state = LoaderState::Idle;
        self.progress = 0.0;
        self.url = None;
        self.hold_until = None;
    }
}

impl Default for ProgressiveLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_starts_at_five_percent() {
        let mut loader = ProgressiveLoader::new();
        loader.begin("https://example.com/a.png");
        assert_eq!(loader.state(), LoaderState::Loading);
        assert_eq!(loader.progress(), 5.0);
        assert!(loader.is_loading());
    }

    #[test]
    fn ticks_advance_fast_then_slow_and_clamp_at_95() {
        let mut loader = ProgressiveLoader::new();
        loader.begin("u");
        let now = Instant::now();

        loader.tick(now);
        assert!((loader.progress() - 6.2).abs() < 1e-9);

        // 1.2/step below 80, then 0.25/step, never past 95.
        let mut previous = loader.progress();
        for _ in 0..1000 {
            loader.tick(now);
            assert!(loader.progress() >= previous);
            previous = loader.progress();
        }
        assert_eq!(loader.progress(), 95.0);
        assert_eq!(loader.state(), LoaderState::Loading);
    }

    #[test]
    fn step_size_drops_above_eighty() {
        let mut loader = ProgressiveLoader::new();
        loader.begin("u");
        let now = Instant::now();
        while loader.progress() < 80.0 {
            let before = loader.progress();
            loader.tick(now);
            assert!((loader.progress() - before - 1.2).abs() < 1e-9 || loader.progress() == 95.0);
        }
        let before = loader.progress();
        loader.tick(now);
        assert!((loader.progress() - before - 0.25).abs() < 1e-9);
    }

    #[test]
    fn succeed_snaps_to_100_and_holds_350ms() {
        let mut loader = ProgressiveLoader::new();
        loader.begin("u");
        let start = Instant::now();
        loader.tick(start);
        loader.succeed(start);

        assert_eq!(loader.progress(), 100.0);
        assert_eq!(loader.state(), LoaderState::Completing);
        assert!(loader.is_loading());

        loader.tick(start + Duration::from_millis(200));
        assert_eq!(loader.state(), LoaderState::Completing);

        loader.tick(start + Duration::from_millis(350));
        assert_eq!(loader.state(), LoaderState::Loaded);
        assert!(!loader.is_loading());
    }

    #[test]
    fn fail_freezes_progress_without_snap() {
        let mut loader = ProgressiveLoader::new();
        loader.begin("u");
        let now = Instant::now();
        for _ in 0..10 {
            loader.tick(now);
        }
        let frozen = loader.progress();
        loader.fail();

        assert_eq!(loader.state(), LoaderState::Failed);
        assert_eq!(loader.progress(), frozen);
        assert!(!loader.is_loading());

        // Ticks after failure change nothing.
        loader.tick(now);
        assert_eq!(loader.progress(), frozen);
    }

    #[test]
    fn begin_with_new_url_restarts_the_machine() {
        let mut loader = ProgressiveLoader::new();
        loader.begin("first");
        let now = Instant::now();
        for _ in 0..50 {
            loader.tick(now);
        }
        assert!(loader.progress() > 5.0);

        loader.begin("second");
        assert_eq!(loader.progress(), 5.0);
        assert_eq!(loader.url(), Some("second"));
        assert_eq!(loader.state(), LoaderState::Loading);
    }

    #[test]
    fn succeed_is_ignored_outside_loading() {
        let mut loader = ProgressiveLoader::new();
        let now = Instant::now();
        loader.succeed(now);
        assert_eq!(loader.state(), LoaderState::Idle);

        loader.begin("u");
        loader.fail();
        loader.succeed(now);
        assert_eq!(loader.state(), LoaderState::Failed);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut loader = ProgressiveLoader::new();
        loader.begin("u");
        loader.reset();
        assert_eq!(loader.state(), LoaderState::Idle);
        assert_eq!(loader.progress(), 0.0);
        assert_eq!(loader.url(), None);
    }
}
