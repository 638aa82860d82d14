/// Wall-clock to fixed-step converter. Frame time goes into an accumulator
/// and comes out as whole steps; the remainder carries to the next frame.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f64,
    max_steps: u32,
    accumulator: f64,
    last: Option<f64>,
}

impl FixedTimestep {
    pub fn new(step_secs: f64, max_steps: u32) -> Self {
        Self {
            step: step_secs,
            max_steps,
            accumulator: 0.0,
            last: None,
        }
    }

    /// Number of fixed steps owed for a frame at wall time `now`.
    /// Steps beyond `max_steps` are dropped rather than replayed.
    pub fn advance(&mut self, now: f64) -> u32 {
        let Some(last) = self.last.replace(now) else {
            return 0;
        };

        self.accumulator += (now - last).max(0.0);

        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            steps += 1;
            if steps == self.max_steps {
                self.accumulator = 0.0;
                break;
            }
        }
        steps
    }

    /// Paused frame: move the reference time without owing any steps.
    pub fn hold(&mut self, now: f64) {
        self.last = Some(now);
    }

    /// Drops owed time and waits for a new reference frame.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.last = None;
    }
}
