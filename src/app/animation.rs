use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Easing {
    InCubic,
    OutCubic,
    InOutSine,
}

impl Easing {
    pub(super) fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::InCubic => t * t * t,
            Self::OutCubic => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            Self::InOutSine => 0.5 - 0.5 * (std::f32::consts::PI * t).cos(),
        }
    }
}

/// Time-driven progress from 0 to 1 with an optional start delay.
#[derive(Clone, Debug)]
pub(super) struct Tween {
    elapsed: f32,
    delay: f32,
    duration: f32,
    easing: Easing,
}

impl Tween {
    pub(super) fn new(duration: Duration, easing: Easing) -> Self {
        Self {
            elapsed: 0.0,
            delay: 0.0,
            duration: duration.as_secs_f32(),
            easing,
        }
    }

    pub(super) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay.as_secs_f32();
        self
    }

    pub(super) fn update(&mut self, dt_secs: f32) {
        self.elapsed = (self.elapsed + dt_secs.max(0.0)).min(self.delay + self.duration);
    }

    pub(super) fn linear(&self) -> f32 {
        if self.duration <= 0.0 {
            return if self.elapsed >= self.delay { 1.0 } else { 0.0 };
        }
        ((self.elapsed - self.delay) / self.duration).clamp(0.0, 1.0)
    }

    pub(super) fn progress(&self) -> f32 {
        self.easing.apply(self.linear())
    }

    pub(super) fn is_complete(&self) -> bool {
        self.elapsed >= self.delay + self.duration
    }
}

pub(super) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_hits_both_ends() {
        for easing in [Easing::InCubic, Easing::OutCubic, Easing::InOutSine] {
            assert!(easing.apply(0.0).abs() < 1e-6);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6);
        }
        assert!(Easing::InCubic.apply(0.5) < 0.5);
        assert!(Easing::OutCubic.apply(0.5) > 0.5);
    }

    #[test]
    fn delayed_tween_waits_before_moving() {
        let mut tween = Tween::new(Duration::from_millis(300), Easing::OutCubic)
            .with_delay(Duration::from_millis(360));

        tween.update(0.2);
        assert_eq!(tween.progress(), 0.0);

        tween.update(0.31);
        assert!(tween.progress() > 0.0 && tween.progress() < 1.0);
        assert!(!tween.is_complete());

        tween.update(1.0);
        assert_eq!(tween.progress(), 1.0);
        assert!(tween.is_complete());
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let tween = Tween::new(Duration::ZERO, Easing::InCubic);

        assert!(tween.is_complete());
        assert_eq!(tween.progress(), 1.0);
    }
}
