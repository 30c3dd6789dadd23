/// Named tick timers driven by a caller-supplied millisecond clock.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Timer {
    Entities,
    Input,
    Tv,
    Flashers,
    NewBabies,
    Over,
}

impl Timer {
    const COUNT: usize = 6;

    fn slot(self) -> usize {
        self as usize
    }
}

/// Per-timer start marks. A timer "elapses" once `delay` ms have passed since
/// its mark, and elapsing moves the mark to the current time.
#[derive(Clone, Debug, Default)]
pub struct TickTimers {
    marks: [u64; Timer::COUNT],
}

impl TickTimers {
    /// True (and restart the timer) when at least `delay_ms` passed since the last mark.
    pub fn elapsed(&mut self, timer: Timer, now_ms: u64, delay_ms: u64) -> bool {
        let mark = &mut self.marks[timer.slot()];
        if now_ms.saturating_sub(*mark) >= delay_ms {
            *mark = now_ms;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self, timer: Timer, now_ms: u64) {
        self.marks[timer.slot()] = now_ms;
    }

    /// Milliseconds since the last mark.
    pub fn ticks(&self, timer: Timer, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.marks[timer.slot()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_restarts_mark() {
        let mut t = TickTimers::default();
        assert!(!t.elapsed(Timer::Entities, 19, 20));
        assert!(t.elapsed(Timer::Entities, 20, 20));
        assert!(!t.elapsed(Timer::Entities, 39, 20));
        assert!(t.elapsed(Timer::Entities, 45, 20));
        assert_eq!(t.ticks(Timer::Entities, 50), 5);
    }

    #[test]
    fn test_timers_are_independent() {
        let mut t = TickTimers::default();
        t.reset(Timer::Tv, 1000);
        assert!(t.elapsed(Timer::Input, 1000, 20));
        assert!(!t.elapsed(Timer::Tv, 3999, 3000));
        assert!(t.elapsed(Timer::Tv, 4000, 3000));
        assert_eq!(t.ticks(Timer::Over, 10), 10);
    }

    #[test]
    fn test_clock_going_backwards_never_elapses() {
        let mut t = TickTimers::default();
        t.reset(Timer::Flashers, 500);
        assert_eq!(t.ticks(Timer::Flashers, 100), 0);
        assert!(!t.elapsed(Timer::Flashers, 100, 75));
    }
}
