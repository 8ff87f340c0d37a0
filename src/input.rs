//! Pointer input
//!
//! The host translates mouse/touch events into play-field x coordinates and
//! hands them to [`PointerInput`]. Everything the input side may do to the
//! game goes through the [`InputPort`] capability set, so this module never
//! sees the simulation itself.

use crate::error::Result;

/// What input is allowed to ask of the game
pub trait InputPort {
    fn is_game_over(&self) -> bool;
    /// Spawn gate (cooldown, staged piece, last drop clear of the line)
    fn can_spawn_next(&mut self, now: f64) -> bool;
    fn has_active_piece(&self) -> bool;
    /// Stage a piece now if the gate allows, otherwise keep retrying.
    /// Returns true if a piece was staged.
    fn create_piece(&mut self, now: f64) -> Result<bool>;
    /// Drop the staged piece at `x`. Returns true if it was dropped.
    fn drop_piece(&mut self, x: f32, now: f64) -> Result<bool>;
    /// Move the staged piece toward `x` (clamped by the game)
    fn follow(&mut self, x: f32) -> Result<()>;
}

/// Pointer tracker
///
/// Moves only record the latest x; the staged piece is moved on a steady
/// poll so coalesced or bursty events never leave it behind the cursor.
#[derive(Debug, Clone)]
pub struct PointerInput {
    x: Option<f32>,
    interval_ms: f64,
    last_poll: f64,
}

impl PointerInput {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            x: None,
            interval_ms,
            last_poll: f64::NEG_INFINITY,
        }
    }

    /// Press: ask for a piece if none is staged, and aim it
    pub fn pointer_down<P: InputPort + ?Sized>(&mut self, port: &mut P, x: f32, now: f64) -> Result<()> {
        if port.is_game_over() {
            return Ok(());
        }
        self.x = Some(x);
        if !port.has_active_piece() {
            port.create_piece(now)?;
        }
        port.follow(x)
    }

    pub fn pointer_move(&mut self, x: f32) {
        self.x = Some(x);
    }

    /// Release: drop wherever the pointer let go
    pub fn pointer_up<P: InputPort + ?Sized>(&mut self, port: &mut P, x: f32, now: f64) -> Result<bool> {
        if port.is_game_over() {
            return Ok(false);
        }
        self.x = Some(x);
        if !port.has_active_piece() {
            return Ok(false);
        }
        port.drop_piece(x, now)
    }

    /// Follow the pointer at the poll cadence
    pub fn poll<P: InputPort + ?Sized>(&mut self, port: &mut P, now: f64) -> Result<()> {
        if now - self.last_poll < self.interval_ms {
            return Ok(());
        }
        self.last_poll = now;
        let Some(x) = self.x else {
            return Ok(());
        };
        if port.is_game_over() || !port.has_active_piece() {
            return Ok(());
        }
        port.follow(x)
    }

    /// Forget the pointer (restart)
    pub fn reset(&mut self) {
        self.x = None;
        self.last_poll = f64::NEG_INFINITY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records calls instead of running a game
    #[derive(Default)]
    struct FakePort {
        over: bool,
        gate: bool,
        active: bool,
        created: u32,
        drops: Vec<f32>,
        follows: Vec<f32>,
    }

    impl InputPort for FakePort {
        fn is_game_over(&self) -> bool {
            self.over
        }
        fn can_spawn_next(&mut self, _now: f64) -> bool {
            self.gate
        }
        fn has_active_piece(&self) -> bool {
            self.active
        }
        fn create_piece(&mut self, now: f64) -> Result<bool> {
            if !self.can_spawn_next(now) {
                return Ok(false);
            }
            self.created += 1;
            self.active = true;
            Ok(true)
        }
        fn drop_piece(&mut self, x: f32, _now: f64) -> Result<bool> {
            self.drops.push(x);
            self.active = false;
            Ok(true)
        }
        fn follow(&mut self, x: f32) -> Result<()> {
            self.follows.push(x);
            Ok(())
        }
    }

    #[test]
    fn test_press_creates_then_release_drops() {
        let mut port = FakePort {
            gate: true,
            ..Default::default()
        };
        let mut input = PointerInput::new(1000.0 / 60.0);

        input.pointer_down(&mut port, 120.0, 0.0).unwrap();
        assert_eq!(port.created, 1);
        assert_eq!(port.follows, vec![120.0]);

        assert!(input.pointer_up(&mut port, 150.0, 10.0).unwrap());
        assert_eq!(port.drops, vec![150.0]);
    }

    #[test]
    fn test_press_respects_gate() {
        let mut port = FakePort::default();
        let mut input = PointerInput::new(16.0);
        input.pointer_down(&mut port, 120.0, 0.0).unwrap();
        assert_eq!(port.created, 0);
        assert!(!input.pointer_up(&mut port, 120.0, 5.0).unwrap());
        assert!(port.drops.is_empty());
    }

    #[test]
    fn test_game_over_ignores_input() {
        let mut port = FakePort {
            over: true,
            gate: true,
            active: true,
            ..Default::default()
        };
        let mut input = PointerInput::new(16.0);
        input.pointer_down(&mut port, 120.0, 0.0).unwrap();
        assert!(!input.pointer_up(&mut port, 120.0, 5.0).unwrap());
        input.poll(&mut port, 100.0).unwrap();
        assert_eq!(port.created, 0);
        assert!(port.drops.is_empty());
        assert!(port.follows.is_empty());
    }

    #[test]
    fn test_poll_follows_at_fixed_cadence() {
        let mut port = FakePort {
            active: true,
            ..Default::default()
        };
        let mut input = PointerInput::new(16.0);
        input.pointer_move(50.0);
        input.pointer_move(80.0);
        assert!(port.follows.is_empty());

        input.poll(&mut port, 0.0).unwrap();
        input.poll(&mut port, 5.0).unwrap();
        input.pointer_move(90.0);
        input.poll(&mut port, 16.0).unwrap();
        assert_eq!(port.follows, vec![80.0, 90.0]);
    }
}
