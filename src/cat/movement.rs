use glam::Vec2;

use super::behavior::Facing;
use crate::config::WalkConfig;
use crate::host::Host;

/// Longest frame delta we integrate (seconds). A stalled loop resumes
/// instead of teleporting the cat.
const MAX_FRAME_DT: f32 = 0.25;

/// Pointer and window origin captured at drag start.
#[derive(Debug, Clone, Copy)]
struct Drag {
    start_pointer: Vec2,
    start_window: Vec2,
    /// Set by the first pointer move; a drag without moves is a click.
    moved: bool,
}

/// What a pointer-down/up gesture turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    Dragged,
    Click,
}

/// Sole owner of the cat window's screen position. Written by exactly one
/// driver at a time: walking frames or a user drag.
pub struct MovementController {
    pos: Vec2,
    facing: Facing,
    drag: Option<Drag>,
    /// Timestamp of the previous walk frame; `None` while not walking.
    last_frame_ms: Option<u64>,
    screen_w: f32,
    sprite_w: f32,
    speed: f32,
    jitter: f32,
}

impl MovementController {
    pub fn new(start: Vec2, walk: &WalkConfig, screen_w: f32, sprite_w: f32) -> Self {
        Self {
            pos: start,
            facing: Facing::Right,
            drag: None,
            last_frame_ms: None,
            screen_w,
            sprite_w,
            speed: walk.speed,
            jitter: walk.jitter,
        }
    }

    #[cfg(test)]
    pub fn position(&self) -> Vec2 {
        self.pos
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn set_facing(&mut self, facing: Facing) {
        self.facing = facing;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Rightmost x the sprite may walk to.
    pub fn max_x(&self) -> f32 {
        (self.screen_w - self.sprite_w).max(0.0)
    }

    pub fn set_screen(&mut self, screen_w: f32, sprite_w: f32) {
        self.screen_w = screen_w;
        self.sprite_w = sprite_w;
    }

    /// Advance one walk frame. The first frame after walking starts only
    /// records the timestamp. Crossing an edge clamps and flips once.
    pub fn walk_frame(&mut self, now_ms: u64, rng: &mut fastrand::Rng, host: &mut impl Host) {
        let Some(last) = self.last_frame_ms.replace(now_ms) else {
            return;
        };
        let dt = (now_ms.saturating_sub(last) as f32 / 1000.0).min(MAX_FRAME_DT);
        if dt <= 0.0 {
            return;
        }

        let speed = self.speed + rng.f32() * self.jitter;
        let mut x = self.pos.x + self.facing.sign() * speed * dt;

        let max_x = self.max_x();
        if x > max_x {
            x = max_x;
            self.facing = Facing::Left;
        } else if x < 0.0 {
            x = 0.0;
            self.facing = Facing::Right;
        }

        log::trace!("Walk frame dt={dt:.3}s x={x:.1}");
        self.write(Vec2::new(x, self.pos.y), host);
    }

    /// Walking stopped; the next walk starts from a fresh frame clock.
    pub fn stop_walking(&mut self) {
        self.last_frame_ms = None;
    }

    pub fn pointer_down(&mut self, pointer: Vec2) {
        self.stop_walking();
        self.drag = Some(Drag {
            start_pointer: pointer,
            start_window: self.pos,
            moved: false,
        });
    }

    /// Follow the pointer, unclamped. Returns false when no drag is active.
    pub fn pointer_move(&mut self, pointer: Vec2, host: &mut impl Host) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        drag.moved = true;
        let target = drag.start_window + (pointer - drag.start_pointer);
        self.write(target, host);
        true
    }

    /// End the gesture. `None` if no drag was active.
    pub fn pointer_up(&mut self) -> Option<DragOutcome> {
        let drag = self.drag.take()?;
        Some(if drag.moved {
            DragOutcome::Dragged
        } else {
            DragOutcome::Click
        })
    }

    /// Abandon any gesture in flight (shutdown).
    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    /// Mirror the new position to the host. Failures are a harmless race
    /// with the window lifecycle and are swallowed.
    fn write(&mut self, pos: Vec2, host: &mut impl Host) {
        self.pos = pos;
        let (x, y) = (pos.x.round() as i32, pos.y.round() as i32);
        if let Err(e) = host.set_window_position(x, y) {
            log::debug!("Ignoring failed window move to ({x}, {y}): {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RecordingHost;
    use pretty_assertions::assert_eq;

    const SCREEN_W: f32 = 1000.0;
    const SPRITE_W: f32 = 120.0;

    fn controller(x: f32, facing: Facing) -> MovementController {
        let mut m = MovementController::new(
            Vec2::new(x, 400.0),
            &WalkConfig::default(),
            SCREEN_W,
            SPRITE_W,
        );
        m.set_facing(facing);
        m
    }

    #[test]
    fn first_frame_only_starts_the_clock() {
        let mut host = RecordingHost::default();
        let mut rng = fastrand::Rng::with_seed(1);
        let mut m = controller(500.0, Facing::Right);

        m.walk_frame(1_000, &mut rng, &mut host);
        assert_eq!(m.position().x, 500.0);
        assert!(host.positions.is_empty());

        m.walk_frame(1_100, &mut rng, &mut host);
        let x = m.position().x;
        // 0.1s at 40..60 px/s
        assert!((504.0..=506.0).contains(&x), "x = {x}");
        assert_eq!(m.position().y, 400.0);
        assert_eq!(host.positions.len(), 1);
    }

    #[test]
    fn walks_left_when_facing_left() {
        let mut host = RecordingHost::default();
        let mut rng = fastrand::Rng::with_seed(2);
        let mut m = controller(500.0, Facing::Left);
        m.walk_frame(0, &mut rng, &mut host);
        m.walk_frame(200, &mut rng, &mut host);
        assert!(m.position().x < 500.0);
    }

    #[test]
    fn long_stall_is_capped() {
        let mut host = RecordingHost::default();
        let mut rng = fastrand::Rng::with_seed(3);
        let mut m = controller(100.0, Facing::Right);
        m.walk_frame(0, &mut rng, &mut host);
        m.walk_frame(60_000, &mut rng, &mut host);
        assert!(m.position().x <= 100.0 + 60.0 * MAX_FRAME_DT);
    }

    #[test]
    fn stays_in_bounds_and_flips_once_per_crossing() {
        let mut host = RecordingHost::default();
        let mut rng = fastrand::Rng::with_seed(4);
        let mut m = controller(860.0, Facing::Right);

        let mut flips = 0;
        let mut prev = m.facing();
        let mut now = 0;
        for _ in 0..10_000 {
            m.walk_frame(now, &mut rng, &mut host);
            now += 16;
            let x = m.position().x;
            assert!((0.0..=m.max_x()).contains(&x), "x = {x}");
            if m.facing() != prev {
                flips += 1;
                // A flip only happens pinned against an edge.
                assert!(x == 0.0 || x == m.max_x());
                prev = m.facing();
            }
        }
        // 160s at 40-60 px/s across an 880px lane: several crossings.
        assert!(flips >= 6, "flips = {flips}");

        // Consecutive frames never flip back and forth at the same edge.
        let mut m = controller(879.9, Facing::Right);
        m.walk_frame(0, &mut rng, &mut host);
        m.walk_frame(16, &mut rng, &mut host);
        assert_eq!((m.position().x, m.facing()), (880.0, Facing::Left));
        m.walk_frame(32, &mut rng, &mut host);
        assert!(m.position().x < 880.0);
        assert_eq!(m.facing(), Facing::Left);
    }

    #[test]
    fn walking_from_the_left_edge() {
        let mut host = RecordingHost::default();
        let mut rng = fastrand::Rng::with_seed(5);
        let mut m = controller(0.5, Facing::Left);
        m.walk_frame(0, &mut rng, &mut host);
        m.walk_frame(100, &mut rng, &mut host);
        assert_eq!((m.position().x, m.facing()), (0.0, Facing::Right));
    }

    #[test]
    fn drag_follows_pointer_unclamped() {
        let mut host = RecordingHost::default();
        let mut m = controller(300.0, Facing::Right);

        m.pointer_down(Vec2::new(350.0, 450.0));
        assert!(m.is_dragging());
        m.pointer_move(Vec2::new(2_000.0, 460.0), &mut host);
        assert_eq!(m.position(), Vec2::new(1_950.0, 410.0));
        m.pointer_move(Vec2::new(-100.0, 440.0), &mut host);
        assert_eq!(m.position(), Vec2::new(-150.0, 390.0));

        assert_eq!(m.pointer_up(), Some(DragOutcome::Dragged));
        assert!(!m.is_dragging());
        assert_eq!(host.positions, vec![(1_950, 410), (-150, 390)]);
    }

    #[test]
    fn press_and_release_without_moving_is_a_click() {
        let mut host = RecordingHost::default();
        let mut m = controller(300.0, Facing::Right);
        m.pointer_down(Vec2::new(350.0, 450.0));
        assert_eq!(m.pointer_up(), Some(DragOutcome::Click));
        assert_eq!(m.pointer_up(), None);
        assert!(!m.pointer_move(Vec2::new(0.0, 0.0), &mut host));
        assert!(host.positions.is_empty());
    }

    #[test]
    fn host_failures_are_swallowed() {
        let mut host = RecordingHost {
            fail_positions: true,
            ..Default::default()
        };
        let mut rng = fastrand::Rng::with_seed(6);
        let mut m = controller(500.0, Facing::Right);
        m.walk_frame(0, &mut rng, &mut host);
        m.walk_frame(100, &mut rng, &mut host);
        assert!(m.position().x > 500.0);

        m.pointer_down(Vec2::ZERO);
        assert!(m.pointer_move(Vec2::new(5.0, 5.0), &mut host));
    }
}
