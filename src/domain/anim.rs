/// AnimationClock: derived walk/kick frame state for the renderer.
///
/// The clock holds an index into a short directed cycle plus a tick counter
/// within that index. It never touches position, z, or the map. The kick state
/// machine reads it for two things only: when to classify, and when the kick
/// animation has returned to the idle pose.
///
/// Index layout:
///   0 → 1 → 2 → 3 → 0        barefoot walk (0 = idle pose)
///   4 → 0                    barefoot kick
///   5 → 6 → 7 → 8 → 5        booted walk (5 = idle pose)
///   9 → 10 → 11 → 5          booted kick (classification at 10, frame 0)

pub const WALKING_FRAMES: u32 = 15;
pub const KICKING_FRAMES: u32 = 20;

pub const NEXT_INDEX: [usize; 12] = [1, 2, 3, 0, 0, 6, 7, 8, 5, 10, 11, 5];
pub const SPRITE_FRAME: [usize; 12] = [0, 1, 0, 2, 3, 4, 5, 4, 6, 7, 8, 7];

pub const BAREFOOT_IDLE: usize = 0;
pub const BOOTED_IDLE: usize = 5;
/// Kick animations start this many indices after the idle pose.
const KICK_OFFSET: usize = 4;
/// Booted kick index whose first frame triggers classification.
const BOOTED_KICK_STRIKE: usize = 10;

pub fn idle_index(has_boot: bool) -> usize {
    if has_boot { BOOTED_IDLE } else { BAREFOOT_IDLE }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AnimationClock {
    /// Ticks into the current index; -1 means "about to start".
    frame: i32,
    index: usize,
}

impl AnimationClock {
    pub fn new(has_boot: bool) -> Self {
        AnimationClock { frame: -1, index: idle_index(has_boot) }
    }

    #[cfg(test)]
    pub fn frame(&self) -> i32 {
        self.frame
    }

    #[cfg(test)]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Sprite column for the renderer.
    pub fn sprite_frame(&self) -> usize {
        SPRITE_FRAME[self.index]
    }

    /// Begin the kick animation from the current idle pose.
    pub fn start_kick(&mut self, has_boot: bool) {
        self.frame = -1;
        self.index = idle_index(has_boot) + KICK_OFFSET;
    }

    /// Is this the tick on which a pending kick is classified?
    pub fn at_strike(&self, has_boot: bool) -> bool {
        if has_boot {
            self.frame == 0 && self.index == BOOTED_KICK_STRIKE
        } else {
            self.frame == 0
        }
    }

    /// Snap to the idle pose (used when the boot is put on).
    pub fn rest(&mut self, has_boot: bool) {
        self.index = idle_index(has_boot);
    }

    /// Advance one tick. Returns true when a kick animation has just
    /// returned to the idle pose.
    pub fn advance(&mut self, moving: bool, kicking: bool, has_boot: bool) -> bool {
        if !moving && !kicking {
            self.frame = -1;
            self.index = idle_index(has_boot);
            return false;
        }
        self.frame += 1;
        let length = if kicking { KICKING_FRAMES } else { WALKING_FRAMES };
        if self.frame >= length as i32 {
            self.frame = 0;
            self.index = NEXT_INDEX[self.index];
            return kicking && self.index == idle_index(has_boot);
        }
        false
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        AnimationClock::new(false)
    }
}
