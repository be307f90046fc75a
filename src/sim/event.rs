/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and log lines.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// Kick pressed from idle; the windup animation begins.
    KickStarted,
    /// Classification found nothing; the animation plays out with no effect.
    KickWhiffed,
    /// Barefoot kick matched a boot; the actor is being pulled onto it.
    GrabStarted { row: usize, col: usize },
    /// Grab curve finished; the boot cell has been cleared.
    BootGrabbed { row: usize, col: usize },
    ClimbStarted { from: u8, to: u8 },
    FallStarted { from: u8, to: u8 },
    /// Kick animation returned to idle.
    KickFinished,
    /// Movement was clamped after walking freely the tick before.
    WallBumped,
}
