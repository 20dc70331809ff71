/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and logging.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    ItemCollected { x: f64, y: f64 },
    DoorAppeared { x: f64, y: f64 },
    HitBadItem,
    LevelEntered { level: usize },
    Escaped,
    LevelReset,
}
