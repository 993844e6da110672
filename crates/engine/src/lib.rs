pub mod intake;
pub mod lifecycle;

pub use intake::{IntakeSummary, SignalIntake};
pub use lifecycle::{Engine, EngineHandle};
