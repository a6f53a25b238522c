//! Pacer implementations and a simulated page.

mod recording;
mod simulated;
mod tokio_pacer;

pub use recording::RecordingPacer;
pub use simulated::{PageAction, SimulatedPage};
pub use tokio_pacer::TokioPacer;
