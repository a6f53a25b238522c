//! Pure sampling models for human-like interaction.

mod mouse;
mod scroll;
mod stealth;
mod timing;
mod typing;

pub use mouse::{MouseStep, Point, bezier_path};
pub use scroll::{ScrollStep, plan_scroll};
pub use stealth::StealthProfile;
pub use timing::{random_delay, standard_normal};
pub use typing::{Keystroke, plan_typing};
