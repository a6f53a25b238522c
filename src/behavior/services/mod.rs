//! Humanized page interaction.

mod human;

pub use human::HumanPage;
