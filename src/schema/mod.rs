pub mod event;
pub mod player;
