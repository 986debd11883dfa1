pub mod compare;
pub mod popular;
pub mod setup;
pub mod show;
pub mod ui;
