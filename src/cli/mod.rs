pub mod chains;
pub mod setup;
pub mod ui;
pub mod view;
