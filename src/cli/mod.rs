pub mod refund;
pub mod returns;
pub mod setup;
pub mod ui;
