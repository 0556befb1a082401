pub mod badge;
pub mod cards;
pub mod format;
pub mod sparkline;
