mod app;
mod widgets;

pub use app::{Input, TuiApp};
