mod channels;
mod worker;

pub use channels::{Channels, TaskEvent, WorkerCommand};
pub use worker::Worker;
