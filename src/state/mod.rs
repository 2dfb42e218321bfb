pub mod model;
pub mod update;

pub use model::{AppState, ConnectionStatus, Tab, format_clock};
pub use update::Action;
