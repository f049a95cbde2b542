// Interface layer: the state handed to in-process command handlers
pub mod app_state;
pub use app_state::AppState;
