//! Fetch cycle and the driver that schedules it around the game process.

mod cycle;
mod driver;
pub mod error;
mod fetcher;
mod names;
mod roster;
mod search;
#[cfg(test)]
mod testing;
mod validator;

pub use cycle::{CycleOutcome, Poller};
pub use driver::{Driver, DriverState, HotkeyHooks, SessionGuard, SessionHooks};
pub use error::CycleError;
pub use fetcher::{fetch_latest_match, is_new};
pub use names::{refresh_account_names, spawn_name_refresh};
pub use roster::resolve_roster;
pub use search::search_players;
pub use validator::validate;
