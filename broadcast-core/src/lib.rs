//! Controller domain logic: everything in the spec's §4 components except
//! the binary's process lifecycle, which lives in `broadcast-server`.

pub mod channel_registry;
pub mod dispatch;
pub mod eas;
pub mod epoch_picker;
pub mod error;
pub mod index_store;
pub mod interstitial;
pub mod mtv_picker;
pub mod player_ipc;
pub mod schedule;
pub mod scheduled_picker;
pub mod state;
pub mod tuner;

#[cfg(test)]
pub mod test_support;

pub use error::{ControllerError, Result};
