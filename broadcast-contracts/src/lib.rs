//! Trait surfaces and value types shared across the broadcast-controller
//! crates. No I/O lives here: this crate is the seam `broadcast-core` and
//! `broadcast-server` both compile against.

pub mod ids;
pub mod player;

pub mod prelude {
    pub use super::ids::{ChannelNumber, ShowId, Station};
    pub use super::player::{PlayerControl, PlayerValue};
}
