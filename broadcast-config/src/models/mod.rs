pub mod channel;
pub mod eas;
pub mod parental;
pub mod schedule;

pub use channel::{Channel, ChannelTable};
pub use eas::EasConfig;
pub use parental::ParentalConfig;
pub use schedule::{ScheduleConfig, Slot, Weekday};
