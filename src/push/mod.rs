//! Push notifications: payload normalization, display and click handling.

mod clients;
mod notification;
mod payload;

pub use clients::{Clients, WindowClient};
pub use notification::{
    ClickHandler, ClickMatch, ClickOutcome, NotificationCenter, NotificationClick,
    NotificationData, NotificationOptions,
};
pub use payload::{NotificationDescriptor, PushPayload};
