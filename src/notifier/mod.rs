// SPDX-License-Identifier: GPL-3.0-only
pub mod events;
pub mod traits;
pub mod status;

pub use events::{EventKind, StatusEvent};
pub use traits::StatusListener;
pub use status::{ListenerFault, StatusNotifier, SubscriptionHandle};
