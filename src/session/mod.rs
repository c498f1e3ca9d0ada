mod logout;

pub use logout::{LogoutRegistry, LogoutSubscription, SubscriptionId};
