mod state;

pub(crate) use state::{Admission, PendingRequest, RefreshCell};
