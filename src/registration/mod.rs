//! Registration proxies and the registry that keeps one per name

mod observation;
mod proxy;
mod registry;

pub use observation::{
    Handler, ListenerId, Observation, ObservationId, RegistrationListener, ShortcutListener,
};
pub use proxy::Registration;
pub use registry::{Registry, Routes};

pub(crate) use observation::Notification;
pub(crate) use proxy::Backend;
