mod freezer;
mod provider;

pub use freezer::HostFreezer;
pub use provider::{ArrayHostProvider, HostProvider, HostProviderError, HostProviderResult};

pub(crate) use freezer::DEFAULT_FREEZE_DURATION;
