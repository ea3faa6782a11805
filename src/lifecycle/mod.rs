//! Process lifecycle: startup is `main`'s job, shutdown is coordinated
//! here.

pub mod shutdown;

pub use shutdown::Shutdown;
