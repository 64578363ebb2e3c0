pub mod adapter;
pub mod error;
pub mod host;
pub mod identity;
pub mod loopback;

pub use adapter::BlockDeviceAdapter;
pub use identity::Identity;
pub use loopback::LoopbackHost;
