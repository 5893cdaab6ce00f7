//! Device-trust signals and the provider abstraction

pub mod collector;
pub mod mock;
pub mod slow_mock;
pub mod traits;
pub mod types;

pub use collector::collect_signals;
pub use mock::{MockSignalProvider, ProbeScript, ProviderCalls};
pub use slow_mock::SlowSignalProvider;
pub use traits::SignalProvider;
pub use types::{
    DeveloperOptionsProbe, DeviceInfoFacts, DeviceSignals, EmulatorProbe, RootProbe, SignalKind,
};
