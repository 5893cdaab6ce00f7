//! Slow mock provider for concurrency testing
//!
//! SlowSignalProvider wraps MockSignalProvider and sleeps before answering
//! each probe, simulating the latency of OS service calls.

use std::time::Duration;

use async_trait::async_trait;

use super::mock::MockSignalProvider;
use super::traits::SignalProvider;
use super::types::{DeveloperOptionsProbe, DeviceInfoFacts, EmulatorProbe, RootProbe};
use crate::error::ProbeError;

/// MockSignalProvider wrapper that adds configurable delay
pub struct SlowSignalProvider {
    inner: MockSignalProvider,
    delay: Duration,
}

impl SlowSignalProvider {
    pub fn new(delay: Duration) -> Self {
        Self::wrap(MockSignalProvider::new(), delay)
    }

    pub fn wrap(inner: MockSignalProvider, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// The wrapped provider, for scripting and call counts
    pub fn inner(&self) -> &MockSignalProvider {
        &self.inner
    }
}

#[async_trait]
impl SignalProvider for SlowSignalProvider {
    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    async fn query_emulator(&self) -> Result<EmulatorProbe, ProbeError> {
        tokio::time::sleep(self.delay).await;
        self.inner.query_emulator().await
    }

    async fn query_root(&self) -> Result<RootProbe, ProbeError> {
        tokio::time::sleep(self.delay).await;
        self.inner.query_root().await
    }

    async fn query_developer_options(&self) -> Result<DeveloperOptionsProbe, ProbeError> {
        tokio::time::sleep(self.delay).await;
        self.inner.query_developer_options().await
    }

    async fn query_device_info(&self) -> Result<DeviceInfoFacts, ProbeError> {
        tokio::time::sleep(self.delay).await;
        self.inner.query_device_info().await
    }

    async fn enable_capture_protection(&self) -> Result<(), ProbeError> {
        tokio::time::sleep(self.delay).await;
        self.inner.enable_capture_protection().await
    }

    async fn disable_capture_protection(&self) -> Result<(), ProbeError> {
        tokio::time::sleep(self.delay).await;
        self.inner.disable_capture_protection().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn probe_delays_by_configured_duration() {
        let provider = SlowSignalProvider::new(Duration::from_millis(50));

        let start = Instant::now();
        provider.query_root().await.unwrap();
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn delegates_to_inner_mock_provider() {
        let provider = SlowSignalProvider::wrap(
            MockSignalProvider::new().with_emulator(true),
            Duration::from_millis(1),
        );

        assert!(provider.query_emulator().await.unwrap().is_emulator);
        assert_eq!(provider.inner().calls().emulator, 1);
    }
}
