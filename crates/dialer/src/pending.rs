//! Correlates a placed outbound call with the media gateway that shows up
//! later when the telephony provider's transport actually connects
//! (§4.8 step 3: "when the media gateway connects, instantiate the Voice
//! Pipeline"). The binary's webhook/websocket accept handler resolves the
//! entry once it has bridged the provider's transport into a
//! [`vc_media::MediaGateway`]; the worker blocks on the receiver with a
//! timeout.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use vc_media::MediaGateway;

#[derive(Default)]
pub struct PendingCallRegistry {
    pending: Mutex<HashMap<String, oneshot::Sender<Arc<dyn MediaGateway>>>>,
}

impl PendingCallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `provider_call_id`'s gateway, returning the
    /// receiving half for the dialer worker to await.
    pub fn register(&self, provider_call_id: String) -> oneshot::Receiver<Arc<dyn MediaGateway>> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(provider_call_id, tx);
        rx
    }

    /// Called from the transport-accept handler once a gateway for
    /// `provider_call_id` is bridged. Returns `false` if nothing was
    /// waiting (e.g. the worker already timed out and gave up).
    pub fn resolve(&self, provider_call_id: &str, gateway: Arc<dyn MediaGateway>) -> bool {
        match self.pending.lock().remove(provider_call_id) {
            Some(tx) => tx.send(gateway).is_ok(),
            None => false,
        }
    }

    /// Drop a registration the worker gave up waiting on.
    pub fn cancel(&self, provider_call_id: &str) {
        self.pending.lock().remove(provider_call_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc_domain::error::Result;
    use vc_domain::audio::AudioChunk;

    struct StubGateway;
    #[async_trait::async_trait]
    impl MediaGateway for StubGateway {
        async fn receive_audio(&self) -> Result<Option<AudioChunk>> {
            Ok(None)
        }
        async fn send_audio(&self, _chunk: AudioChunk) {}
        fn cancel_playback(&self) {}
        async fn close(&self) {}
    }

    #[tokio::test]
    async fn resolve_delivers_the_gateway_to_the_waiting_receiver() {
        let registry = PendingCallRegistry::new();
        let rx = registry.register("provider-call-1".into());
        assert!(registry.resolve("provider-call-1", Arc::new(StubGateway)));
        assert!(rx.await.is_ok());
    }

    #[test]
    fn resolve_with_no_registration_returns_false() {
        let registry = PendingCallRegistry::new();
        assert!(!registry.resolve("nobody-waiting", Arc::new(StubGateway)));
    }

    #[test]
    fn cancel_drops_the_pending_sender() {
        let registry = PendingCallRegistry::new();
        let _rx = registry.register("provider-call-1".into());
        registry.cancel("provider-call-1");
        assert!(!registry.resolve("provider-call-1", Arc::new(StubGateway)));
    }
}
