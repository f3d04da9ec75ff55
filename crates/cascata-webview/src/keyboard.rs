//! Keyboard event routing for engines that need host-side key capture.
//!
//! Some platforms deliver keyboard input through a single process-wide
//! hook shared by every plugin instance loaded into the host. The router
//! makes that sharing explicit: registrations are keyed by native window
//! handle, the hook backend is installed when the first instance registers
//! and removed when the last registration drops, and events are routed
//! through the registry instead of pointers stashed in OS-owned storage.

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam_channel::Sender;
use parking_lot::Mutex;

use crate::error::Result;
use crate::protocol::KeyEvent;

/// Platform hook lifecycle. Implementations install whatever OS facility
/// captures keyboard input destined for plugin windows.
pub trait HookBackend: Send {
    fn install(&mut self) -> Result<()>;
    fn remove(&mut self);
}

struct RouterInner<B: HookBackend> {
    backend: B,
    sinks: HashMap<u64, Sender<KeyEvent>>,
}

/// Process-wide registry mapping window handles to key event sinks.
///
/// Cloning shares the registry; the platform layer owns one router per
/// hook backend and hands clones to each plugin instance.
pub struct KeyboardRouter<B: HookBackend> {
    inner: Arc<Mutex<RouterInner<B>>>,
}

impl<B: HookBackend> Clone for KeyboardRouter<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: HookBackend> KeyboardRouter<B> {
    pub fn new(backend: B) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RouterInner {
                backend,
                sinks: HashMap::new(),
            })),
        }
    }

    /// Register a sink for events targeting `window_handle`. The hook
    /// backend is installed on the first live registration.
    pub fn register(
        &self,
        window_handle: u64,
        sink: Sender<KeyEvent>,
    ) -> Result<KeyboardRegistration<B>> {
        let mut inner = self.inner.lock();
        if inner.sinks.is_empty() {
            inner.backend.install()?;
        }
        if inner.sinks.insert(window_handle, sink).is_some() {
            tracing::warn!("replacing keyboard sink for window {window_handle:#x}");
        }
        Ok(KeyboardRegistration {
            router: self.clone(),
            window_handle,
        })
    }

    /// Deliver an event captured by the hook. Returns whether a sink for
    /// the window was found (unclaimed events belong to someone else's
    /// windows and must be passed along by the hook).
    pub fn route(&self, window_handle: u64, event: KeyEvent) -> bool {
        let inner = self.inner.lock();
        match inner.sinks.get(&window_handle) {
            Some(sink) => sink.send(event).is_ok(),
            None => false,
        }
    }

    fn unregister(&self, window_handle: u64) {
        let mut inner = self.inner.lock();
        inner.sinks.remove(&window_handle);
        if inner.sinks.is_empty() {
            inner.backend.remove();
        }
    }
}

/// Live registration. Dropping it removes the sink; the hook backend is
/// removed with the last registration.
pub struct KeyboardRegistration<B: HookBackend> {
    router: KeyboardRouter<B>,
    window_handle: u64,
}

impl<B: HookBackend> KeyboardRegistration<B> {
    pub fn window_handle(&self) -> u64 {
        self.window_handle
    }
}

impl<B: HookBackend> Drop for KeyboardRegistration<B> {
    fn drop(&mut self) {
        self.router.unregister(self.window_handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Clone, Default)]
    struct CountingBackend {
        installs: Arc<AtomicU32>,
        removals: Arc<AtomicU32>,
    }

    impl HookBackend for CountingBackend {
        fn install(&mut self) -> Result<()> {
            self.installs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn remove(&mut self) {
            self.removals.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn key(code: u32) -> KeyEvent {
        KeyEvent {
            press: true,
            key_code: code,
            hardware_code: 0,
            modifiers: Default::default(),
        }
    }

    #[test]
    fn test_install_on_first_remove_on_last() {
        let backend = CountingBackend::default();
        let installs = Arc::clone(&backend.installs);
        let removals = Arc::clone(&backend.removals);
        let router = KeyboardRouter::new(backend);

        let (tx_a, _rx_a) = unbounded();
        let (tx_b, _rx_b) = unbounded();
        let reg_a = router.register(1, tx_a).unwrap();
        assert_eq!(installs.load(Ordering::SeqCst), 1);
        let reg_b = router.register(2, tx_b).unwrap();
        assert_eq!(installs.load(Ordering::SeqCst), 1);

        drop(reg_a);
        assert_eq!(removals.load(Ordering::SeqCst), 0);
        drop(reg_b);
        assert_eq!(removals.load(Ordering::SeqCst), 1);

        // A later registration re-installs.
        let (tx, _rx) = unbounded();
        let _reg = router.register(3, tx).unwrap();
        assert_eq!(installs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_routes_by_window_handle() {
        let router = KeyboardRouter::new(CountingBackend::default());
        let (tx_a, rx_a) = unbounded();
        let (tx_b, rx_b) = unbounded();
        let _reg_a = router.register(10, tx_a).unwrap();
        let _reg_b = router.register(20, tx_b).unwrap();

        assert!(router.route(10, key(65)));
        assert!(router.route(20, key(66)));
        assert!(!router.route(30, key(67)));

        assert_eq!(rx_a.try_recv().unwrap().key_code, 65);
        assert_eq!(rx_b.try_recv().unwrap().key_code, 66);
        assert!(rx_a.try_recv().is_err());
    }

    #[test]
    fn test_unregistered_window_is_unclaimed() {
        let router = KeyboardRouter::new(CountingBackend::default());
        let (tx, _rx) = unbounded();
        let reg = router.register(5, tx).unwrap();
        drop(reg);
        assert!(!router.route(5, key(65)));
    }
}
