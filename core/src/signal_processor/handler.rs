use super::signal::GameSignal;

/// Trait for systems that react to classification signals.
/// Implement this for overlays, caches, or anything that mirrors registry state.
pub trait SignalHandler {
    /// Handle a single signal
    fn handle_signal(&mut self, signal: &GameSignal);

    /// Handle multiple signals (default implementation calls handle_signal for each)
    fn handle_signals(&mut self, signals: &[GameSignal]) {
        for signal in signals {
            self.handle_signal(signal);
        }
    }
}
