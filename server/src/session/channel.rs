use vantage_shared::Tick;

/// The transport a session's game states travel over. The PVS only needs
/// the receiver's acknowledgement watermark and a way to hand off payloads.
pub trait NetChannel: Send {
    /// Latest tick the receiver has confirmed, `None` until the first ack
    fn last_acknowledged_tick(&self) -> Option<Tick>;

    /// Queues a serialized game state. Must not block.
    fn send(&mut self, payload: Vec<u8>);
}
