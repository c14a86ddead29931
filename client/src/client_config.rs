/// Contains Config properties which will be used by a Client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Number of received states held back so that the state being applied
    /// always has a following state to interpolate towards
    pub min_buffer_size: usize,
    /// Depth the buffer is drained back to once it grows past
    /// `max_buffer_size`
    pub target_buffer_size: usize,
    /// Past this depth the client applies several states in one call to
    /// catch up
    pub max_buffer_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            min_buffer_size: 1,
            target_buffer_size: 2,
            max_buffer_size: 8,
        }
    }
}

impl ClientConfig {
    /// Applies every buffered state immediately, with no interpolation lag
    pub fn immediate() -> Self {
        Self {
            min_buffer_size: 0,
            target_buffer_size: 0,
            max_buffer_size: 0,
        }
    }
}
