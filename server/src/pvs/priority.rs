use std::cmp::Ordering;

/// Coarse ordering of entities competing for a session's payload budget
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriorityClass {
    /// Attached and override entities
    Always,
    /// Entities that did not fit last tick
    Deferred,
    /// Everything else in view, nearest first
    InView,
}

/// Lower sorts first
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Priority {
    pub class: PriorityClass,
    /// Squared distance to the nearest eye on the same map
    pub distance_squared: f32,
}

impl Priority {
    pub fn new(class: PriorityClass, distance_squared: f32) -> Self {
        Self {
            class,
            distance_squared,
        }
    }

    /// Keeps the more urgent of two priorities
    pub fn merge(self, other: Priority) -> Priority {
        if other.cmp_urgency(&self) == Ordering::Less {
            other
        } else {
            self
        }
    }

    pub fn cmp_urgency(&self, other: &Priority) -> Ordering {
        self.class
            .cmp(&other.class)
            .then(self.distance_squared.total_cmp(&other.distance_squared))
    }
}
