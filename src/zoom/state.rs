use crate::system::EntityId;

/// The three interaction identifiers shared across the canvas.
///
/// Each field has one writer: hover belongs to the pointer handlers, selection to
/// the selection handlers and expansion to [`super::ExpansionController`]. The
/// expansion setters are therefore only visible inside the zoom module.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InteractionState {
    hovered: Option<EntityId>,
    expanded: Option<EntityId>,
    selected: Option<EntityId>,
}

impl InteractionState {
    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn expanded(&self) -> Option<&str> {
        self.expanded.as_deref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_hovered(&self, id: &str) -> bool {
        self.hovered.as_deref() == Some(id)
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.as_deref() == Some(id)
    }

    pub fn set_hovered(&mut self, id: Option<EntityId>) {
        self.hovered = id;
    }

    pub fn set_selected(&mut self, id: Option<EntityId>) {
        self.selected = id;
    }

    /// Replaces any previous lock.
    pub(super) fn lock_expanded(&mut self, id: &str) -> Option<EntityId> {
        self.expanded.replace(id.to_owned())
    }

    /// Clears the lock only while it still belongs to `id`.
    pub(super) fn release_expanded_if(&mut self, id: &str) -> bool {
        if self.expanded.as_deref() == Some(id) {
            self.expanded = None;
            true
        } else {
            false
        }
    }

    pub(super) fn take_expanded(&mut self) -> Option<EntityId> {
        self.expanded.take()
    }
}

/// A value with a revision counter, so readers can notice changes without
/// registering callbacks.
#[derive(Clone, Debug)]
pub struct Published<T> {
    value: Option<T>,
    revision: u64,
}

impl<T> Published<T> {
    pub fn new() -> Self {
        Self {
            value: None,
            revision: 0,
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn publish(&mut self, value: T) {
        self.value = Some(value);
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        if self.value.is_some() {
            self.value = None;
            self.revision = self.revision.wrapping_add(1);
        }
    }
}

impl<T> Default for Published<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Two-phase cell: pending until the first value arrives, then resolved for good.
///
/// Later non-empty values replace the resolved one; an empty source never
/// sends it back to pending.
#[derive(Clone, Debug, PartialEq)]
pub enum Latch<T> {
    Pending,
    Resolved(T),
}

impl<T: Clone> Latch<T> {
    /// Starts from the source's current value, like a synchronous initial read.
    pub fn from_current(source: &Published<T>) -> (Self, u64) {
        let latch = match source.get() {
            Some(value) => Latch::Resolved(value.clone()),
            None => Latch::Pending,
        };
        (latch, source.revision())
    }

    /// Applies the source if it changed since `seen_revision`. Returns true
    /// when the latched value changed.
    pub fn follow(&mut self, source: &Published<T>, seen_revision: &mut u64) -> bool {
        if source.revision() == *seen_revision {
            return false;
        }
        *seen_revision = source.revision();

        match source.get() {
            Some(value) => {
                *self = Latch::Resolved(value.clone());
                true
            }
            None => false,
        }
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Latch::Pending => None,
            Latch::Resolved(value) => Some(value),
        }
    }

    #[cfg(test)]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Latch::Resolved(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_only_clears_own_lock() {
        let mut state = InteractionState::default();
        state.lock_expanded("orders");

        assert!(!state.release_expanded_if("payments"));
        assert_eq!(state.expanded(), Some("orders"));
        assert!(state.release_expanded_if("orders"));
        assert_eq!(state.expanded(), None);
        assert!(!state.release_expanded_if("orders"));
    }

    #[test]
    fn locking_supersedes_previous_entity() {
        let mut state = InteractionState::default();

        assert_eq!(state.lock_expanded("a"), None);
        assert_eq!(state.lock_expanded("b"), Some("a".to_owned()));
        assert!(state.is_expanded("b"));
        assert!(!state.is_expanded("a"));
    }

    #[test]
    fn latch_survives_source_clearing() {
        let mut source = Published::new();
        let (mut latch, mut seen) = Latch::from_current(&source);
        assert!(!latch.is_resolved());

        assert!(!latch.follow(&source, &mut seen));

        source.publish(vec![1.0_f32]);
        assert!(latch.follow(&source, &mut seen));
        assert_eq!(latch.get(), Some(&vec![1.0]));

        source.clear();
        assert!(!latch.follow(&source, &mut seen));
        assert_eq!(latch.get(), Some(&vec![1.0]));

        source.publish(vec![2.0]);
        assert!(latch.follow(&source, &mut seen));
        assert_eq!(latch.get(), Some(&vec![2.0]));
    }

    #[test]
    fn latch_reads_initial_value() {
        let mut source = Published::new();
        source.publish("ready");

        let (latch, seen) = Latch::from_current(&source);
        assert_eq!(latch.get(), Some(&"ready"));
        assert_eq!(seen, source.revision());
    }
}
