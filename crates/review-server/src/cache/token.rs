//! Change tokens used to expire cache entries by region or dimension.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

struct Signal {
    fired: AtomicBool,
    parent: Option<ChangeToken>,
    label: String,
}

/// Señal de cambio one-shot.
///
/// Un token se dispara una sola vez y nunca vuelve a su estado inicial.
/// Los tokens de dimension tienen como padre el token global vigente de su
/// region al momento de crearse, asi que disparar el global los vuelve
/// stale tambien.
///
/// Clonar un token comparte la misma señal.
#[derive(Clone)]
pub struct ChangeToken {
    signal: Arc<Signal>,
}

impl ChangeToken {
    pub(crate) fn new(label: impl Into<String>) -> Self {
        Self {
            signal: Arc::new(Signal {
                fired: AtomicBool::new(false),
                parent: None,
                label: label.into(),
            }),
        }
    }

    pub(crate) fn child(&self, label: impl Into<String>) -> Self {
        Self {
            signal: Arc::new(Signal {
                fired: AtomicBool::new(false),
                parent: Some(self.clone()),
                label: label.into(),
            }),
        }
    }

    /// True si este token o su padre ya se dispararon.
    pub fn has_changed(&self) -> bool {
        if self.signal.fired.load(Ordering::Acquire) {
            return true;
        }
        self.signal
            .parent
            .as_ref()
            .is_some_and(ChangeToken::has_changed)
    }

    /// Dispara el token. Retorna false si ya estaba disparado.
    pub(crate) fn fire(&self) -> bool {
        !self.signal.fired.swap(true, Ordering::AcqRel)
    }

    /// Etiqueta para logs, por ejemplo `CustomerReview/user:42`.
    pub fn label(&self) -> &str {
        &self.signal.label
    }

    /// True si alguien mas (una entrada de cache, un calculo en curso)
    /// tiene un clon de este token.
    pub(crate) fn is_shared(&self) -> bool {
        Arc::strong_count(&self.signal) > 1
    }

    /// True si ambos tokens comparten la misma señal.
    pub fn same_signal(&self, other: &ChangeToken) -> bool {
        Arc::ptr_eq(&self.signal, &other.signal)
    }
}

impl fmt::Debug for ChangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeToken")
            .field("label", &self.label())
            .field("changed", &self.has_changed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_fires_once() {
        let token = ChangeToken::new("r");
        assert!(!token.has_changed());

        assert!(token.fire());
        assert!(token.has_changed());
        assert!(!token.fire());
        assert!(token.has_changed());
    }

    #[test]
    fn test_clones_share_signal() {
        let token = ChangeToken::new("r");
        let clone = token.clone();
        assert!(token.same_signal(&clone));

        token.fire();
        assert!(clone.has_changed());
    }

    #[test]
    fn test_parent_fire_propagates_to_child() {
        let parent = ChangeToken::new("r");
        let child = parent.child("r/user:1");

        parent.fire();
        assert!(child.has_changed());
    }

    #[test]
    fn test_child_fire_does_not_affect_parent() {
        let parent = ChangeToken::new("r");
        let child = parent.child("r/user:1");

        child.fire();
        assert!(child.has_changed());
        assert!(!parent.has_changed());
    }
}
