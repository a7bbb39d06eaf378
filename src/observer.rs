//! Lifecycle callbacks for controllers and loggers.

use crate::error::Result;
use crate::tree::ModelTree;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Receives a model's lifecycle notifications.
///
/// Implement this trait to drive or record a model. All methods have
/// default no-op implementations. The tree is lent for the duration of the
/// call only; observers index actuators by position rather than holding
/// references across steps.
pub trait ModelObserver {
    /// Called once the model has been compiled (or when attached to an
    /// already built model).
    fn on_setup(&mut self, _model: &mut ModelTree) -> Result<()> {
        Ok(())
    }

    /// Called every step, before cables apply their forces.
    fn on_step(&mut self, _model: &mut ModelTree, _dt: f32) -> Result<()> {
        Ok(())
    }

    /// Called before the model releases its entities.
    fn on_teardown(&mut self, _model: &mut ModelTree) -> Result<()> {
        Ok(())
    }
}

/// Shared, caller-owned observer.
pub type SharedObserver = Rc<RefCell<dyn ModelObserver>>;

/// Non-owning handle a model keeps for each attached observer.
pub type ObserverHandle = Weak<RefCell<dyn ModelObserver>>;

/// An observer that does nothing.
pub struct NoOpObserver;

impl ModelObserver for NoOpObserver {}
