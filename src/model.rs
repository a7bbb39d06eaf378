//! The observable model: lifecycle state machine around a compiled tree.
//!
//! A [`TensegrityModel`] owns the recipe (structure + build spec) and, once
//! set up, the compiled [`ModelTree`]. Observers are attached as weak
//! handles; the caller keeps them alive.
//!
//! ```text
//! Unbuilt --setup--> Built --teardown--> TornDown
//!    ^                 |
//!    +-----reset-------+
//! ```

use crate::build_spec::BuildSpec;
use crate::compiler::StructureCompiler;
use crate::error::{Result, TensegrityError};
use crate::observer::{ModelObserver, ObserverHandle, SharedObserver};
use crate::structure::Structure;
use crate::tree::ModelTree;
use crate::world::PhysicsWorld;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Lifecycle state of a [`TensegrityModel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelState {
    Unbuilt,
    Built,
    TornDown,
}

/// A tensegrity model that compiles itself on setup and notifies observers.
pub struct TensegrityModel {
    structure: Structure,
    spec: BuildSpec,
    state: ModelState,
    tree: Option<ModelTree>,
    observers: Vec<ObserverHandle>,
    /// Set when an observer failed `on_setup`; cleared by teardown.
    setup_failed: bool,
}

impl TensegrityModel {
    /// Creates an Unbuilt model. Nothing touches a world until [`setup`](Self::setup).
    pub fn new(structure: Structure, spec: BuildSpec) -> Self {
        Self {
            structure,
            spec,
            state: ModelState::Unbuilt,
            tree: None,
            observers: Vec::new(),
            setup_failed: false,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ModelState {
        self.state
    }

    /// The recipe this model compiles.
    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    /// The compiled tree; `Some` only while Built.
    pub fn tree(&self) -> Option<&ModelTree> {
        self.tree.as_ref()
    }

    pub fn tree_mut(&mut self) -> Option<&mut ModelTree> {
        self.tree.as_mut()
    }

    /// Number of observers still alive.
    pub fn observer_count(&self) -> usize {
        self.observers.iter().filter(|o| o.strong_count() > 0).count()
    }

    /// Attaches an observer without taking ownership of it.
    ///
    /// Allowed while Unbuilt or Built. Attaching to a Built model runs the
    /// observer's `on_setup` immediately, so every observer sees exactly one
    /// setup per build regardless of when it was attached. Attaching an
    /// observer that is already attached does nothing.
    pub fn attach<O: ModelObserver + 'static>(&mut self, observer: &Rc<RefCell<O>>) -> Result<()> {
        if self.state == ModelState::TornDown {
            return Err(TensegrityError::InvalidState {
                operation: "attach",
                state: self.state,
            });
        }

        let shared: SharedObserver = observer.clone();
        let handle = Rc::downgrade(&shared);
        if self.observers.iter().any(|o| Weak::ptr_eq(o, &handle)) {
            debug!("observer already attached; ignoring");
            return Ok(());
        }
        if let Some(tree) = self.tree.as_mut() {
            let mut guard = shared.try_borrow_mut().map_err(|_| TensegrityError::ObserverBusy)?;
            guard.on_setup(tree)?;
        }
        self.observers.push(handle);
        Ok(())
    }

    /// Detaches `observer`. Returns `false` if it was not attached.
    pub fn detach<O: ModelObserver + 'static>(&mut self, observer: &Rc<RefCell<O>>) -> bool {
        let shared: SharedObserver = observer.clone();
        let target = Rc::downgrade(&shared);
        let before = self.observers.len();
        self.observers.retain(|o| !Weak::ptr_eq(o, &target));
        before != self.observers.len()
    }

    /// Compiles the model into `world` and notifies observers in attachment order.
    ///
    /// A compilation failure leaves the model Unbuilt and the world
    /// untouched. Every observer is notified even if an earlier one fails;
    /// the first failure is returned and the model stays Built so that
    /// [`teardown`](Self::teardown) can still release it, but refuses to
    /// [`step`](Self::step) until it has been torn down or reset.
    pub fn setup<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> Result<()> {
        if self.state != ModelState::Unbuilt {
            return Err(TensegrityError::InvalidState {
                operation: "setup",
                state: self.state,
            });
        }

        let tree = StructureCompiler::new(&self.structure, &self.spec).compile(world)?;
        let tree = self.tree.insert(tree);
        self.state = ModelState::Built;
        debug!("model built; notifying {} observers", self.observers.len());

        let notified = notify(&mut self.observers, tree, false, |o, t| o.on_setup(t));
        self.setup_failed = notified.is_err();
        notified
    }

    /// Advances the model by `dt`.
    ///
    /// Cached poses are refreshed, observers run (and may command cables),
    /// then every cable applies its tension. World integration is left to
    /// the caller, so commands never apply retroactively to this step.
    pub fn step<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, dt: f32) -> Result<()> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(TensegrityError::NonPositiveTimestep { dt });
        }
        let state = self.state;
        if self.setup_failed {
            return Err(TensegrityError::InvalidState {
                operation: "step",
                state,
            });
        }
        let Some(tree) = self.tree.as_mut() else {
            return Err(TensegrityError::InvalidState {
                operation: "step",
                state,
            });
        };

        tree.sense(world);
        notify(&mut self.observers, tree, true, |o, t| o.on_step(t, dt))?;
        tree.step(world, dt);
        Ok(())
    }

    /// Notifies observers, then releases every entity.
    ///
    /// Every observer is notified even if an earlier one fails, and the
    /// entities are released regardless; the first observer error is
    /// returned. Calling this on a TornDown or Unbuilt model does nothing.
    pub fn teardown<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> Result<()> {
        let Some(mut tree) = self.tree.take() else {
            return Ok(());
        };

        let notified = notify(&mut self.observers, &mut tree, false, |o, t| o.on_teardown(t));
        tree.release(world);
        self.state = ModelState::TornDown;
        self.setup_failed = false;
        info!("model [{}] torn down", self.structure.tags);
        notified
    }

    /// Tears the model down and builds it again, keeping attached observers.
    pub fn reset<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> Result<()> {
        self.teardown(world)?;
        self.state = ModelState::Unbuilt;
        self.setup(world)
    }
}

impl std::fmt::Debug for TensegrityModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TensegrityModel")
            .field("state", &self.state)
            .field("tree", &self.tree)
            .field("observers", &self.observers.len())
            .field("setup_failed", &self.setup_failed)
            .finish()
    }
}

/// Calls `f` on every live observer in attachment order, pruning dropped ones.
///
/// With `stop_on_error` the first failure aborts the walk; otherwise every
/// observer runs and the first failure is reported at the end.
fn notify(
    observers: &mut Vec<ObserverHandle>,
    tree: &mut ModelTree,
    stop_on_error: bool,
    mut f: impl FnMut(&mut dyn ModelObserver, &mut ModelTree) -> Result<()>,
) -> Result<()> {
    let before = observers.len();
    observers.retain(|o| o.strong_count() > 0);
    if observers.len() != before {
        warn!("dropped {} observers that no longer exist", before - observers.len());
    }

    let mut first_error = None;
    for handle in observers.iter() {
        let Some(observer) = handle.upgrade() else {
            continue;
        };
        let result = match observer.try_borrow_mut() {
            Ok(mut guard) => f(&mut *guard, tree),
            Err(_) => Err(TensegrityError::ObserverBusy),
        };
        if let Err(e) = result {
            if stop_on_error {
                return Err(e);
            }
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
