//! ClassRegistry - the process-wide class cache.
//!
//! Every class that takes part in a run is entered exactly once, keyed by its
//! qualified name, into an arena of slots addressed by [`ClassId`]. A slot
//! holds the class's [`ClassRef`] (available as soon as the class is entered),
//! its descriptor, and the state of its model.
//!
//! # Phases
//!
//! ```text
//! Collecting ──begin_finalize──▶ Finalizing ──begin_emitting──▶ Emitting
//! ```
//!
//! - **Collecting**: classes may be registered; resolving an unknown name asks
//!   the [`ClassSource`] and registers the class lazily.
//! - **Finalizing**: models are built. Resolving an unknown name is fatal.
//! - **Emitting**: read-only.
//!
//! The registry is single-writer: every mutation goes through `&mut self`, so a
//! class can never be constructed twice and re-entrant lookups during model
//! construction observe the slot that is already there.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serbridge_core::{ClassDescriptor, ClassKind, ClassRef, QualifiedName, RegistrationError};

use crate::{ClassSource, InheritanceGraph};

/// Stable arena index of a registered class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Registry phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Collecting,
    Finalizing,
    Emitting,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Collecting => "collecting",
            Phase::Finalizing => "finalizing",
            Phase::Emitting => "emitting",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Construction state of a class model.
#[derive(Debug)]
pub enum ModelState<M> {
    /// Not started.
    Pending,
    /// Under construction.
    Building,
    /// Built and immutable.
    Ready(Arc<M>),
}

struct ClassSlot<M> {
    class: ClassRef,
    descriptor: Option<Arc<ClassDescriptor>>,
    /// Builtin top-type placeholder; may be replaced once by a real descriptor.
    placeholder: bool,
    state: ModelState<M>,
}

/// Arena of classes and their models.
pub struct ClassRegistry<M> {
    slots: Vec<ClassSlot<M>>,
    by_name: FxHashMap<QualifiedName, ClassId>,
    phase: Phase,
    top_type: QualifiedName,
    inheritance: InheritanceGraph,
}

impl<M> ClassRegistry<M> {
    /// Create a registry holding the builtin primitives and the top type.
    pub fn new<S: AsRef<str>>(top_type: QualifiedName, primitives: &[S]) -> Self {
        let mut registry = Self {
            slots: Vec::new(),
            by_name: FxHashMap::default(),
            phase: Phase::Collecting,
            top_type: top_type.clone(),
            inheritance: InheritanceGraph::new(),
        };
        for primitive in primitives {
            registry.insert(ClassRef::primitive(primitive.as_ref()), None, false);
        }
        let top = ClassDescriptor::class(top_type);
        registry.insert(top.class_ref(), Some(Arc::new(top)), true);
        registry
    }

    fn insert(
        &mut self,
        class: ClassRef,
        descriptor: Option<Arc<ClassDescriptor>>,
        placeholder: bool,
    ) -> ClassId {
        let id = ClassId(self.slots.len() as u32);
        self.by_name.insert(class.name().clone(), id);
        self.slots.push(ClassSlot {
            class,
            descriptor,
            placeholder,
            state: ModelState::Pending,
        });
        self.inheritance.add_class(id);
        id
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The universal top type.
    pub fn top_type(&self) -> &QualifiedName {
        &self.top_type
    }

    fn require_phase(
        &self,
        expected: Phase,
        operation: &'static str,
    ) -> Result<(), RegistrationError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(RegistrationError::PhaseViolation {
                operation,
                phase: self.phase.as_str(),
            })
        }
    }

    /// Enter a class. Registering an identical descriptor twice is a no-op.
    pub fn register(&mut self, descriptor: ClassDescriptor) -> Result<ClassId, RegistrationError> {
        self.require_phase(Phase::Collecting, "register classes")?;

        if let Some(&id) = self.by_name.get(&descriptor.name) {
            let slot = &mut self.slots[id.index()];
            if slot.placeholder {
                tracing::debug!(
                    target: "serbridge.registry",
                    class = %descriptor.name,
                    "replacing builtin top type descriptor"
                );
                slot.class = descriptor.class_ref();
                slot.descriptor = Some(Arc::new(descriptor));
                slot.placeholder = false;
                return Ok(id);
            }
            return match &slot.descriptor {
                Some(existing) if **existing == descriptor => Ok(id),
                _ => Err(RegistrationError::DuplicateClass(descriptor.name.to_string())),
            };
        }

        tracing::debug!(
            target: "serbridge.registry",
            class = %descriptor.name,
            kind = ?descriptor.kind,
            "registered class"
        );
        Ok(self.insert(descriptor.class_ref(), Some(Arc::new(descriptor)), false))
    }

    /// Resolve `name` to its class, registering it from `source` while collecting.
    pub fn resolve(
        &mut self,
        name: &QualifiedName,
        source: &dyn ClassSource,
    ) -> Result<ClassRef, RegistrationError> {
        if let Some(&id) = self.by_name.get(name) {
            return Ok(self.slots[id.index()].class.clone());
        }
        if self.phase != Phase::Collecting {
            return Err(RegistrationError::NotRegistered {
                name: name.to_string(),
            });
        }
        let descriptor = source
            .find(name)
            .ok_or_else(|| RegistrationError::ClassNotFound(name.to_string()))?;
        if descriptor.name != *name {
            return Err(RegistrationError::ClassNotFound(name.to_string()));
        }
        tracing::debug!(
            target: "serbridge.registry",
            class = %name,
            "lazily discovered referenced class"
        );
        let id = self.register(descriptor)?;
        Ok(self.slots[id.index()].class.clone())
    }

    /// Look up a class id by name.
    pub fn lookup(&self, name: &QualifiedName) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// Look up a class reference by name.
    pub fn class_by_name(&self, name: &QualifiedName) -> Option<&ClassRef> {
        self.lookup(name).map(|id| &self.slots[id.index()].class)
    }

    pub fn class_ref(&self, id: ClassId) -> &ClassRef {
        &self.slots[id.index()].class
    }

    /// The descriptor of a class; `None` for builtin primitives.
    pub fn descriptor(&self, id: ClassId) -> Option<&Arc<ClassDescriptor>> {
        self.slots[id.index()].descriptor.as_ref()
    }

    /// Whether the class carries a descriptor (is not a builtin primitive).
    pub fn has_descriptor(&self, id: ClassId) -> bool {
        self.slots[id.index()].descriptor.is_some()
    }

    /// All class ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.slots.len() as u32).map(ClassId)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Record a direct inheritance relation.
    pub fn add_inheritance(
        &mut self,
        supertype: ClassId,
        subtype: ClassId,
    ) -> Result<(), RegistrationError> {
        if self.slots[supertype.index()].class.is_primitive() {
            return Err(RegistrationError::InvalidSupertype {
                class: self.slots[subtype.index()].class.name().to_string(),
                supertype: self.slots[supertype.index()].class.name().to_string(),
                reason: "primitive types cannot be inherited".to_string(),
            });
        }
        self.inheritance.add_edge(supertype, subtype);
        Ok(())
    }

    pub fn inheritance(&self) -> &InheritanceGraph {
        &self.inheritance
    }

    /// Classes with descriptors, supertypes first.
    pub fn build_order(&self) -> Result<Vec<ClassId>, RegistrationError> {
        let order = self.inheritance.build_order().map_err(|culprit| {
            let culprit = self.slots[culprit.index()].class.name();
            RegistrationError::CircularInheritance(culprit.to_string())
        })?;
        Ok(order
            .into_iter()
            .filter(|&id| self.has_descriptor(id))
            .collect())
    }

    /// Collecting → Finalizing.
    pub fn begin_finalize(&mut self) -> Result<(), RegistrationError> {
        self.require_phase(Phase::Collecting, "begin finalizing")?;
        self.phase = Phase::Finalizing;
        tracing::debug!(target: "serbridge.registry", classes = self.slots.len(), "finalizing");
        Ok(())
    }

    /// Finalizing → Emitting.
    pub fn begin_emitting(&mut self) -> Result<(), RegistrationError> {
        self.require_phase(Phase::Finalizing, "begin emitting")?;
        self.phase = Phase::Emitting;
        tracing::debug!(target: "serbridge.registry", "emitting");
        Ok(())
    }

    /// Mark a model as under construction.
    ///
    /// Entering a model that is already being built means the class depends on
    /// itself through its supertypes.
    pub fn begin_build(&mut self, id: ClassId) -> Result<(), RegistrationError> {
        self.require_phase(Phase::Finalizing, "build class models")?;
        let slot = &mut self.slots[id.index()];
        match slot.state {
            ModelState::Pending => {
                slot.state = ModelState::Building;
                Ok(())
            }
            ModelState::Building => Err(RegistrationError::CircularInheritance(
                slot.class.name().to_string(),
            )),
            ModelState::Ready(_) => Err(RegistrationError::DuplicateClass(
                slot.class.name().to_string(),
            )),
        }
    }

    /// Store a finished model.
    pub fn complete(&mut self, id: ClassId, model: M) -> Result<Arc<M>, RegistrationError> {
        self.require_phase(Phase::Finalizing, "build class models")?;
        let model = Arc::new(model);
        self.slots[id.index()].state = ModelState::Ready(Arc::clone(&model));
        Ok(model)
    }

    /// Abandon a model under construction.
    pub fn abort_build(&mut self, id: ClassId) {
        let slot = &mut self.slots[id.index()];
        if matches!(slot.state, ModelState::Building) {
            slot.state = ModelState::Pending;
        }
    }

    pub fn state(&self, id: ClassId) -> &ModelState<M> {
        &self.slots[id.index()].state
    }

    /// The built model of a class, if ready.
    pub fn model(&self, id: ClassId) -> Option<&Arc<M>> {
        match &self.slots[id.index()].state {
            ModelState::Ready(model) => Some(model),
            _ => None,
        }
    }

    /// The built model of a class by name, if ready.
    pub fn model_by_name(&self, name: &QualifiedName) -> Option<&Arc<M>> {
        self.lookup(name).and_then(|id| self.model(id))
    }

    /// Whether `id` is a builtin primitive.
    pub fn is_primitive(&self, id: ClassId) -> bool {
        self.slots[id.index()].class.kind() == ClassKind::Primitive
    }
}

impl<M> fmt::Debug for ClassRegistry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("phase", &self.phase)
            .field("classes", &self.slots.len())
            .finish()
    }
}
