//! Override Engine
//!
//! Replaceable entries on host surfaces. A [`MethodSlot`] holds one function
//! entry and an [`AccessorSlot`] holds a getter/setter pair. Overriding a slot
//! captures the entry present at install time as the *original* and installs
//! a wrapper that receives `(original, receiver, args)`.
//!
//! Guarantees:
//! - the original handed to a wrapper is always the pre-override entry;
//! - a slot is wrapped at most once, so one [`MethodSlot::restore`] recovers
//!   the native entry;
//! - while a wrapper runs for a receiver, nested calls through the same slot
//!   on that receiver go straight to the original. Calls on other receivers
//!   are still intercepted.
//!
//! [`ArmLedger`] adds the module-level half of the idempotency contract: each
//! surface key is installed by a one-shot token.
//!
//! Every successful install is recorded as a [`Wrapped`] entry while an
//! install log is open (see [`record_installs`]).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::error::{HookError, Result};
use crate::host::Receiver;

/// A host function entry: `(receiver, args) -> output`.
pub type NativeFn<A, O> = Rc<dyn Fn(&Receiver, A) -> Result<O>>;

/// Read side of an accessor.
pub type Getter<T> = Rc<dyn Fn(&Receiver) -> Result<T>>;

/// Write side of an accessor.
pub type Setter<T> = Rc<dyn Fn(&Receiver, T) -> Result<()>>;

struct Entry<F: ?Sized> {
    current: RefCell<Option<Rc<F>>>,
    /// Set once the entry is wrapped; holds the pre-override entry.
    original: RefCell<Option<Rc<F>>>,
}

impl<F: ?Sized> Entry<F> {
    fn empty() -> Self {
        Self {
            current: RefCell::new(None),
            original: RefCell::new(None),
        }
    }

    fn current(&self) -> Option<Rc<F>> {
        self.current.borrow().clone()
    }

    fn native(&self) -> Option<Rc<F>> {
        self.original.borrow().clone().or_else(|| self.current())
    }

    fn is_present(&self) -> bool {
        self.current.borrow().is_some()
    }

    fn is_wrapped(&self) -> bool {
        self.original.borrow().is_some()
    }

    fn define(&self, entry: Rc<F>) -> bool {
        if self.is_wrapped() {
            return false;
        }
        *self.current.borrow_mut() = Some(entry);
        true
    }

    fn wrap(&self, make: impl FnOnce(Rc<F>) -> Rc<F>) -> bool {
        if self.is_wrapped() {
            return false;
        }
        let Some(original) = self.current() else {
            return false;
        };
        *self.original.borrow_mut() = Some(Rc::clone(&original));
        *self.current.borrow_mut() = Some(make(original));
        true
    }

    fn restore(&self) -> bool {
        match self.original.borrow_mut().take() {
            Some(original) => {
                *self.current.borrow_mut() = Some(original);
                true
            }
            None => false,
        }
    }
}

/// Receivers whose call through one slot is inside its wrapper.
#[derive(Default)]
struct Reentry {
    running: RefCell<Vec<Receiver>>,
}

impl Reentry {
    /// Mark `that` as running, or `None` when it already is.
    fn enter(&self, that: &Receiver) -> Option<Busy<'_>> {
        if self.running.borrow().contains(that) {
            return None;
        }
        self.running.borrow_mut().push(that.clone());
        Some(Busy(self))
    }
}

/// Marks a receiver as running for as long as the guard lives.
struct Busy<'a>(&'a Reentry);

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.running.borrow_mut().pop();
    }
}

/// What kind of entry an install replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Method,
    /// A method slot whose products carry a host brand.
    Constructor,
    Getter,
    Setter,
}

/// One wrapper installed on a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wrapped {
    pub slot: &'static str,
    pub kind: SlotKind,
}

thread_local! {
    static INSTALLS: RefCell<Option<Vec<Wrapped>>> = const { RefCell::new(None) };
}

fn log_install(slot: &'static str, kind: SlotKind) {
    INSTALLS.with(|log| {
        if let Some(log) = log.borrow_mut().as_mut() {
            log.push(Wrapped { slot, kind });
        }
    });
}

/// Run `install` with an install log open and return what it wrapped.
pub fn record_installs<R>(install: impl FnOnce() -> R) -> (R, Vec<Wrapped>) {
    let outer = INSTALLS.with(|log| log.borrow_mut().replace(Vec::new()));
    let result = install();
    let wrapped = INSTALLS.with(|log| {
        let mut log = log.borrow_mut();
        let wrapped = log.take().unwrap_or_default();
        if let Some(mut outer) = outer {
            outer.extend(wrapped.iter().copied());
            *log = Some(outer);
        }
        wrapped
    });
    (result, wrapped)
}

/// A replaceable function entry on a host surface.
pub struct MethodSlot<A, O> {
    name: &'static str,
    /// Host type produced by a constructor slot.
    brand: Option<&'static str>,
    entry: Entry<dyn Fn(&Receiver, A) -> Result<O>>,
}

impl<A: 'static, O: 'static> MethodSlot<A, O> {
    /// An absent entry.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            brand: None,
            entry: Entry::empty(),
        }
    }

    /// A slot holding `native`.
    pub fn native<F>(name: &'static str, native: F) -> Self
    where
        F: Fn(&Receiver, A) -> Result<O> + 'static,
    {
        let slot = Self::new(name);
        slot.define(native);
        slot
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Install the native entry. Refused once the slot is wrapped.
    pub fn define<F>(&self, native: F) -> bool
    where
        F: Fn(&Receiver, A) -> Result<O> + 'static,
    {
        self.entry.define(Rc::new(native))
    }

    /// Call the live entry: the wrapper when overridden, the native otherwise.
    pub fn call(&self, that: &Receiver, args: A) -> Result<O> {
        let entry = self
            .entry
            .current()
            .ok_or(HookError::MissingSurface(self.name))?;
        entry(that, args)
    }

    /// Call the native entry, bypassing any wrapper.
    pub fn call_native(&self, that: &Receiver, args: A) -> Result<O> {
        let entry = self
            .entry
            .native()
            .ok_or(HookError::MissingSurface(self.name))?;
        entry(that, args)
    }

    /// The pre-override entry, if the slot is present.
    pub fn original(&self) -> Option<NativeFn<A, O>> {
        self.entry.native()
    }

    pub fn is_present(&self) -> bool {
        self.entry.is_present()
    }

    pub fn is_wrapped(&self) -> bool {
        self.entry.is_wrapped()
    }

    /// Reinstate the original entry. Returns whether a wrapper was removed.
    pub fn restore(&self) -> bool {
        let restored = self.entry.restore();
        if restored {
            debug!(slot = self.name, "override removed");
        }
        restored
    }
}

impl<A: 'static> MethodSlot<A, Receiver> {
    /// A constructor slot whose products carry `brand`.
    pub fn constructor<F>(name: &'static str, brand: &'static str, native: F) -> Self
    where
        F: Fn(&Receiver, A) -> Result<Receiver> + 'static,
    {
        let mut slot = Self::native(name, native);
        slot.brand = Some(brand);
        slot
    }

    /// The brand that values built through this slot satisfy, wrapped or not.
    pub fn prototype(&self) -> Option<&'static str> {
        self.brand
    }
}

/// A replaceable getter/setter pair on a host surface.
pub struct AccessorSlot<T> {
    name: &'static str,
    get: Entry<dyn Fn(&Receiver) -> Result<T>>,
    set: Entry<dyn Fn(&Receiver, T) -> Result<()>>,
}

impl<T: 'static> AccessorSlot<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            get: Entry::empty(),
            set: Entry::empty(),
        }
    }

    pub fn getter<F>(self, get: F) -> Self
    where
        F: Fn(&Receiver) -> Result<T> + 'static,
    {
        self.define_get(get);
        self
    }

    pub fn setter<F>(self, set: F) -> Self
    where
        F: Fn(&Receiver, T) -> Result<()> + 'static,
    {
        self.define_set(set);
        self
    }

    pub fn define_get<F>(&self, get: F) -> bool
    where
        F: Fn(&Receiver) -> Result<T> + 'static,
    {
        self.get.define(Rc::new(get))
    }

    pub fn define_set<F>(&self, set: F) -> bool
    where
        F: Fn(&Receiver, T) -> Result<()> + 'static,
    {
        self.set.define(Rc::new(set))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self, that: &Receiver) -> Result<T> {
        let get = self
            .get
            .current()
            .ok_or(HookError::MissingSurface(self.name))?;
        get(that)
    }

    pub fn set(&self, that: &Receiver, value: T) -> Result<()> {
        let set = self
            .set
            .current()
            .ok_or(HookError::MissingSurface(self.name))?;
        set(that, value)
    }

    pub fn get_native(&self, that: &Receiver) -> Result<T> {
        let get = self
            .get
            .native()
            .ok_or(HookError::MissingSurface(self.name))?;
        get(that)
    }

    pub fn set_native(&self, that: &Receiver, value: T) -> Result<()> {
        let set = self
            .set
            .native()
            .ok_or(HookError::MissingSurface(self.name))?;
        set(that, value)
    }

    pub fn has_getter(&self) -> bool {
        self.get.is_present()
    }

    pub fn has_setter(&self) -> bool {
        self.set.is_present()
    }

    pub fn is_wrapped(&self) -> bool {
        self.get.is_wrapped() || self.set.is_wrapped()
    }

    /// Reinstate both native sides. Returns whether anything was unwrapped.
    pub fn restore(&self) -> bool {
        let get = self.get.restore();
        let set = self.set.restore();
        get | set
    }
}

/// Replace the entry of `slot` with `wrapper`.
///
/// Returns `false` and leaves the slot untouched when it is absent or
/// already wrapped.
pub fn override_method<A, O, W>(slot: &MethodSlot<A, O>, wrapper: W) -> bool
where
    A: 'static,
    O: 'static,
    W: Fn(&NativeFn<A, O>, &Receiver, A) -> Result<O> + 'static,
{
    if !slot.is_present() {
        debug!(slot = slot.name, "override skipped: slot absent");
        return false;
    }
    let installed = slot.entry.wrap(|original| {
        let reentry = Reentry::default();
        let wrapped: NativeFn<A, O> = Rc::new(move |that: &Receiver, args: A| {
            let Some(_busy) = reentry.enter(that) else {
                return original(that, args);
            };
            wrapper(&original, that, args)
        });
        wrapped
    });
    if installed {
        debug!(slot = slot.name, "override installed");
        let kind = match slot.brand {
            Some(_) => SlotKind::Constructor,
            None => SlotKind::Method,
        };
        log_install(slot.name, kind);
    } else {
        debug!(slot = slot.name, "override refused: slot already wrapped");
    }
    installed
}

type GetHook<T> = Box<dyn Fn(&Getter<T>, &Receiver) -> Result<T>>;
type SetHook<T> = Box<dyn Fn(&Setter<T>, &Receiver, T) -> Result<()>>;

/// Wrappers for either side of an accessor.
pub struct AccessorHooks<T> {
    get: Option<GetHook<T>>,
    set: Option<SetHook<T>>,
}

impl<T: 'static> AccessorHooks<T> {
    pub fn new() -> Self {
        Self {
            get: None,
            set: None,
        }
    }

    pub fn get<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Getter<T>, &Receiver) -> Result<T> + 'static,
    {
        self.get = Some(Box::new(hook));
        self
    }

    pub fn set<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Setter<T>, &Receiver, T) -> Result<()> + 'static,
    {
        self.set = Some(Box::new(hook));
        self
    }
}

impl<T: 'static> Default for AccessorHooks<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace either or both sides of `slot`.
///
/// Sides without a hook are left as they are; a hook for a side the slot does
/// not have is ignored. Returns whether anything was installed.
pub fn override_accessor<T: 'static>(slot: &AccessorSlot<T>, hooks: AccessorHooks<T>) -> bool {
    let mut installed = false;

    if let Some(hook) = hooks.get {
        let wrapped = slot.get.wrap(|original| {
            let reentry = Reentry::default();
            let wrapped: Getter<T> = Rc::new(move |that: &Receiver| {
                let Some(_busy) = reentry.enter(that) else {
                    return original(that);
                };
                hook(&original, that)
            });
            wrapped
        });
        if wrapped {
            log_install(slot.name, SlotKind::Getter);
        }
        installed |= wrapped;
    }

    if let Some(hook) = hooks.set {
        let wrapped = slot.set.wrap(|original| {
            let reentry = Reentry::default();
            let wrapped: Setter<T> = Rc::new(move |that: &Receiver, value: T| {
                let Some(_busy) = reentry.enter(that) else {
                    return original(that, value);
                };
                hook(&original, that, value)
            });
            wrapped
        });
        if wrapped {
            log_install(slot.name, SlotKind::Setter);
        }
        installed |= wrapped;
    }

    debug!(slot = slot.name, installed, "accessor override");
    installed
}

/// One-shot arm tokens, keyed by surface.
#[derive(Default)]
pub struct ArmLedger {
    armed: RefCell<HashMap<&'static str, bool>>,
}

impl ArmLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `install` the first time `key` is armed; later calls return the
    /// first outcome without running it again.
    pub fn arm(&self, key: &'static str, install: impl FnOnce() -> bool) -> bool {
        let spent = self.armed.borrow().get(key).copied();
        if let Some(outcome) = spent {
            debug!(surface = key, outcome, "arm token already spent");
            return outcome;
        }
        let outcome = install();
        self.armed.borrow_mut().insert(key, outcome);
        outcome
    }

    pub fn is_armed(&self, key: &str) -> bool {
        self.armed.borrow().get(key).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_an_absent_slot_is_a_no_op() {
        let slot = MethodSlot::<u32, u32>::new("Absent.call");
        assert!(!override_method(&slot, |original, that, n| original(that, n)));
        assert!(!slot.is_present());
        assert!(matches!(
            slot.call(&Receiver::new("Absent", ()), 1),
            Err(HookError::MissingSurface("Absent.call"))
        ));
    }

    #[test]
    fn define_is_refused_once_wrapped() {
        let slot = MethodSlot::native("Counter.add", |_, n: u32| Ok(n + 1));
        assert!(override_method(&slot, |original, that, n| original(that, n * 10)));
        assert!(!slot.define(|_, n: u32| Ok(n)));

        let that = Receiver::new("Counter", ());
        assert_eq!(slot.call(&that, 2).unwrap(), 21);
        assert_eq!(slot.call_native(&that, 2).unwrap(), 3);
    }

    #[test]
    fn install_log_records_each_wrapped_side() {
        let slot = MethodSlot::constructor("Audio", "HTMLAudioElement", |_, (): ()| {
            Ok(Receiver::new("HTMLAudioElement", ()))
        });
        let title = AccessorSlot::<String>::new("Document.title")
            .getter(|_| Ok(String::new()))
            .setter(|_, _| Ok(()));

        let (installed, wrapped) = record_installs(|| {
            let ctor = override_method(&slot, |original, that, args| original(that, args));
            let accessor = override_accessor(
                &title,
                AccessorHooks::new().get(|original, that| original(that)),
            );
            ctor && accessor
        });
        assert!(installed);
        assert_eq!(
            wrapped,
            vec![
                Wrapped { slot: "Audio", kind: SlotKind::Constructor },
                Wrapped { slot: "Document.title", kind: SlotKind::Getter },
            ]
        );

        // A refused wrap is never recorded.
        let (_, wrapped) = record_installs(|| override_method(&slot, |o, t, a| o(t, a)));
        assert!(wrapped.is_empty());
    }

    #[test]
    fn nested_calls_on_other_receivers_are_intercepted() {
        let slot = Rc::new(MethodSlot::native("Store.set", |_, n: u32| Ok(n)));
        let mirror = Receiver::new("Store", ());
        let hits = Rc::new(RefCell::new(Vec::new()));

        let inner = Rc::clone(&slot);
        let log = Rc::clone(&hits);
        let target = mirror.clone();
        assert!(override_method(&slot, move |original, that, n| {
            log.borrow_mut().push(that.clone());
            if *that != target {
                inner.call(&target, n)?;
                inner.call(that, n)?;
            }
            original(that, n + 1)
        }));

        let primary = Receiver::new("Store", ());
        assert_eq!(slot.call(&primary, 1).unwrap(), 2);
        // The mirror call is wrapped; the same-receiver call is not.
        assert_eq!(*hits.borrow(), vec![primary, mirror]);
    }

    #[test]
    fn ledger_runs_install_once() {
        let ledger = ArmLedger::new();
        let runs = std::cell::Cell::new(0);
        for _ in 0..3 {
            assert!(ledger.arm("history", || {
                runs.set(runs.get() + 1);
                true
            }));
        }
        assert_eq!(runs.get(), 1);
        assert!(ledger.is_armed("history"));
        assert!(!ledger.is_armed("location"));
    }
}
