//! Thread-scoped persistence context.
//!
//! A [`PersistGuard`] binds one backend to the current thread for the
//! duration of a persist/restore session. The binding lives in a
//! thread-local slot, so unrelated threads persisting through different
//! backends never observe each other. Entering while a guard is alive on
//! the same thread fails with [`ArrayError::NestedContext`]; the guard
//! unbinds on drop, including during unwinding.
//!
//! The guard is `!Send`: it must be dropped on the thread that created it.

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use tessera_core::{ArrayError, Backend};

/// The backend bound on this thread, type-erased.
struct ActiveContext {
    backend_name: String,
    type_name: &'static str,
    backend: Arc<dyn Any + Send + Sync>,
}

thread_local! {
    /// The context bound by the live [`PersistGuard`] on this thread, if any.
    static ACTIVE: RefCell<Option<ActiveContext>> = const { RefCell::new(None) };
}

/// Scoped binding of a backend to the current thread.
///
/// ```ignore
/// let guard = PersistGuard::enter(backend)?;
/// let persisted = persist(&array)?;
/// guard.exit();
/// ```
#[must_use = "the context is unbound as soon as the guard is dropped"]
pub struct PersistGuard<B: Backend> {
    backend: Arc<B>,
    _thread_bound: PhantomData<*const ()>,
}

impl<B: Backend> PersistGuard<B> {
    /// Bind `backend` to the current thread.
    pub fn enter(backend: Arc<B>) -> Result<Self, ArrayError> {
        ACTIVE.with(|slot| -> Result<(), ArrayError> {
            let mut slot = slot.borrow_mut();
            if let Some(active) = slot.as_ref() {
                return Err(ArrayError::NestedContext {
                    active: active.backend_name.clone(),
                });
            }
            let erased: Arc<dyn Any + Send + Sync> = backend.clone();
            *slot = Some(ActiveContext {
                backend_name: backend.name().to_string(),
                type_name: type_name::<B>(),
                backend: erased,
            });
            Ok(())
        })?;
        tracing::debug!(backend = backend.name(), "persistence context entered");
        Ok(Self {
            backend,
            _thread_bound: PhantomData,
        })
    }

    /// The bound backend.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Unbind the context. Equivalent to dropping the guard.
    pub fn exit(self) {
        drop(self);
    }
}

impl<B: Backend> Drop for PersistGuard<B> {
    fn drop(&mut self) {
        // The slot may already be gone during thread teardown.
        let _ = ACTIVE.try_with(|slot| slot.borrow_mut().take());
        tracing::debug!(backend = self.backend.name(), "persistence context exited");
    }
}

/// Run `f` with `backend` bound to the current thread.
pub fn with_persist_context<B, R, F>(backend: Arc<B>, f: F) -> Result<R, ArrayError>
where
    B: Backend,
    F: FnOnce(&PersistGuard<B>) -> R,
{
    let guard = PersistGuard::enter(backend)?;
    Ok(f(&guard))
}

/// Name of the backend bound on this thread, if any.
pub fn active_backend_name() -> Option<String> {
    ACTIVE.with(|slot| slot.borrow().as_ref().map(|a| a.backend_name.clone()))
}

/// The backend bound on this thread, as a `B`.
pub(crate) fn active_backend<B: Backend>(operation: &'static str) -> Result<Arc<B>, ArrayError> {
    ACTIVE.with(|slot| -> Result<Arc<B>, ArrayError> {
        let slot = slot.borrow();
        let active = slot
            .as_ref()
            .ok_or(ArrayError::NoActiveContext { operation })?;
        Arc::clone(&active.backend)
            .downcast::<B>()
            .map_err(|_| ArrayError::ContextBackendMismatch {
                active: active.type_name,
                requested: type_name::<B>(),
            })
    })
}
