//! Object references: identity travels as an `Int64`, resolved through a
//! storer/loader pair owned by the session.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::trace;

use crate::error::{type_mismatch, PackError, Result};
use crate::packer::Packer;
use crate::primitive::Int64;
use crate::value::Value;

type Storer<T> = dyn Fn(&Arc<T>) -> Option<i64> + Send + Sync;
type Loader<T> = dyn Fn(i64) -> Option<Arc<T>> + Send + Sync;

/// Encodes an object as the id its storer assigns, and decodes an id back
/// to the object its loader returns.
///
/// The packer holds no identity state of its own; whatever table backs the
/// storer and loader belongs to the session that built them.
pub struct ObjRef<T> {
    id: i32,
    storer: Arc<Storer<T>>,
    loader: Arc<Loader<T>>,
}

impl<T: Send + Sync + 'static> ObjRef<T> {
    pub fn new<S, L>(id: i32, storer: S, loader: L) -> Self
    where
        S: Fn(&Arc<T>) -> Option<i64> + Send + Sync + 'static,
        L: Fn(i64) -> Option<Arc<T>> + Send + Sync + 'static,
    {
        Self {
            id,
            storer: Arc::new(storer),
            loader: Arc::new(loader),
        }
    }

    /// Bind storer and loader to a session's [`ObjectTable`].
    pub fn with_table(id: i32, table: Arc<ObjectTable<T>>) -> Self {
        let loader_table = Arc::clone(&table);
        Self::new(
            id,
            move |obj| Some(table.store(obj)),
            move |oid| loader_table.load(oid),
        )
    }
}

impl<T> Clone for ObjRef<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            storer: Arc::clone(&self.storer),
            loader: Arc::clone(&self.loader),
        }
    }
}

impl<T> fmt::Debug for ObjRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjRef")
            .field("id", &self.id)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: Send + Sync + 'static> Packer for ObjRef<T> {
    type Value = Arc<T>;

    fn type_id(&self) -> i32 {
        self.id
    }

    fn pack<W: Write + ?Sized>(&self, value: &Arc<T>, writer: &mut W) -> Result<()> {
        let oid = (self.storer)(value).ok_or_else(|| {
            PackError::UnresolvableReference(format!(
                "storer has no id for {}",
                std::any::type_name::<T>()
            ))
        })?;
        Int64.pack(&oid, writer)
    }

    fn unpack<R: Read + ?Sized>(&self, reader: &mut R) -> Result<Arc<T>> {
        let oid = Int64.unpack(reader)?;
        (self.loader)(oid)
            .ok_or_else(|| PackError::UnresolvableReference(format!("loader has no object {oid}")))
    }

    fn into_value(&self, value: Arc<T>) -> Value {
        Value::Object(value)
    }

    fn from_value<'v>(&self, value: &'v Value) -> Result<Cow<'v, Arc<T>>> {
        let Value::Object(obj) = value else {
            return Err(type_mismatch(std::any::type_name::<T>(), value));
        };
        Arc::clone(obj)
            .downcast::<T>()
            .map(Cow::Owned)
            .map_err(|_| PackError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found: "object",
            })
    }
}

/// A session-owned identity table for live objects.
///
/// Ids start at 1 and increase; an object keeps its id for as long as it is
/// alive. Entries hold weak references, so a dropped object stops resolving
/// instead of being kept alive by the table. Dead entries are swept during
/// [`store`](Self::store) each time the table doubles, or on demand with
/// [`purge`](Self::purge).
pub struct ObjectTable<T> {
    inner: Mutex<TableInner<T>>,
}

struct TableInner<T> {
    next_id: i64,
    by_addr: HashMap<usize, i64>,
    by_id: HashMap<i64, Weak<T>>,
    /// Tracked-id count that triggers the next sweep.
    sweep_at: usize,
}

/// Smallest table size swept from `store`.
const MIN_SWEEP: usize = 64;

impl<T> TableInner<T> {
    fn sweep(&mut self) -> usize {
        let before = self.by_id.len();
        self.by_id.retain(|_, weak| weak.strong_count() > 0);
        let by_id = &self.by_id;
        self.by_addr.retain(|_, oid| by_id.contains_key(oid));
        self.sweep_at = (self.by_id.len() * 2).max(MIN_SWEEP);
        before - self.by_id.len()
    }
}

impl<T> ObjectTable<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TableInner {
                next_id: 0,
                by_addr: HashMap::new(),
                by_id: HashMap::new(),
                sweep_at: MIN_SWEEP,
            }),
        }
    }

    /// Return the id of `obj`, assigning a fresh one on first sight.
    pub fn store(&self, obj: &Arc<T>) -> i64 {
        let addr = Arc::as_ptr(obj) as *const () as usize;
        let mut inner = self.lock();

        if let Some(&oid) = inner.by_addr.get(&addr) {
            let same = inner
                .by_id
                .get(&oid)
                .and_then(Weak::upgrade)
                .is_some_and(|live| Arc::ptr_eq(&live, obj));
            if same {
                return oid;
            }
            // Address reused by a new allocation after the old one died.
            inner.by_id.remove(&oid);
        }

        if inner.by_id.len() >= inner.sweep_at {
            let swept = inner.sweep();
            trace!(swept, "swept dead objects");
        }

        inner.next_id += 1;
        let oid = inner.next_id;
        inner.by_addr.insert(addr, oid);
        inner.by_id.insert(oid, Arc::downgrade(obj));
        trace!(oid, "stored object");
        oid
    }

    /// Resolve an id to its object, if the object is still alive.
    pub fn load(&self, oid: i64) -> Option<Arc<T>> {
        self.lock().by_id.get(&oid).and_then(Weak::upgrade)
    }

    /// Forget an id. Returns the object if it was still alive.
    pub fn remove(&self, oid: i64) -> Option<Arc<T>> {
        let mut inner = self.lock();
        let weak = inner.by_id.remove(&oid)?;
        inner.by_addr.retain(|_, id| *id != oid);
        weak.upgrade()
    }

    /// Drop entries whose objects are gone. Returns how many were removed.
    pub fn purge(&self) -> usize {
        self.lock().sweep()
    }

    /// Number of ids currently tracked, live or not yet purged.
    pub fn len(&self) -> usize {
        self.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TableInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for ObjectTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ObjectTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectTable")
            .field("len", &self.len())
            .finish()
    }
}
