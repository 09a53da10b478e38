use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use std::sync::{Arc, OnceLock};

/// An interned member or field name
pub type Name = Arc<str>;

/// Global name interner
/// Deduplicates member names so tables share one allocation per name
pub struct Interner {
    pool: Mutex<FxHashSet<Arc<str>>>,
}

impl Interner {
    pub fn new() -> Self {
        Self {
            pool: Mutex::new(FxHashSet::default()),
        }
    }

    pub fn global() -> &'static Self {
        static INTERNER: OnceLock<Interner> = OnceLock::new();
        INTERNER.get_or_init(Self::new)
    }

    /// Intern a name
    /// Returns the existing Arc<str> if the name is already interned,
    /// otherwise stores a new one.
    pub fn intern(&self, s: &str) -> Name {
        let mut pool = self.pool.lock();
        if let Some(interned) = pool.get(s) {
            return interned.clone();
        }

        let interned: Name = Arc::from(s);
        pool.insert(interned.clone());
        interned
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper function to intern a name using the global interner
pub fn intern(s: &str) -> Name {
    Interner::global().intern(s)
}
