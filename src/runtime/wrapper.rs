use super::class::Class;
use super::dispatch::{super_stand_in, wrapper_with_super_and_inner};
use super::function::Function;
use smallvec::SmallVec;

impl Class {
    /// Layer `wrapper` over method `name`. Wrapping an empty slot wraps a
    /// stand-in that forwards to the superclass method.
    pub fn wrap(&self, name: &str, wrapper: Function) -> &Self {
        log::debug!("wrapping {}.{}", self, name);
        let superclass = self.superclass();
        let current = self.get_own_method(name);
        let was_empty = current.is_none();
        let inner = match current {
            Some(current) => current,
            None => super_stand_in(name, superclass.as_ref()),
        };
        let layer = wrapper_with_super_and_inner(wrapper, name, superclass.as_ref(), inner, was_empty);
        self.method_table().insert(name, layer);
        self
    }

    pub fn wrappers<I, K>(&self, list: I) -> &Self
    where
        I: IntoIterator<Item = (K, Function)>,
        K: AsRef<str>,
    {
        for (name, wrapper) in list {
            self.wrap(name.as_ref(), wrapper);
        }
        self
    }

    /// True if method `name` is wrapped by `wrapper`, or by anything when
    /// `wrapper` is `None`
    pub fn wrapped(&self, name: &str, wrapper: Option<&Function>) -> bool {
        let mut fun = self.get_own_method(name);
        while let Some(current) = fun {
            let Some(layer) = current.as_layer() else {
                return false;
            };
            match wrapper {
                None => return true,
                Some(wrapper) if layer.wrapper.ptr_eq(wrapper) => return true,
                Some(_) => {}
            }
            fun = Some(layer.inner.clone());
        }
        false
    }

    /// Remove `wrapper` from method `name`, or the top wrapper when `None`.
    /// Wrappers above it are put back in their original order.
    pub fn unwrap(&self, name: &str, wrapper: Option<&Function>) -> &Self {
        let target = match wrapper {
            Some(wrapper) => Some(wrapper.clone()),
            None => self
                .get_own_method(name)
                .and_then(|top| top.as_layer().map(|layer| layer.wrapper.clone())),
        };
        let Some(target) = target else {
            return self;
        };
        log::debug!("unwrapping {}.{}", self, name);
        let rewrap = self.unwrap_wrappers(name, Some(&target));
        self.rewrap(name, &rewrap);
        self
    }

    /// Remove every wrapper of method `name`
    pub fn unwrap_all(&self, name: &str) -> &Self {
        log::debug!("unwrapping all of {}.{}", self, name);
        self.unwrap_wrappers(name, None);
        self
    }

    /// Pop the top layer of `name`, restoring what it shadowed (or emptying
    /// the slot), and return its wrapper
    fn pop_wrapper(&self, name: &str) -> Option<Function> {
        let top = self.get_own_method(name)?;
        let layer = top.as_layer()?;
        if layer.was_empty {
            self.method_table().remove(name);
        } else {
            self.method_table().insert(name, layer.inner.clone());
        }
        Some(layer.wrapper.clone())
    }

    /// Pop layers down to and including `upto` (every layer when `None`).
    /// Returns the popped wrappers other than `upto`, topmost first.
    pub(crate) fn unwrap_wrappers(&self, name: &str, upto: Option<&Function>) -> SmallVec<[Function; 4]> {
        let mut popped = SmallVec::new();
        while let Some(wrapper) = self.pop_wrapper(name) {
            if upto.is_some_and(|upto| upto.ptr_eq(&wrapper)) {
                break;
            }
            popped.push(wrapper);
        }
        popped
    }

    /// Re-apply wrappers returned by `unwrap_wrappers`
    pub(crate) fn rewrap(&self, name: &str, wrappers: &[Function]) {
        for wrapper in wrappers.iter().rev() {
            self.wrap(name, wrapper.clone());
        }
    }
}
