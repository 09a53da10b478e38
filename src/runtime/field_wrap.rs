// Classy Field Wrapper Module
// Field `x` wrapped n times occupies x, $x, ..., with the raw slot at the bottom

use super::class::Class;
use super::clone;
use super::function::{Frame, Function};
use super::instance::{Object, WeakObject};
use super::interner::{intern, Name};
use super::mixin::Mixin;
use super::value::{Accessor, Property, Value};
use crate::error::ClassyResult;
use crate::SHADOW_PREFIX;
use smallvec::{smallvec, SmallVec};

/// Who installed a field layer, for selective removal
#[derive(Clone)]
pub enum Owner {
    Class(Class),
    Mixin(Mixin),
    Object(WeakObject),
}

impl PartialEq for Owner {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Owner::Class(a), Owner::Class(b)) => a.ptr_eq(b),
            (Owner::Mixin(a), Owner::Mixin(b)) => a.ptr_eq(b),
            (Owner::Object(a), Owner::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<&Class> for Owner {
    fn from(class: &Class) -> Self {
        Owner::Class(class.clone())
    }
}

impl From<&Mixin> for Owner {
    fn from(mixin: &Mixin) -> Self {
        Owner::Mixin(mixin.clone())
    }
}

impl From<&Object> for Owner {
    fn from(obj: &Object) -> Self {
        Owner::Object(obj.downgrade())
    }
}

/// The slot a running field layer shadows
#[derive(Clone)]
pub(crate) struct FieldAccess {
    pub(crate) object: Object,
    pub(crate) shadow: Name,
}

/// One wrap of a field. A missing getter or setter passes straight through to
/// the shadowed level.
#[derive(Clone)]
pub struct FieldLayer {
    getter: Option<Function>,
    setter: Option<Function>,
    owner: Option<Owner>,
}

impl FieldLayer {
    pub fn owner(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }

    fn frame(obj: &Object, shadow: Name) -> Frame {
        Frame {
            field: Some(FieldAccess {
                object: obj.clone(),
                shadow,
            }),
            ..Frame::default()
        }
    }

    /// Read through this layer installed at `name` on `obj`
    pub(crate) fn read(&self, obj: &Object, name: &str) -> ClassyResult<Value> {
        let shadow = shadow_name(name);
        match &self.getter {
            Some(getter) => {
                let frame = Self::frame(obj, shadow);
                getter.invoke(&Value::Instance(obj.clone()), &[], frame)
            }
            None => obj.read(&shadow),
        }
    }

    pub(crate) fn write(&self, obj: &Object, name: &str, value: Value) -> ClassyResult<()> {
        let shadow = shadow_name(name);
        match &self.setter {
            Some(setter) => {
                let frame = Self::frame(obj, shadow);
                setter
                    .invoke(&Value::Instance(obj.clone()), &[value], frame)
                    .map(|_| ())
            }
            None => obj.write(&shadow, value),
        }
    }
}

pub fn shadow_name(name: &str) -> Name {
    let mut shadow = String::with_capacity(name.len() + 1);
    shadow.push(SHADOW_PREFIX);
    shadow.push_str(name);
    intern(&shadow)
}

/// `name` followed by every shadow level present on `obj`
fn levels(obj: &Object, name: &str) -> SmallVec<[Name; 4]> {
    let mut levels: SmallVec<[Name; 4]> = smallvec![intern(name)];
    loop {
        let Some(last) = levels.last() else { break };
        let next = shadow_name(last);
        if !obj.has_own_property(&next) {
            break;
        }
        levels.push(next);
    }
    levels
}

fn layer_owner(obj: &Object, name: &str) -> Option<Owner> {
    match obj.property(name) {
        Some(Property::Wrapped(layer)) => layer.owner,
        _ => None,
    }
}

/// Wrap field `name` of `obj`. Without a getter and a setter nothing happens.
///
/// A field `obj` does not own is shadowed as `Undefined`, so after the last
/// unwrap `obj` owns `name` with that value.
pub fn wrap_field(
    obj: &Object,
    name: &str,
    getter: Option<Function>,
    setter: Option<Function>,
    owner: Option<Owner>,
) {
    if getter.is_none() && setter.is_none() {
        log::warn!("ignoring wrap of field '{}' without getter or setter", name);
        return;
    }
    log::debug!("wrapping field '{}' of {}", name, obj);

    // push every level one step down, deepest first
    let levels = levels(obj, name);
    for level in levels.iter().rev() {
        let prop = obj
            .property(level)
            .unwrap_or(Property::Data(Value::Undefined));
        obj.define(&shadow_name(level), prop);
    }

    obj.define(
        name,
        Property::Wrapped(FieldLayer {
            getter,
            setter,
            owner,
        }),
    );
}

/// Remove one layer of field `name`: the outermost one, or the outermost one
/// installed by `owner`. Layers below it move up one level.
pub fn unwrap_field(obj: &Object, name: &str, owner: Option<&Owner>) {
    let levels = levels(obj, name);
    let depth = levels.len() - 1;
    if depth == 0 {
        return;
    }

    let start = match owner {
        None => 0,
        Some(owner) => {
            let found = (0..depth).find(|&i| layer_owner(obj, &levels[i]).as_ref() == Some(owner));
            match found {
                Some(i) => i,
                None => return,
            }
        }
    };

    log::debug!("unwrapping field '{}' of {}", levels[start], obj);
    for i in start..depth {
        if let Some(prop) = obj.property(&levels[i + 1]) {
            obj.define(&levels[i], prop);
        }
    }
    obj.delete(&levels[depth]);
}

/// Remove one `owner` layer from every field of `obj`
pub fn unwrap_fields(obj: &Object, owner: Option<&Owner>) {
    for name in obj.own_property_names() {
        if obj.has_own_property(&name) {
            unwrap_field(obj, &name, owner);
        }
    }
}

fn wrap_accessors<I, K>(obj: &Object, list: I, owner: &Owner)
where
    I: IntoIterator<Item = (K, Accessor)>,
    K: AsRef<str>,
{
    for (name, accessor) in list {
        wrap_field(
            obj,
            name.as_ref(),
            accessor.getter,
            accessor.setter,
            Some(owner.clone()),
        );
    }
}

impl Object {
    /// Wrap field `name` on this object only, owned by the object itself.
    /// A field it does not own yet is left owned as `Undefined` after unwrapping.
    pub fn wrap_field(&self, name: &str, getter: Option<Function>, setter: Option<Function>) -> &Self {
        wrap_field(self, name, getter, setter, Some(Owner::from(self)));
        self
    }

    pub fn wrap_field_for(
        &self,
        name: &str,
        getter: Option<Function>,
        setter: Option<Function>,
        owner: impl Into<Owner>,
    ) -> &Self {
        wrap_field(self, name, getter, setter, Some(owner.into()));
        self
    }

    /// Wrap several fields; `None` makes the object the owner
    pub fn wrap_fields<I, K>(&self, list: I, owner: Option<Owner>) -> &Self
    where
        I: IntoIterator<Item = (K, Accessor)>,
        K: AsRef<str>,
    {
        let owner = owner.unwrap_or_else(|| Owner::from(self));
        wrap_accessors(self, list, &owner);
        self
    }

    /// Remove this object's own layer from field `name`
    pub fn unwrap_field(&self, name: &str) -> &Self {
        unwrap_field(self, name, Some(&Owner::from(self)));
        self
    }

    pub fn unwrap_field_for(&self, name: &str, owner: impl Into<Owner>) -> &Self {
        unwrap_field(self, name, Some(&owner.into()));
        self
    }

    /// Remove the layers of `owner` (this object when `None`) from every field
    pub fn unwrap_fields(&self, owner: Option<Owner>) -> &Self {
        let owner = owner.unwrap_or_else(|| Owner::from(self));
        unwrap_fields(self, Some(&owner));
        self
    }
}

impl Class {
    /// Wrap field `name` of every instance created from now on
    pub fn wrap_field(&self, name: &str, getter: Option<Function>, setter: Option<Function>) -> &Self {
        if getter.is_some() || setter.is_some() {
            self.data()
                .wrapped_fields
                .insert(name, Accessor::new(getter, setter));
        }
        self
    }

    /// Declare several field wraps; entries that are not accessors are ignored
    pub fn wrap_fields<I, K, P>(&self, list: I) -> &Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: AsRef<str>,
        P: Into<Property>,
    {
        for (name, prop) in list {
            if let Property::Accessor(accessor) = prop.into() {
                self.wrap_field(name.as_ref(), accessor.getter, accessor.setter);
            }
        }
        self
    }

    pub fn wrapped_field(&self, name: &str) -> bool {
        self.data().wrapped_fields.has_own(name)
    }

    /// Stop wrapping `name` in new instances. Existing instances keep their layer.
    pub fn unwrap_field(&self, name: &str) -> &Self {
        self.data().wrapped_fields.remove(name);
        self
    }

    /// Apply this class's field wraps, then each mixin's fields and field
    /// wraps, to a new instance
    pub(crate) fn init_wrapped_fields(&self, obj: &Object) -> ClassyResult<()> {
        let owner = Owner::from(self);
        wrap_accessors(obj, self.data().wrapped_fields.own_entries(), &owner);

        for mixin in self.mixins() {
            clone::copy_defaults(&mixin.field_entries(), obj)?;
            wrap_accessors(obj, mixin.field_wrapper_entries(), &Owner::from(&mixin));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadow_name_prefixes() {
        assert_eq!(&*shadow_name("x"), "$x");
        assert_eq!(&*shadow_name(&shadow_name("x")), "$$x");
    }
}
