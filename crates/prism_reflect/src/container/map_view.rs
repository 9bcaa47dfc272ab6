use prism_ptr::{Ptr, PtrMut};

use super::ScriptMap;
use crate::info::{PropertyDescriptor, PropertyType};
use crate::ops::{
    AccessError, PropertyStorage, destroy_element, hash_element, identical_element,
    initialize_element,
};

#[track_caller]
fn key_value_of(ty: &PropertyType) -> (&PropertyDescriptor, &PropertyDescriptor) {
    match ty {
        PropertyType::Map { key, value } => (key, value),
        other => panic!("expected a Map property, found {}", other.kind()),
    }
}

/// Finds the slot whose key equals `*key`.
///
/// Falls back to a linear scan while raw insertions are pending a rehash.
///
/// # Safety
///
/// `map` must hold keys of `ty` and `key` must point to one.
pub(crate) unsafe fn map_find(map: &ScriptMap, ty: &PropertyType, key: Ptr<'_>) -> Option<usize> {
    // SAFETY: guaranteed by the caller.
    unsafe {
        if map.needs_rehash() {
            return map
                .slots()
                .find(|&slot| identical_element(ty, map.key_ptr(slot), key));
        }
        map.find(hash_element(ty, key), |other| identical_element(ty, other, key))
    }
}

// -----------------------------------------------------------------------------
// MapView

/// Read access to a map property.
///
/// Slots are sparse, like [`SetView`](super::SetView).
#[derive(Clone, Copy, Debug)]
pub struct MapView<'a> {
    key: &'a PropertyDescriptor,
    value: &'a PropertyDescriptor,
    map: &'a ScriptMap,
}

impl<'a> MapView<'a> {
    /// # Safety
    ///
    /// `value` must point to an initialized map described by `ty`.
    ///
    /// # Panics
    ///
    /// Panics if `ty` is not a `Map`.
    #[track_caller]
    pub unsafe fn new(ty: &'a PropertyType, value: Ptr<'a>) -> Self {
        let (key, value_desc) = key_value_of(ty);
        Self {
            key,
            value: value_desc,
            // SAFETY: guaranteed by the caller.
            map: unsafe { value.as_ref::<ScriptMap>() },
        }
    }

    #[inline]
    pub fn key(&self) -> &'a PropertyDescriptor {
        self.key
    }

    #[inline]
    pub fn value(&self) -> &'a PropertyDescriptor {
        self.value
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    #[inline]
    pub fn is_valid_slot(&self, slot: usize) -> bool {
        self.map.is_valid_slot(slot)
    }

    /// Live slots in ascending order.
    #[inline]
    pub fn slots(&self) -> impl Iterator<Item = usize> + 'a {
        self.map.slots()
    }

    #[track_caller]
    #[inline]
    pub fn key_ptr(&self, slot: usize) -> Ptr<'a> {
        self.map.key_ptr(slot)
    }

    #[track_caller]
    #[inline]
    pub fn value_ptr(&self, slot: usize) -> Ptr<'a> {
        self.map.value_ptr(slot)
    }

    /// # Safety
    ///
    /// `key` must point to an initialized value of the key type.
    pub unsafe fn find(&self, key: Ptr<'_>) -> Option<usize> {
        // SAFETY: guaranteed by the caller.
        unsafe { map_find(self.map, self.key.ty(), key) }
    }

    /// Typed lookup.
    pub fn get<K: PropertyStorage, V: PropertyStorage>(
        &self,
        key: &K,
    ) -> Result<Option<&'a V>, AccessError> {
        AccessError::check_type::<K>(self.key)?;
        AccessError::check_type::<V>(self.value)?;
        // SAFETY: both types were checked.
        Ok(unsafe {
            self.find(Ptr::from_ref(key))
                .map(|slot| self.map.value_ptr(slot).as_ref::<V>())
        })
    }
}

// -----------------------------------------------------------------------------
// MapViewMut

/// Mutable access to a map property.
///
/// Raw insertion follows the set rules: [`add_default_slot`](Self::add_default_slot)
/// for every pair, then one [`rehash`](Self::rehash).
///
/// # Examples
///
/// ```
/// use prism_reflect::info::{PropertyType, StructBuilder};
/// use prism_reflect::ops::StructInstance;
/// use std::sync::Arc;
///
/// let scores = Arc::new(
///     StructBuilder::new("Scores")
///         .field("ByPlayer", PropertyType::map(PropertyType::String, PropertyType::Int32))
///         .build(),
/// );
/// let mut instance = StructInstance::new(scores);
///
/// let mut by_player = instance.map_view_mut("ByPlayer").unwrap();
/// by_player.insert(String::from("ada"), 3i32).unwrap();
/// by_player.insert(String::from("ada"), 5i32).unwrap();
///
/// let by_player = instance.map_view("ByPlayer").unwrap();
/// assert_eq!(by_player.len(), 1);
/// assert_eq!(by_player.get::<String, i32>(&"ada".into()), Ok(Some(&5)));
/// ```
#[derive(Debug)]
pub struct MapViewMut<'a> {
    key: &'a PropertyDescriptor,
    value: &'a PropertyDescriptor,
    map: &'a mut ScriptMap,
}

impl<'a> MapViewMut<'a> {
    /// # Safety
    ///
    /// `value` must point to an initialized map described by `ty`.
    ///
    /// # Panics
    ///
    /// Panics if `ty` is not a `Map`.
    #[track_caller]
    pub unsafe fn new(ty: &'a PropertyType, value: PtrMut<'a>) -> Self {
        let (key, value_desc) = key_value_of(ty);
        Self {
            key,
            value: value_desc,
            // SAFETY: guaranteed by the caller.
            map: unsafe { value.consume::<ScriptMap>() },
        }
    }

    #[inline]
    pub fn key(&self) -> &'a PropertyDescriptor {
        self.key
    }

    #[inline]
    pub fn value(&self) -> &'a PropertyDescriptor {
        self.value
    }

    #[inline]
    pub fn as_view(&self) -> MapView<'_> {
        MapView {
            key: self.key,
            value: self.value,
            map: self.map,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    #[inline]
    pub fn is_valid_slot(&self, slot: usize) -> bool {
        self.map.is_valid_slot(slot)
    }

    #[track_caller]
    #[inline]
    pub fn key_ptr_mut(&mut self, slot: usize) -> PtrMut<'_> {
        self.map.key_ptr_mut(slot)
    }

    #[track_caller]
    #[inline]
    pub fn value_ptr_mut(&mut self, slot: usize) -> PtrMut<'_> {
        self.map.value_ptr_mut(slot)
    }

    /// Allocates a slot with a default key and value.
    pub fn add_default_slot(&mut self) -> usize {
        let slot = self.map.add_uninitialized();
        // SAFETY: key and value storage of the new slot are uninitialized.
        unsafe {
            initialize_element(self.key.ty(), self.map.key_ptr_mut(slot));
            initialize_element(self.value.ty(), self.map.value_ptr_mut(slot));
        }
        slot
    }

    /// Destroys the pair in `slot` and leaves a hole.
    #[track_caller]
    pub fn remove_slot(&mut self, slot: usize) {
        // SAFETY: `key_ptr_mut` checked that the slot is live.
        unsafe {
            destroy_element(self.key.ty(), self.map.key_ptr_mut(slot));
            destroy_element(self.value.ty(), self.map.value_ptr_mut(slot));
        }
        self.map.remove_at(slot);
    }

    /// Rebuilds the key index. For duplicate keys the later pair wins.
    pub fn rehash(&mut self) {
        let (key, value) = (self.key.ty(), self.value.ty());
        let value_offset = self.map.layout().value_offset();
        // SAFETY: every live slot holds an initialized pair.
        unsafe {
            self.map.rehash(
                |k| hash_element(key, k),
                |a, b| identical_element(key, a, b),
                |mut pair| {
                    destroy_element(key, pair.reborrow());
                    destroy_element(value, pair.byte_add(value_offset));
                },
            );
        }
    }

    /// Destroys every pair.
    pub fn empty(&mut self) {
        for slot in 0..self.map.capacity() {
            if self.map.is_valid_slot(slot) {
                // SAFETY: the slot is live, and the storage is forgotten below.
                unsafe {
                    destroy_element(self.key.ty(), self.map.key_ptr_mut(slot));
                    destroy_element(self.value.ty(), self.map.value_ptr_mut(slot));
                }
            }
        }
        self.map.clear_raw();
    }

    /// # Safety
    ///
    /// `key` must point to an initialized value of the key type.
    pub unsafe fn find(&self, key: Ptr<'_>) -> Option<usize> {
        // SAFETY: guaranteed by the caller.
        unsafe { map_find(self.map, self.key.ty(), key) }
    }

    /// Inserts or overwrites the value for `key`. Returns `true` if the key
    /// was new.
    pub fn insert<K: PropertyStorage, V: PropertyStorage>(
        &mut self,
        key: K,
        value: V,
    ) -> Result<bool, AccessError> {
        AccessError::check_type::<K>(self.key)?;
        AccessError::check_type::<V>(self.value)?;

        // SAFETY: both types were checked.
        unsafe {
            if let Some(slot) = self.find(Ptr::from_ref(&key)) {
                *self.map.value_ptr_mut(slot).consume::<V>() = value;
                return Ok(false);
            }
            let slot = self.add_default_slot();
            *self.map.key_ptr_mut(slot).consume::<K>() = key;
            *self.map.value_ptr_mut(slot).consume::<V>() = value;
        }
        self.rehash();
        Ok(true)
    }

    /// Removes the pair for `key`. Returns whether one was found.
    pub fn remove<K: PropertyStorage>(&mut self, key: &K) -> Result<bool, AccessError> {
        AccessError::check_type::<K>(self.key)?;
        // SAFETY: the key type was checked.
        match unsafe { self.find(Ptr::from_ref(key)) } {
            Some(slot) => {
                self.remove_slot(slot);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use prism_ptr::{Ptr, PtrMut};

    use super::{MapView, MapViewMut};
    use crate::container::ScriptMap;
    use crate::info::{PropertyType, map_layout};

    #[test]
    fn duplicate_keys_keep_the_later_pair() {
        let ty = PropertyType::map(PropertyType::String, PropertyType::Int32);
        let PropertyType::Map { key, value } = &ty else {
            unreachable!()
        };
        let mut map = ScriptMap::new(map_layout(key, value));

        let mut view = unsafe { MapViewMut::new(&ty, PtrMut::from_mut(&mut map)) };
        for (k, v) in [("a", 1), ("b", 2), ("a", 3)] {
            let slot = view.add_default_slot();
            unsafe {
                *view.key_ptr_mut(slot).consume::<String>() = k.into();
                view.value_ptr_mut(slot).write(v);
            }
        }
        view.rehash();
        assert_eq!(view.len(), 2);

        let view = unsafe { MapView::new(&ty, Ptr::from_ref(&map)) };
        assert_eq!(view.get::<String, i32>(&"a".into()), Ok(Some(&3)));
        assert_eq!(view.get::<String, i32>(&"b".into()), Ok(Some(&2)));
        assert_eq!(view.get::<String, i32>(&"z".into()), Ok(None));

        let mut view = unsafe { MapViewMut::new(&ty, PtrMut::from_mut(&mut map)) };
        assert_eq!(view.remove(&String::from("b")), Ok(true));
        view.empty();
        assert!(view.is_empty());
    }
}
