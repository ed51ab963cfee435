//! The object table: admits reflective values under small integer handles,
//! recycles freed slots FIFO, and preserves identity across re-admission of
//! the same object.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::error::DispatchError;
use crate::runtime::Value;

/// Computes the identity key used to dedupe re-admission of the same
/// reference. Primitive values have no identity key: they are never folded
/// together even when value-equal, since value equality isn't reference
/// equality.
fn identity_key(value: &Value) -> Option<usize> {
    match value {
        Value::Str(s) => Some(Rc::as_ptr(s) as *const () as usize),
        Value::Class(c) => Some(Rc::as_ptr(c) as *const () as usize),
        Value::Method(m) => Some(Rc::as_ptr(m) as *const () as usize),
        Value::Null
        | Value::Byte(_)
        | Value::Boolean(_)
        | Value::Short(_)
        | Value::Char(_)
        | Value::Int(_)
        | Value::Float(_)
        | Value::Long(_)
        | Value::Double(_) => None,
    }
}

/// A process-wide map from non-negative handles to live reflective values.
#[derive(Default)]
pub struct ObjectTable {
    slots: Vec<Option<Value>>,
    free_list: VecDeque<u32>,
    identity_map: HashMap<usize, u32>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit `value`, returning its handle. If `value` is identity-tracked
    /// and already present, returns the existing handle instead of creating
    /// a new slot.
    pub fn admit(&mut self, value: Value) -> i32 {
        if let Some(key) = identity_key(&value) {
            if let Some(&handle) = self.identity_map.get(&key) {
                return handle as i32;
            }
        }

        let handle = match self.free_list.pop_front() {
            Some(h) => h,
            None => {
                let h = self.slots.len() as u32;
                self.slots.push(None);
                h
            }
        };

        if let Some(key) = identity_key(&value) {
            self.identity_map.insert(key, handle);
        }
        self.slots[handle as usize] = Some(value);
        handle as i32
    }

    /// Resolve a non-negative handle to the value it currently holds.
    pub fn resolve(&self, handle: i32) -> Result<&Value, DispatchError> {
        if handle < 0 {
            return Err(DispatchError::InvalidHandle(handle));
        }
        match self.slots.get(handle as usize) {
            Some(Some(value)) => Ok(value),
            _ => Err(DispatchError::VacantHandle(handle)),
        }
    }

    /// Vacate `handle`, releasing its identity-map entry (if any) in the same
    /// step and returning the slot to the free list.
    pub fn free(&mut self, handle: i32) -> Result<(), DispatchError> {
        if handle < 0 {
            return Err(DispatchError::InvalidHandle(handle));
        }
        let idx = handle as usize;
        match self.slots.get_mut(idx) {
            Some(slot) if slot.is_some() => {
                let value = slot.take().expect("checked Some above");
                if let Some(key) = identity_key(&value) {
                    self.identity_map.remove(&key);
                }
                self.free_list.push_back(idx as u32);
                Ok(())
            }
            Some(_) => Err(DispatchError::DoubleFree(handle)),
            None => Err(DispatchError::VacantHandle(handle)),
        }
    }

    /// Number of slots ever allocated (live + vacant), for tests.
    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[quickcheck]
    fn live_handles_are_always_distinct(admit_count: u8) -> bool {
        let mut table = ObjectTable::new();
        let admit_count = (admit_count % 32) as usize;
        let handles: Vec<i32> = (0..admit_count)
            .map(|i| table.admit(str_value(&format!("v{i}"))))
            .collect();
        let mut sorted = handles.clone();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.len() == handles.len()
    }

    fn str_value(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }

    #[test]
    fn monotonic_without_frees() {
        let mut table = ObjectTable::new();
        let handles: Vec<i32> = (0..5)
            .map(|i| table.admit(str_value(&format!("s{i}"))))
            .collect();
        assert_eq!(handles, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn identity_preserved_on_reentrant_admit() {
        let mut table = ObjectTable::new();
        let value = str_value("shared");
        let h1 = table.admit(value.clone());
        let h2 = table.admit(value);
        assert_eq!(h1, h2);
    }

    #[test]
    fn distinct_values_get_distinct_handles() {
        let mut table = ObjectTable::new();
        let h1 = table.admit(str_value("a"));
        let h2 = table.admit(str_value("b"));
        assert_ne!(h1, h2);
    }

    #[test]
    fn primitives_are_never_identity_folded() {
        let mut table = ObjectTable::new();
        let h1 = table.admit(Value::Int(42));
        let h2 = table.admit(Value::Int(42));
        assert_ne!(h1, h2);
    }

    #[test]
    fn freed_slots_are_reused_fifo() {
        let mut table = ObjectTable::new();
        let h0 = table.admit(str_value("a"));
        let h1 = table.admit(str_value("b"));
        let h2 = table.admit(str_value("c"));
        table.free(h0).unwrap();
        table.free(h1).unwrap();

        let reused0 = table.admit(str_value("d"));
        let reused1 = table.admit(str_value("e"));
        assert_eq!(reused0, h0);
        assert_eq!(reused1, h1);

        let fresh = table.admit(str_value("f"));
        assert_eq!(fresh, h2 + 1);
    }

    #[test]
    fn free_releases_identity_entry() {
        let mut table = ObjectTable::new();
        let value = str_value("shared");
        let h = table.admit(value.clone());
        table.free(h).unwrap();
        let h2 = table.admit(value);
        assert_eq!(h, h2, "slot index is reused, but it must be re-admitted fresh");
        // A second admit of the same reference after the first re-admission
        // should now alias the new slot, proving the old identity entry did
        // not linger.
        let h3 = table.admit(str_value("shared"));
        assert_ne!(h2, h3);
    }

    #[test]
    fn double_free_is_an_error() {
        let mut table = ObjectTable::new();
        let h = table.admit(str_value("a"));
        table.free(h).unwrap();
        assert!(matches!(table.free(h), Err(DispatchError::DoubleFree(_))));
    }

    #[test]
    fn resolve_vacant_is_an_error() {
        let table = ObjectTable::new();
        assert!(matches!(table.resolve(0), Err(DispatchError::VacantHandle(_))));
    }

    #[test]
    fn resolve_negative_is_invalid() {
        let table = ObjectTable::new();
        assert!(matches!(table.resolve(-1), Err(DispatchError::InvalidHandle(_))));
    }

    #[test]
    fn admit_after_reuse_round_trips_capacity() {
        let mut table = ObjectTable::new();
        let h0 = table.admit(str_value("a"));
        table.free(h0).unwrap();
        table.admit(str_value("b"));
        assert_eq!(table.capacity(), 1);
    }
}
