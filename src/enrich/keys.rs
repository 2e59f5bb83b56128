//! Credential pool with rotation
//!
//! An ordered list of credentials for one external service plus a
//! process-lifetime rotation index. Rotation is guarded by a mutex so the
//! multi-threaded runtime cannot interleave read-modify-write cycles.

use std::sync::Mutex;

/// Ordered credential pool with a mutex-guarded rotation index
#[derive(Debug)]
pub struct KeyPool {
    keys: Vec<String>,
    index: Mutex<usize>,
}

impl KeyPool {
    /// Creates a pool from an ordered credential list
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            index: Mutex::new(0),
        }
    }

    /// Number of credentials in the pool
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the credential at the current rotation index
    pub fn current(&self) -> String {
        let index = *self.index.lock().expect("key pool mutex poisoned");
        self.keys[index % self.keys.len()].clone()
    }

    /// Advances the rotation index and returns the new current credential
    pub fn rotate(&self) -> String {
        let mut index = self.index.lock().expect("key pool mutex poisoned");
        *index = (*index + 1) % self.keys.len();
        self.keys[*index].clone()
    }

    /// One full cycle of credentials starting at the current rotation index
    ///
    /// Model-listing retries iterate this snapshot so a rotation by another
    /// task mid-listing cannot skip or repeat a credential.
    pub fn cycle(&self) -> Vec<String> {
        let start = *self.index.lock().expect("key pool mutex poisoned");
        (0..self.keys.len())
            .map(|offset| self.keys[(start + offset) % self.keys.len()].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> KeyPool {
        KeyPool::new(vec!["a".to_string(), "b".to_string(), "c".to_string()])
    }

    #[test]
    fn test_current_starts_at_first() {
        assert_eq!(pool().current(), "a");
    }

    #[test]
    fn test_rotate_advances_and_wraps() {
        let pool = pool();
        assert_eq!(pool.rotate(), "b");
        assert_eq!(pool.rotate(), "c");
        assert_eq!(pool.rotate(), "a");
        assert_eq!(pool.current(), "a");
    }

    #[test]
    fn test_cycle_starts_at_current_index() {
        let pool = pool();
        pool.rotate();
        assert_eq!(pool.cycle(), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_single_key_cycle() {
        let pool = KeyPool::new(vec!["only".to_string()]);
        assert_eq!(pool.rotate(), "only");
        assert_eq!(pool.cycle(), vec!["only"]);
    }
}
