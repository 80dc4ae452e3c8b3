//! Constant pool for finalized code.
//!
//! The constant pool stores the compile-time values referenced by `Const`
//! slot operands, such as literals and type names.

use bcir_core::Value;
use rustc_hash::FxHashMap;

/// Per-unit constant pool with deduplication.
///
/// Identical constants referenced from several instructions share one entry.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    /// The actual constants.
    constants: Vec<Value>,
    /// Deduplication index: maps constant to its index.
    index: FxHashMap<Value, u32>,
}

impl ConstantPool {
    /// Create a new empty constant pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or get existing constant, returns index.
    pub fn add(&mut self, constant: Value) -> u32 {
        if let Some(&idx) = self.index.get(&constant) {
            return idx;
        }

        let idx = self.constants.len() as u32;
        self.constants.push(constant.clone());
        self.index.insert(constant, idx);
        idx
    }

    /// Get constant by index.
    pub fn get(&self, index: u32) -> Option<&Value> {
        self.constants.get(index as usize)
    }

    /// Get all constants.
    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    /// Number of constants.
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    /// Check if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pool_is_empty() {
        let pool = ConstantPool::new();
        assert!(pool.is_empty());
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn add_and_get() {
        let mut pool = ConstantPool::new();
        let idx = pool.add(Value::Int(42));
        assert_eq!(idx, 0);
        assert_eq!(pool.get(idx), Some(&Value::Int(42)));
    }

    #[test]
    fn deduplication() {
        let mut pool = ConstantPool::new();

        let idx1 = pool.add(Value::Int(100));
        let idx2 = pool.add(Value::str("100"));
        let idx3 = pool.add(Value::Int(100));

        assert_eq!(idx1, 0);
        assert_eq!(idx2, 1);
        assert_eq!(idx3, 0);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn float_deduplication_by_bits() {
        let mut pool = ConstantPool::new();

        let idx1 = pool.add(Value::float(1.0));
        let idx2 = pool.add(Value::float(1.0));

        assert_eq!(idx1, idx2);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn get_out_of_bounds() {
        let pool = ConstantPool::new();
        assert_eq!(pool.get(0), None);
    }

    #[test]
    fn constants_slice() {
        let mut pool = ConstantPool::new();
        pool.add(Value::None);
        pool.add(Value::Bool(true));

        assert_eq!(pool.constants(), &[Value::None, Value::Bool(true)]);
    }
}
