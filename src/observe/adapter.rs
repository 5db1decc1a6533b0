// ============================================================================
// deep-observe - Array Mutation Adapter
//
// Routes in-place array mutators through the observed node's write path.
// ============================================================================
//
// Each mutator is expressed as the element reads and writes the
// corresponding dynamic-language algorithm performs, with every write going
// through `Node::set`. A mutator therefore notifies once per element it
// assigns:
//
//   push(x)          1   (the new index)
//   unshift(x)       len + 1
//   shift()          len - 1, then a structural event
//   pop()            a structural event
//   reverse()        2 per swapped pair
//   fill / copy      1 per index written
//   sort()           len
//   slice()          none
//
// Shrinking the array has no index write to report, so it is reported as a
// structural event (key: None, old length, new length).
// ============================================================================

use std::cmp::Ordering;
use std::ops::RangeBounds;

use bitflags::bitflags;

use super::node::{Node, Target};
use crate::core::array::{default_compare, resolve_range, sort_values, Array};
use crate::core::constants::ARRAY_MUTATORS;
use crate::core::value::Value;
use crate::error::{Error, Result};

// =============================================================================
// MUTATOR SET
// =============================================================================

bitflags! {
    /// A set of array mutators.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MutatorSet: u16 {
        const PUSH = 1 << 0;
        const POP = 1 << 1;
        const UNSHIFT = 1 << 2;
        const SHIFT = 1 << 3;
        const SLICE = 1 << 4;
        const REVERSE = 1 << 5;
        const FILL = 1 << 6;
        const COPY_WITHIN = 1 << 7;
        const SORT = 1 << 8;
    }
}

impl MutatorSet {
    /// The flag for a mutator's method name (`"copyWithin"`, not `"COPY_WITHIN"`).
    pub fn from_method(name: &str) -> Option<Self> {
        match name {
            "push" => Some(Self::PUSH),
            "pop" => Some(Self::POP),
            "unshift" => Some(Self::UNSHIFT),
            "shift" => Some(Self::SHIFT),
            "slice" => Some(Self::SLICE),
            "reverse" => Some(Self::REVERSE),
            "fill" => Some(Self::FILL),
            "copyWithin" => Some(Self::COPY_WITHIN),
            "sort" => Some(Self::SORT),
            _ => None,
        }
    }

    /// Union of the named mutators; unknown names are ignored.
    pub fn from_methods<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        names
            .into_iter()
            .filter_map(Self::from_method)
            .fold(Self::empty(), |set, flag| set | flag)
    }

    /// The mutators every observed array has rebound.
    pub fn adapted() -> Self {
        Self::from_methods(ARRAY_MUTATORS)
    }
}

// =============================================================================
// ADAPT
// =============================================================================

/// Rebinds the mutators of `raw` so they run against `wrapped`.
///
/// After this, `raw.push(x)` has exactly the effect (and notifications) of
/// `wrapped.push(x)`.
pub(crate) fn adapt(raw: &Array, wrapped: Node) -> Node {
    raw.rebind(MutatorSet::adapted(), &wrapped);
    wrapped
}

// =============================================================================
// NODE MUTATORS
// =============================================================================

impl Node {
    fn array(&self, method: &'static str) -> Result<&Array> {
        match self.target() {
            Target::Array(array) => Ok(array),
            Target::Object(_) => Err(Error::NotAnArray {
                method,
                kind: "observed object",
            }),
        }
    }

    /// Appends `value`, returning the new length.
    pub fn push(&self, value: impl Into<Value>) -> Result<usize> {
        let len = self.array("push")?.len();
        self.set(len, value)?;
        Ok(self.len())
    }

    /// Appends every value in order, returning the new length.
    pub fn push_all<I>(&self, values: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let start = self.array("push")?.len();
        for (offset, value) in values.into_iter().enumerate() {
            self.set(start + offset, value)?;
        }
        Ok(self.len())
    }

    /// Removes and returns the last element.
    pub fn pop(&self) -> Result<Value> {
        let array = self.array("pop")?;
        let len = array.len();
        if len == 0 {
            return Ok(Value::Undefined);
        }
        let last = array.get(len - 1);
        array.truncate(len - 1);
        self.notify_structural(Value::from(len), Value::from(len - 1))?;
        Ok(last)
    }

    /// Inserts `value` at the front, returning the new length.
    pub fn unshift(&self, value: impl Into<Value>) -> Result<usize> {
        let array = self.array("unshift")?;
        for k in (0..array.len()).rev() {
            self.set(k + 1, array.get(k))?;
        }
        self.set(0, value)?;
        Ok(self.len())
    }

    /// Removes and returns the first element.
    pub fn shift(&self) -> Result<Value> {
        let array = self.array("shift")?;
        let len = array.len();
        if len == 0 {
            return Ok(Value::Undefined);
        }
        let first = array.get(0);
        for k in 1..len {
            self.set(k - 1, array.get(k))?;
        }
        array.truncate(len - 1);
        self.notify_structural(Value::from(len), Value::from(len - 1))?;
        Ok(first)
    }

    /// Copies a range of elements into a new plain array. Reports nothing.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Result<Array> {
        let array = self.array("slice")?;
        let (start, end) = resolve_range(range, array.len());
        Ok((start..end).map(|k| array.get(k)).collect())
    }

    /// Reverses in place by swapping from both ends.
    pub fn reverse(&self) -> Result<()> {
        let array = self.array("reverse")?;
        let len = array.len();
        for lower in 0..len / 2 {
            let upper = len - 1 - lower;
            let lower_value = array.get(lower);
            let upper_value = array.get(upper);
            self.set(lower, upper_value)?;
            self.set(upper, lower_value)?;
        }
        Ok(())
    }

    /// Assigns `value` to every index in `range`.
    pub fn fill(&self, value: impl Into<Value>, range: impl RangeBounds<usize>) -> Result<()> {
        let array = self.array("fill")?;
        let value = value.into();
        let (start, end) = resolve_range(range, array.len());
        for k in start..end {
            self.set(k, value.clone())?;
        }
        Ok(())
    }

    /// Copies the elements in `range` to the positions starting at `target`.
    pub fn copy_within(&self, target: usize, range: impl RangeBounds<usize>) -> Result<()> {
        let array = self.array("copyWithin")?;
        let len = array.len();
        let (start, end) = resolve_range(range, len);
        if target >= len {
            return Ok(());
        }
        let count = (end - start).min(len - target);

        // Copy back to front when the destination overlaps the source's tail
        if start < target && target < start + count {
            for i in (0..count).rev() {
                self.set(target + i, array.get(start + i))?;
            }
        } else {
            for i in 0..count {
                self.set(target + i, array.get(start + i))?;
            }
        }
        Ok(())
    }

    /// Sorts by string conversion, `Undefined` last.
    pub fn sort(&self) -> Result<()> {
        self.sort_by(default_compare)
    }

    /// Stable sort, then writes every index back in order.
    pub fn sort_by<F>(&self, compare: F) -> Result<()>
    where
        F: FnMut(&Value, &Value) -> Ordering,
    {
        let array = self.array("sort")?;
        let sorted = sort_values(array.to_vec(), compare);
        for (index, item) in sorted.into_iter().enumerate() {
            self.set(index, item)?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
