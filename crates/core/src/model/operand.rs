use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;

/// A named operand: a register, a logical flag, or a compound memory
/// expression such as `ebp-8`.
///
/// Operands order by length first and then by content, so sets iterate in a
/// stable order regardless of insertion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Operand(Cow<'static, str>);

impl Operand {
    /// Operand for a name that lives in a static table.
    pub const fn fixed(name: &'static str) -> Self {
        Operand(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Operand(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Ord for Operand {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.len().cmp(&other.0.len()).then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Operand {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Operand {
    fn from(name: &'static str) -> Self {
        Operand::fixed(name)
    }
}

impl From<String> for Operand {
    fn from(name: String) -> Self {
        Operand::new(name)
    }
}

/// Set of unique operands.
///
/// Insertion is idempotent and empty names are rejected, so every member of
/// an instruction's operand sets has non-empty text.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct OperandSet(BTreeSet<Operand>);

impl OperandSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an operand; returns `true` if it was not already present.
    pub fn insert(&mut self, operand: impl Into<Operand>) -> bool {
        let operand = operand.into();
        if operand.is_empty() {
            return false;
        }
        self.0.insert(operand)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|op| op.as_str() != name);
        before != self.0.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|op| op.as_str() == name)
    }

    pub fn contains_operand(&self, operand: &Operand) -> bool {
        self.0.contains(operand)
    }

    /// True if any member of `self` is also in `other`.
    pub fn intersects(&self, other: &OperandSet) -> bool {
        self.0.iter().any(|op| other.0.contains(op))
    }

    /// True if any member's name appears in `names`.
    pub fn contains_any(&self, names: &[&str]) -> bool {
        self.0.iter().any(|op| names.contains(&op.as_str()))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, Operand> {
        self.0.iter()
    }

    /// Names of all members, in set order.
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(Operand::as_str).collect()
    }
}

impl<'a> IntoIterator for &'a OperandSet {
    type Item = &'a Operand;
    type IntoIter = btree_set::Iter<'a, Operand>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T: Into<Operand>> FromIterator<T> for OperandSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = OperandSet::new();
        set.extend(iter);
        set
    }
}

impl<T: Into<Operand>> Extend<T> for OperandSet {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for op in iter {
            self.insert(op);
        }
    }
}

impl fmt::Display for OperandSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, op) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(op.as_str())?;
        }
        f.write_str("}")
    }
}
