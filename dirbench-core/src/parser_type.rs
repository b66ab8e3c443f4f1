use std::ops::{Index, IndexMut};

use strum::{EnumCount as _, IntoEnumIterator as _};

/// Category of resource a scanner probe was derived from.
///
/// The declaration order is the column order of every report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::EnumString,
    strum::Display,
    strum::IntoStaticStr,
    strum::EnumIter,
    strum::EnumCount,
)]
pub enum ParserType {
    Dict,
    Link,
    Href,
    Service,
    Redirect,
    Index,
    Src,
    Script,
}

impl ParserType {
    pub fn all() -> impl Iterator<Item = ParserType> {
        Self::iter()
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Total mapping from every [`ParserType`] to a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerParser<T> {
    slots: [T; ParserType::COUNT],
}

impl<T: Default> Default for PerParser<T> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| T::default()),
        }
    }
}

impl<T> PerParser<T> {
    pub fn from_fn(mut f: impl FnMut(ParserType) -> T) -> Self {
        let mut types = ParserType::iter();
        Self {
            slots: std::array::from_fn(|_| match types.next() {
                Some(ty) => f(ty),
                None => unreachable!("ParserType::COUNT matches the variant list"),
            }),
        }
    }

    /// Entries in report column order.
    pub fn iter(&self) -> impl Iterator<Item = (ParserType, &T)> {
        ParserType::iter().zip(self.slots.iter())
    }
}

impl<T> Index<ParserType> for PerParser<T> {
    type Output = T;

    fn index(&self, ty: ParserType) -> &T {
        &self.slots[ty.slot()]
    }
}

impl<T> IndexMut<ParserType> for PerParser<T> {
    fn index_mut(&mut self, ty: ParserType) -> &mut T {
        &mut self.slots[ty.slot()]
    }
}
