use num_traits::{One, PrimInt};

/// Trait implemented by flag enums declared with [`define_bitmask_flags!`].
///
/// The enum's discriminant (via `#[repr(u8)]`) determines the bit index.
/// You choose the backing integer type via the associated `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // Equivalent to: 1 << index
        // NOTE: Ensure your `bit_index()` is < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A small bitset over a flag enum.
///
/// Used for per-action input edges and per-state capabilities, where a handful of booleans
/// are read and cleared together every frame.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    // --- Single Tag Operations ---
    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    /// Add or remove `tag` depending on `value`.
    pub fn set<U: FlagBitmask<Storage = T>>(&mut self, tag: U, value: bool) {
        if value {
            self.add(tag);
        } else {
            self.remove(tag);
        }
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    // --- Bulk Operations ---
    pub fn add_many<U: FlagBitmask<Storage = T> + Copy>(&mut self, tags: &[U]) {
        for &tag in tags {
            self.add(tag);
        }
    }

    // --- Logic Gates ---
    pub fn has_any<U: FlagBitmask<Storage = T> + Copy>(&self, tags: &[U]) -> bool {
        if tags.is_empty() {
            return false;
        }
        let combined = tags.iter().fold(T::zero(), |acc, t| acc | t.mask());
        (self.bits & combined) != T::zero()
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }

    pub fn clear(&mut self) {
        self.bits = T::zero();
    }
}

/// Declare a bitmask-backed enum and implement `FlagBitmask` for it.
///
/// Also generates an `ALL` slice listing the variants in declaration order.
///
/// Example:
/// ```rust
/// locomotion::define_bitmask_flags!(Capability, u8, {
///     FindObjectsToEnter,
///     EnterChairs,
///     LeaveChairs,
/// });
/// assert_eq!(Capability::ALL.len(), 3);
/// ```
#[macro_export]
macro_rules! define_bitmask_flags {
    ($(#[$meta:meta])* $name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),*];
        }

        impl $crate::bitmask_flags::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    define_bitmask_flags!(Probe, u16, { A, B, C });

    #[test]
    fn set_and_remove_single_flags() {
        let mut flags = BitmaskFlags::<u16>::default();
        flags.add(Probe::B);
        assert!(flags.has(Probe::B));
        assert!(!flags.has(Probe::A));

        flags.set(Probe::B, false);
        assert!(flags.is_empty());
    }

    #[test]
    fn has_any_ignores_unrelated_bits() {
        let mut flags = BitmaskFlags::<u16>::default();
        flags.add_many(&[Probe::A, Probe::C]);

        assert!(flags.has_any(&[Probe::B, Probe::C]));
        assert!(!flags.has_any(&[Probe::B]));
        assert!(!flags.has_any::<Probe>(&[]));
        assert_eq!(flags.bits, 0b101);
    }

    #[test]
    fn all_lists_variants_in_order() {
        assert_eq!(Probe::ALL, &[Probe::A, Probe::B, Probe::C]);
    }
}
