use std::ops::{BitAnd, BitOr, BitOrAssign};

macro_rules! options {
    ($name:ident) => {
        impl $name {
            /// First bit available to caller-defined options.
            pub const USER_OPTION_BASE: u32 = 17;

            pub const fn bits(self) -> u32 {
                self.0
            }
            pub const fn from_bits(bits: u32) -> Self {
                Self(bits)
            }
            /// Caller-defined option `n`, above the reserved range.
            pub const fn user(n: u32) -> Self {
                Self(1 << (Self::USER_OPTION_BASE + n))
            }
            /// True when every bit of `other` is set.
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }
        }
        impl BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }
        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }
        impl BitAnd for $name {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }
    };
}

/// Cascade switches for store and delete.
///
/// Composite flags include their prerequisites: `STORE_RELATED` implies
/// `STORE_REFERENCES` and `DELETE_ORPHANS` implies `DELETE_REFERENCES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StoreOptions(u32);

impl StoreOptions {
    pub const NONE: Self = Self(0);
    /// Store referencing entities after the entity itself.
    pub const STORE_REFERENCES: Self = Self(1 << 0);
    /// Store referenced entities before the entity itself.
    pub const STORE_RELATED: Self = Self((1 << 1) | Self::STORE_REFERENCES.0);
    /// Delete referencing entities before the entity itself.
    pub const DELETE_REFERENCES: Self = Self(1 << 2);
    /// Delete referenced entities left without owner.
    pub const DELETE_ORPHANS: Self = Self((1 << 3) | Self::DELETE_REFERENCES.0);
    pub const CASCADE: Self = Self(
        Self::STORE_REFERENCES.0
            | Self::STORE_RELATED.0
            | Self::DELETE_REFERENCES.0
            | Self::DELETE_ORPHANS.0,
    );
    /// Bits reserved for the runtime.
    pub const RESERVED: Self = Self(0xffff);
}
options!(StoreOptions);

/// Cascade switches for fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FetchOptions(u32);

impl FetchOptions {
    pub const NONE: Self = Self(0);
    /// Fetch related entities after each row.
    pub const FETCH_RELATED: Self = Self(1 << 0);
    pub const CASCADE: Self = Self::FETCH_RELATED;
    /// Allow related fetches of a multi-row fetch to overlap.
    pub const CONCURRENT: Self = Self(1 << 1);
    /// Bits reserved for the runtime.
    pub const RESERVED: Self = Self(0xffff);
}
options!(FetchOptions);
