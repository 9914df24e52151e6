//! Closed permission set a caller requests a page under. the contract:
//! "any other value -> DbException(\"invalid permission\")" — in Rust
//! that's simply not representable since the enum has exactly these
//! two variants, so the illegal-value case can't arise past the type
//! checker.

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Permissions {
    ReadOnly,
    ReadWrite,
}
