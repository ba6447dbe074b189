pub mod evidence;
pub mod exe;
pub mod kernel;
pub mod path;

#[cfg(any(test, feature = "test-utilities"))]
pub mod testutils;

pub(crate) mod crate_private {
    pub trait Sealed {}
}
