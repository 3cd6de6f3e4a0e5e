pub mod sync;
pub mod trip;
