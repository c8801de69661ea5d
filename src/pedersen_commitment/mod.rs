mod native;

// Re-exports for ergonomic access
pub use native::*;
