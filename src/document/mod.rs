// Gateway module for document handling - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod loader;
mod splitter;

// Public re-exports - the ONLY way to access document functionality
pub use loader::{digest, extract_text, is_pdf_path, load_pdf, preview_lines, LoadedDocument};
pub use splitter::{RecursiveSplitter, DEFAULT_SEPARATORS};

#[cfg(test)]
pub(crate) use loader::tests;
