// Export modules for use in tests
pub mod fs_access;
pub mod import;
pub mod inputs;
pub use inputs::event_source;
pub mod library;
pub mod links;
pub mod main_app;
pub mod navigation;
pub mod reader;
pub mod session;
pub mod settings;
pub mod theme;
pub mod widget;
pub use widget::book_tree;
pub use widget::text_reader;
// Test utilities - only available when test-utils feature is enabled or during tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export main app components
pub use main_app::{App, FocusedPanel, run_app_with_event_source};
