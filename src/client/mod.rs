pub mod api;
pub mod hook;

pub use api::ApiClient;
pub use hook::DashboardHook;

/// Shown to the user whenever the sentiment load fails, whatever the cause.
pub const LOAD_ERROR: &str = "Failed to load dashboard data";
pub const COMPARE_ERROR: &str = "Failed to fetch comparison data";
