pub mod dashboard;

pub use dashboard::{DashboardPanel, PanelError, PanelSettings, PanelState};
