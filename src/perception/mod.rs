pub mod fingerprint;
pub mod grid;
pub mod screenshot;
pub mod traits;
pub mod types;
pub mod ui_automation;
