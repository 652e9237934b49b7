//! Configuration system.
//!
//! Consolidates configuration from four tiers with field-by-field YAML merging:
//! 1. **Defaults** - built into the binary
//! 2. **Project** - `$CWD/followup/config.yaml`
//! 3. **User** - `~/.followup/config.yaml`
//! 4. **Environment** - single-field overrides
//!
//! ## Environment Variables
//! - `FOLLOWUP_CONFIG_PATH` - Explicit config file (replaces project and user tiers)
//! - `FOLLOWUP_PROJECT_DIR` - Project config dir (default: `./followup`)
//! - `FOLLOWUP_USER_DIR` - User config dir (default: `~/.followup`)
//! - `FOLLOWUP_WEEK_START` - `sunday` or `monday`
//! - `FOLLOWUP_DATA_DIR` - Directory for the cart and wishlist files

mod loader;
mod merge;
mod types;

pub use loader::{CONFIG_FILE, ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{deep_merge, deep_merge_all, merge_into};
pub use types::*;
