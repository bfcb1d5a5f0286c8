//! Run-scoped resource naming.
//!
//! Every resource a run creates is named from one uniqueness token, so
//! concurrent runs against the same account never collide.

use uuid::Uuid;

/// The per-run resource names, all derived from a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunNames {
    /// The uniqueness token itself.
    pub token: String,
    /// Job name.
    pub job: String,
    /// Input asset name.
    pub input_asset: String,
    /// Output asset name (requested; the actual name may differ after a
    /// collision rename).
    pub output_asset: String,
    /// Streaming locator name.
    pub locator: String,
}

impl RunNames {
    /// Draw a fresh token and derive all names from it.
    pub fn generate(output_base: &str) -> Self {
        let token = Uuid::new_v4().simple().to_string();
        Self {
            job: format!("job-{token}"),
            input_asset: format!("input-{token}"),
            output_asset: format!("{output_base}-{token}"),
            locator: format!("locator-{token}"),
            token,
        }
    }
}

/// A fresh suffix for collision renames.
pub fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()
}
