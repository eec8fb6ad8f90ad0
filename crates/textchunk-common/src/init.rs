//! Process-level initialization

use std::sync::Once;

static INIT: Once = Once::new();

/// Load variables from a `.env` file in the working directory (or a parent)
///
/// Existing environment variables win over the file. Calling this more than
/// once is harmless.
pub fn initialize_environment() {
    INIT.call_once(|| {
        dotenvy::dotenv().ok();
    });
}
