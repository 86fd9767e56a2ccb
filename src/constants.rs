//! System-wide constants: sentinel ids, persistence keys, and the
//! configuration identifiers covered by the shipped default rule table.

/// Reserved step id meaning "no predecessor". Step definitions authored
/// before dependency tracking carry this in their predecessor list; the
/// resolver skips it.
pub const NO_PREDECESSOR_ID: i64 = 0;

/// Key-value entry holding the whole serialized exclusion rule table.
pub const EXCLUSION_RULES_KEY: &str = "changeover.exclusion_rules";

/// Key-value entry holding the serialized in-progress session, empty when
/// no session is active.
pub const ACTIVE_SESSION_KEY: &str = "changeover.active_session";

/// Line configurations known to the shipped default exclusion table.
pub const DEFAULT_CONFIGS: [u32; 2] = [12, 16];
