use serde::{Deserialize, Serialize};

pub const INVITE_LINK_PREFIX: &str = "https://t.me/";

/// Unit group entity: the chat group registered for one academic unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitGroup {
    pub unit_code: String,
    pub unit_name: String,
    pub link: String,
}

impl UnitGroup {
    /// The three-letter programme prefix of the unit code.
    pub fn prefix(&self) -> &str {
        self.unit_code.get(..3).unwrap_or(&self.unit_code)
    }
}

/// Returns true for codes made of three ASCII letters followed by three ASCII digits.
pub fn is_valid_unit_code(unit_code: &str) -> bool {
    let bytes = unit_code.as_bytes();
    bytes.len() == 6
        && bytes[..3].iter().all(u8::is_ascii_alphabetic)
        && bytes[3..].iter().all(u8::is_ascii_digit)
}

/// Canonical (upper-case) form of a unit code.
pub fn normalize_unit_code(unit_code: &str) -> String {
    unit_code.trim().to_ascii_uppercase()
}

pub fn is_valid_invite_link(link: &str) -> bool {
    link.len() > INVITE_LINK_PREFIX.len() && link.starts_with(INVITE_LINK_PREFIX)
}
