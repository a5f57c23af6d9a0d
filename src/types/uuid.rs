//! UUID parameters (uuid crate).

use super::{Param, ToParam};

/// UUIDs are sent in their hyphenated text form.
impl ToParam for uuid::Uuid {
    fn to_param(&self) -> Param {
        Param::Text(self.hyphenated().to_string())
    }
}
