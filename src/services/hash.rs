use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::model::Locale;

const STRING_NAMESPACE: Uuid = Uuid::from_u128(0x59ed7d1c_7eb5_45fa_9c8b_7a7057ed56d7);
const PATH_NAMESPACE: Uuid = Uuid::from_u128(0xfcab004a_2b50_11ea_978f_2e728ce88125);
const TEMPLATE_NAMESPACE: Uuid = Uuid::from_u128(0x4599eabc_3f8e_41a9_be61_95417d26a8cd);

/// Interning key of a source string. Text is hashed as given.
pub fn string_hash(locale: &Locale, text: &str) -> Uuid {
    let ns = Uuid::new_v5(&STRING_NAMESPACE, locale.as_str().as_bytes());
    Uuid::new_v5(&ns, text.as_bytes())
}

/// Interning key of a context path.
pub fn path_hash(path: &str) -> Uuid {
    Uuid::new_v5(&PATH_NAMESPACE, path.as_bytes())
}

pub fn template_hash(format: &str, template: &str) -> Uuid {
    let ns = Uuid::new_v5(&TEMPLATE_NAMESPACE, format.as_bytes());
    Uuid::new_v5(&ns, template.as_bytes())
}

/// sha256 hex of a canonical snapshot payload.
pub fn content_hash(canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}
