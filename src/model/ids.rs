use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! row_id {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub u64);

            impl From<u64> for $name {
                fn from(v: u64) -> Self {
                    Self(v)
                }
            }

            impl From<$name> for u64 {
                fn from(v: $name) -> u64 {
                    v.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

row_id!(
    ObjectId,
    SourceId,
    StringId,
    TemplateId,
    ContextId,
    SegmentId,
    StringTranslationId,
    TranslationId,
    LogId,
);
