pub mod context;
pub mod ids;
pub mod locale;
pub mod object;
pub mod segment;
pub mod source;
pub mod string;
pub mod translation;

pub use context::TranslationContext;
pub use ids::{
    ContextId, LogId, ObjectId, SegmentId, SourceId, StringId, StringTranslationId, TemplateId,
    TranslationId,
};
pub use locale::Locale;
pub use object::{ObjectKey, TranslatableObject};
pub use segment::{Segment, SegmentKind, SegmentValue, SegmentValueKind};
pub use source::TranslationSource;
pub use string::{SourceString, Template};
pub use translation::{StringTranslation, Translation, TranslationLog};
