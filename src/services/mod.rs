pub mod assemble;
pub mod context;
pub mod encoding;
pub mod hash;
pub mod interner;
pub mod memory;
pub mod normalize;
pub mod objects;
pub mod segments;
pub mod sources;
pub mod staging;
pub mod submit;
pub mod translations;
