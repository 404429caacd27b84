//! Material and section resolution into working units

mod material;
mod section;

pub use material::{
    GenericSteel, ManualConversion, MaterialResolver, MaterialStrategy, ResolvedMaterial,
    StructuredAccessor, DEFAULT_MATERIAL,
};
pub use section::{rotate_inertia, section_key, ResolvedSection, SectionResolver};
