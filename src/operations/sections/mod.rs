mod generate_ortho_sections;

pub use generate_ortho_sections::{GenerateOrthoSections, OrthoSectionParams};
