//! Theme block library
//!
//! Concrete block definitions shipped with the crate. Each module exposes a
//! `definition()` constructor; [`register_theme_blocks`] adds all of them to
//! a registry builder.

pub mod section_process;
pub mod section_text_image;
pub mod section_text_two_cta;
pub mod section_title_text_horizontal;
pub mod section_wide_image;
pub mod site_footer;

use crate::core::block::{BlockCategory, BlockMetadata};
use crate::core::registry::{BlockRegistry, RegistryBuilder, RegistryError};

/// Namespace of the theme's blocks
pub const NAMESPACE: &str = "julianboelen";

/// Inserter category of the theme's section blocks
pub fn sections_category() -> BlockCategory {
    BlockCategory::Custom(format!("{}-blocks", NAMESPACE))
}

/// Register every theme block
pub fn register_theme_blocks(builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
    builder.define(section_process::definition())?;
    builder.define(section_text_image::definition())?;
    builder.define(section_text_two_cta::definition())?;
    builder.define(section_title_text_horizontal::definition())?;
    builder.define(section_wide_image::definition())?;
    builder.define(site_footer::definition())?;
    Ok(())
}

/// Sealed registry holding only the theme blocks
pub fn theme_registry() -> Result<BlockRegistry, RegistryError> {
    let mut builder = BlockRegistry::builder();
    register_theme_blocks(&mut builder)?;
    Ok(builder.build())
}

fn metadata(
    slug: &str,
    title: &str,
    description: &str,
    category: BlockCategory,
    icon: &str,
    keywords: &[&str],
) -> BlockMetadata {
    BlockMetadata {
        name: format!("{}/{}", NAMESPACE, slug),
        title: title.into(),
        description: description.into(),
        category,
        icon: icon.into(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_registry() {
        let registry = theme_registry().unwrap();
        assert_eq!(registry.count(), 6);
        assert!(registry.contains(section_process::NAME));
        assert!(registry.contains(section_text_image::NAME));
        assert!(registry.contains(section_text_two_cta::NAME));
        assert!(registry.contains(section_title_text_horizontal::NAME));
        assert!(registry.contains(section_wide_image::NAME));
        assert!(registry.contains(site_footer::NAME));
        assert_eq!(registry.get_blocks_by_category(&sections_category()).len(), 5);
    }

    #[test]
    fn test_registering_twice_fails() {
        let mut builder = BlockRegistry::builder();
        register_theme_blocks(&mut builder).unwrap();
        let err = register_theme_blocks(&mut builder).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateBlock(_)));
    }
}
