use std::path::Path;

use crate::error::{Result, StudioError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportFormat {
    Glb,
    Gltf,
}

impl ImportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImportFormat::Glb => "glb",
            ImportFormat::Gltf => "gltf",
        }
    }
}

/// Checks a user-picked file before anything is read from it.
pub fn validate_import_path(path: Option<&Path>) -> Result<ImportFormat> {
    let path = path.ok_or(StudioError::NoFileSelected)?;
    if path.as_os_str().is_empty() {
        return Err(StudioError::NoFileSelected);
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("glb") => Ok(ImportFormat::Glb),
        Some("gltf") => Ok(ImportFormat::Gltf),
        _ => Err(StudioError::UnsupportedFormat(path.display().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_gltf_family_only() {
        assert_eq!(
            validate_import_path(Some(Path::new("wing.GLB"))).ok(),
            Some(ImportFormat::Glb)
        );
        assert_eq!(
            validate_import_path(Some(Path::new("models/wing.gltf"))).ok(),
            Some(ImportFormat::Gltf)
        );
        assert!(matches!(
            validate_import_path(Some(Path::new("wing.obj"))),
            Err(StudioError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            validate_import_path(Some(Path::new("glb"))),
            Err(StudioError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            validate_import_path(None),
            Err(StudioError::NoFileSelected)
        ));
    }
}
