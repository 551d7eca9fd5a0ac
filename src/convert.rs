use crate::{
    config::{Format, Settings},
    wavefront,
};
use model::Model;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("decoding failed: {0}")]
    Decode(#[from] mcsa::Error),
    #[error("MS3D encoding failed: {0}")]
    Ms3d(#[from] ms3d::Error),
    #[error("OBJ encoding failed: {0}")]
    Obj(std::io::Error),
    #[error("RON encoding failed: {0}")]
    Ron(String),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Encode an already decoded model.
pub fn encode(model: &Model, format: Format, settings: &Settings) -> Result<Vec<u8>, ConvertError> {
    match format {
        Format::Ms3d => Ok(ms3d::to_bytes(model, &settings.ms3d_options())?),
        Format::Obj => wavefront::to_bytes(model).map_err(ConvertError::Obj),
        Format::Ron => ron::ser::to_string_pretty(model, ron::ser::PrettyConfig::default())
            .map(String::into_bytes)
            .map_err(|e| ConvertError::Ron(e.to_string())),
    }
}

/// Decode MCSA bytes and re-encode them as `format`.
pub fn convert(data: &[u8], format: Format, settings: &Settings) -> Result<Vec<u8>, ConvertError> {
    let model = mcsa::load_bytes(data)?;
    log::debug!(
        "\tDecoded {} meshes, {} vertices, {} polygons",
        model.meshes.len(),
        model.total_vertices(),
        model.total_polygons()
    );
    encode(&model, format, settings)
}

/// Source path with the suffix of `format`.
pub fn output_path(source: &Path, format: Format) -> PathBuf {
    source.with_extension(format.extension())
}

/// Convert one file, returning where the result was written.
pub fn convert_file(
    source: &Path,
    output: Option<&Path>,
    format: Format,
    settings: &Settings,
) -> Result<PathBuf, ConvertError> {
    let data = fs::read(source).map_err(|source_err| ConvertError::Io {
        path: source.to_path_buf(),
        source: source_err,
    })?;
    let encoded = convert(&data, format, settings)?;
    let dest = output.map_or_else(|| output_path(source, format), Path::to_path_buf);
    fs::write(&dest, encoded).map_err(|source| ConvertError::Io {
        path: dest.clone(),
        source,
    })?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_suffix() {
        assert_eq!(
            output_path(Path::new("models/hero.mcsa"), Format::Ms3d),
            PathBuf::from("models/hero.ms3d")
        );
        assert_eq!(output_path(Path::new("hero"), Format::Obj), PathBuf::from("hero.obj"));
    }

    #[test]
    fn ron_dump() {
        let text = encode(&Model::default(), Format::Ron, &Settings::default()).unwrap();
        let model: Model = ron::de::from_bytes(&text).unwrap();
        assert_eq!(model, Model::default());
    }
}
