use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use alchemy_rendering::RenderingError;
use anyhow::{bail, Context, Result};
use macroquad::texture::{FilterMode, Texture2D};
use tracing::{debug, warn};

const SUPPORTED_MANIFEST_VERSION: u32 = 1;
const MANIFEST_FILE: &str = "manifest.toml";
const ICON_EXTENSION: &str = "png";

/// Magenta and black checkerboard substituted for icons that fail to load.
const PLACEHOLDER_PIXELS: [u8; 16] = [
    255, 0, 255, 255, 0, 0, 0, 255, //
    0, 0, 0, 255, 255, 0, 255, 255,
];

/// Lazily populated cache of icon textures keyed by icon name.
///
/// Icons live at `<directory>/<key>.png` unless the optional
/// `<directory>/manifest.toml` maps the key to another file. A key that
/// cannot be loaded is logged once and then served by the placeholder.
#[derive(Debug)]
pub(crate) struct IconCache {
    directory: PathBuf,
    overrides: HashMap<String, PathBuf>,
    textures: HashMap<String, Texture2D>,
    placeholder: Texture2D,
}

impl IconCache {
    /// Opens the icon directory, reading its manifest when present.
    pub(crate) fn open(directory: &Path, placeholder: Texture2D) -> Result<Self> {
        let manifest_path = directory.join(MANIFEST_FILE);
        let overrides = match fs::read_to_string(&manifest_path) {
            Ok(contents) => parse_manifest(&contents, directory).with_context(|| {
                format!("invalid icon manifest at {}", manifest_path.display())
            })?,
            Err(error) if error.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(error) => {
                return Err(error).with_context(|| {
                    format!("failed to read icon manifest at {}", manifest_path.display())
                })
            }
        };

        debug!(
            directory = %directory.display(),
            overrides = overrides.len(),
            "icon cache opened"
        );
        Ok(Self {
            directory: directory.to_path_buf(),
            overrides,
            textures: HashMap::new(),
            placeholder,
        })
    }

    /// Builds the texture drawn in place of missing icons.
    pub(crate) fn placeholder_texture() -> Texture2D {
        let texture = Texture2D::from_rgba8(2, 2, &PLACEHOLDER_PIXELS);
        texture.set_filter(FilterMode::Nearest);
        texture
    }

    /// Location the icon for `key` is loaded from.
    pub(crate) fn path_for(&self, key: &str) -> PathBuf {
        self.overrides
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.directory.join(key).with_extension(ICON_EXTENSION))
    }

    /// Texture for `key`, loading it on first use.
    pub(crate) fn resolve(&mut self, key: &str) -> Texture2D {
        self.resolve_with(key, load_icon)
    }

    fn resolve_with(
        &mut self,
        key: &str,
        loader: impl FnOnce(&str, &Path) -> Result<Texture2D, RenderingError>,
    ) -> Texture2D {
        if let Some(texture) = self.textures.get(key) {
            return *texture;
        }

        let path = self.path_for(key);
        let texture = match loader(key, &path) {
            Ok(texture) => texture,
            Err(error) => {
                warn!(%error, path = %path.display(), "substituting placeholder icon");
                self.placeholder
            }
        };
        let _ = self.textures.insert(key.to_owned(), texture);
        texture
    }

    #[cfg(test)]
    fn cached(&self) -> usize {
        self.textures.len()
    }
}

fn load_icon(key: &str, path: &Path) -> Result<Texture2D, RenderingError> {
    let bytes = fs::read(path).map_err(|_| RenderingError::MissingIconAsset {
        key: key.to_owned(),
    })?;
    let pixels = decode_icon(key, &bytes)?;
    let texture = Texture2D::from_rgba8(pixels.width, pixels.height, &pixels.rgba);
    texture.set_filter(FilterMode::Nearest);
    Ok(texture)
}

/// Decoded RGBA pixels ready for upload.
#[derive(Debug)]
struct IconPixels {
    width: u16,
    height: u16,
    rgba: Vec<u8>,
}

/// Decodes icon bytes without touching the GPU.
///
/// Corrupt files and images too large for a texture are reported instead of
/// aborting the session.
fn decode_icon(key: &str, bytes: &[u8]) -> Result<IconPixels, RenderingError> {
    let invalid = |reason: String| RenderingError::InvalidIconAsset {
        key: key.to_owned(),
        reason,
    };

    let image = image::load_from_memory(bytes)
        .map_err(|error| invalid(error.to_string()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    let width = u16::try_from(width).map_err(|_| invalid(format!("width {width} too large")))?;
    let height =
        u16::try_from(height).map_err(|_| invalid(format!("height {height} too large")))?;
    Ok(IconPixels {
        width,
        height,
        rgba: image.into_raw(),
    })
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    #[serde(default)]
    icons: HashMap<String, String>,
}

fn parse_manifest(contents: &str, base_path: &Path) -> Result<HashMap<String, PathBuf>> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse icon manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported icon manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }

    let mut resolved = HashMap::with_capacity(manifest.icons.len());
    for (key, relative_path) in manifest.icons {
        if key.trim().is_empty() {
            bail!("icon manifest contains an empty key");
        }
        let _ = resolved.insert(key, base_path.join(relative_path));
    }
    Ok(resolved)
}
