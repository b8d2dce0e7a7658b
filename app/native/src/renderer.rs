//! Fallback rendering.
//!
//! When the desktop refuses the downloaded file as-is, the image is decoded
//! and re-encoded as an uncompressed 24-bit BMP, the format every desktop
//! backend accepts.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::bmp::BmpEncoder;
use image::{ImageError, ImageReader};
use thiserror::Error;

/// Errors that can occur while converting an image.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The source file could not be opened.
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The source is corrupt or in a format without codec support.
    #[error("cannot decode image: {0}")]
    Decode(#[from] ImageError),
    /// The bitmap could not be encoded.
    #[error("cannot encode bitmap: {0}")]
    Encode(ImageError),
    /// The target could not be written.
    #[error("cannot write bitmap: {0}")]
    Io(#[from] std::io::Error),
}

/// Converts a source image into the fallback wallpaper format.
pub trait Renderer {
    /// Writes a converted copy of `source` to `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be decoded or the target cannot be written.
    fn convert(&self, source: &Path, target: &Path) -> Result<(), ConvertError>;
}

/// [`Renderer`] producing BMP files with the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitmapRenderer;

impl Renderer for BitmapRenderer {
    fn convert(&self, source: &Path, target: &Path) -> Result<(), ConvertError> {
        let read_err = |err| ConvertError::Read { path: source.to_path_buf(), source: err };

        // Format comes from the content; extensions from URLs are not trusted.
        let img = ImageReader::open(source)
            .map_err(read_err)?
            .with_guessed_format()
            .map_err(read_err)?
            .decode()?;
        let rgb = img.to_rgb8();

        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;
        let mut temp =
            tempfile::Builder::new().prefix(".convert_").suffix(".part").tempfile_in(dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            rgb.write_with_encoder(BmpEncoder::new(&mut writer)).map_err(ConvertError::Encode)?;
            writer.flush()?;
        }
        temp.persist(target).map_err(|err| ConvertError::Io(err.error))?;

        tracing::debug!(
            source = %source.display(),
            target = %target.display(),
            width = rgb.width(),
            height = rgb.height(),
            "converted image to bitmap"
        );
        Ok(())
    }
}
