use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(image::ImageError),

    #[error("Image has no pixels")]
    EmptyImage,

    #[error("Cannot allocate a {width}x{height} surface")]
    Surface { width: u32, height: u32 },

    #[error("Invalid font data: {0}")]
    Font(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;
