use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Background removal failed: {0}")]
pub struct RemovalError(pub String);

/// Cuts the subject out of a photo: image bytes in, PNG with transparency
/// out. Called once per uploaded image.
pub trait BackgroundRemover {
    fn remove_background(&mut self, image: &[u8]) -> Result<Vec<u8>, RemovalError>;
}

impl<F> BackgroundRemover for F
where
    F: FnMut(&[u8]) -> Result<Vec<u8>, RemovalError>,
{
    fn remove_background(&mut self, image: &[u8]) -> Result<Vec<u8>, RemovalError> {
        self(image)
    }
}

/// Stand-in when no removal model is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRemover;

impl BackgroundRemover for NoRemover {
    fn remove_background(&mut self, _image: &[u8]) -> Result<Vec<u8>, RemovalError> {
        Err(RemovalError("no background remover configured".to_string()))
    }
}
