use backdrop_core::Point;
use serde::{Deserialize, Serialize};

/// Where the background image sits inside the preview container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ImageRect {
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

/// The preview container the layered DOM preview is drawn in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PreviewViewport {
    /// Container width in CSS pixels.
    pub width: f64,
    /// Container height in CSS pixels.
    pub height: f64,
}

impl PreviewViewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// `object-fit: contain` placement of an `image_width x image_height`
    /// image, centered in the container.
    pub fn image_rect(&self, image_width: f64, image_height: f64) -> ImageRect {
        if image_width <= 0.0 || image_height <= 0.0 || self.width <= 0.0 || self.height <= 0.0 {
            return ImageRect {
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
            };
        }
        let zoom = (self.width / image_width).min(self.height / image_height);
        let width = image_width * zoom;
        let height = image_height * zoom;
        ImageRect {
            x: (self.width - width) / 2.0,
            y: (self.height - height) / 2.0,
            width,
            height,
        }
    }

    /// Convert a container position to image pixels. `None` outside the
    /// image.
    pub fn container_to_image(
        &self,
        point: &Point,
        image_width: f64,
        image_height: f64,
    ) -> Option<Point> {
        let rect = self.image_rect(image_width, image_height);
        if rect.width <= 0.0 || !rect.contains(point) {
            return None;
        }
        Some(Point::new(
            (point.x - rect.x) / rect.width * image_width,
            (point.y - rect.y) / rect.height * image_height,
        ))
    }

    /// Convert image pixels to a container position.
    pub fn image_to_container(&self, point: &Point, image_width: f64, image_height: f64) -> Point {
        let rect = self.image_rect(image_width, image_height);
        if image_width <= 0.0 || image_height <= 0.0 {
            return Point::new(rect.x, rect.y);
        }
        Point::new(
            rect.x + point.x / image_width * rect.width,
            rect.y + point.y / image_height * rect.height,
        )
    }

    /// Change in `(left, top)` for a pointer drag of `(dx, dy)` container
    /// pixels. `top` grows upward.
    pub fn drag_delta(&self, dx: f64, dy: f64, image_width: f64, image_height: f64) -> (f64, f64) {
        let rect = self.image_rect(image_width, image_height);
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return (0.0, 0.0);
        }
        (dx / rect.width * 100.0, -dy / rect.height * 100.0)
    }
}
