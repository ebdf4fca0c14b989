const IMAGE_SERVICE_URL: &str = "https://images.igdb.com/igdb/image/upload";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    CoverSmall,
    CoverBig,
    ScreenshotBig,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::CoverSmall => "cover_small",
            ImageSize::CoverBig => "cover_big",
            ImageSize::ScreenshotBig => "screenshot_big",
        }
    }
}

/// Builds the retina sized image URL for a catalog image id.
pub fn game_image_url(image_id: &str, size: ImageSize) -> String {
    format!("{IMAGE_SERVICE_URL}/t_{}_2x/{image_id}.png", size.as_str())
}
