/// Storage prefix the service sometimes leaves on image paths.
const STORAGE_PREFIX: &str = "database/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub source: String,
    pub label: String,
}

/// At most one enlarged image, plus a zoom flag that resets per image.
#[derive(Debug, Default)]
pub struct ImagePreview {
    selected: Option<PreviewImage>,
    zoomed: bool,
}

impl ImagePreview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, source: String, label: String) {
        self.selected = Some(PreviewImage { source, label });
        self.zoomed = false;
    }

    pub fn close(&mut self) {
        self.selected = None;
        self.zoomed = false;
    }

    /// Clicks inside the content area keep the preview open.
    pub fn backdrop_click(&mut self, on_content: bool) {
        if !on_content {
            self.close();
        }
    }

    pub fn toggle_zoom(&mut self) {
        if self.selected.is_some() {
            self.zoomed = !self.zoomed;
        }
    }

    pub fn selected(&self) -> Option<&PreviewImage> {
        self.selected.as_ref()
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoomed
    }
}

/// Turn a stored image path into a fetchable URL: drop the storage prefix and
/// convert Windows separators.
pub fn resolve_image_url(base_url: &str, image_path: &str) -> String {
    let normalized = image_path.replace('\\', "/");
    let relative = normalized
        .strip_prefix(STORAGE_PREFIX)
        .unwrap_or(&normalized)
        .trim_start_matches('/');
    format!("{}/{relative}", base_url.trim_end_matches('/'))
}
