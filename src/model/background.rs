use crate::foundation::error::{BackdropError, BackdropResult};

/// Largest accepted blur radius in pixels.
pub const MAX_BLUR_AMOUNT: u32 = 100;

/// Blur radius used by the built-in blur background.
pub const DEFAULT_BLUR_AMOUNT: u32 = 10;

/// Which layer sits behind the video.
///
/// The variant carries exactly the data it needs, so a blur radius exists only for `Blur`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackgroundKind {
    /// No background layer.
    None,
    /// A static picture fetched from `url`.
    Image {
        /// Where to load the picture from.
        url: String,
    },
    /// The source frame itself, blurred and darkened.
    Blur {
        /// Blur radius in pixels.
        #[serde(rename = "blurAmount")]
        blur_amount: u32,
    },
}

/// An immutable compositing background. Selecting another background swaps the value.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BackgroundAsset {
    /// Stable identifier (`office`, `blur`, `custom-<millis>`, ...).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Variant and its payload.
    #[serde(flatten)]
    pub kind: BackgroundKind,
}

impl BackgroundAsset {
    /// The explicit "no background" choice.
    pub fn none() -> Self {
        Self {
            id: "none".to_string(),
            name: "None".to_string(),
            kind: BackgroundKind::None,
        }
    }

    /// A static image background.
    pub fn image(
        id: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> BackdropResult<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(BackdropError::validation("image background url is empty"));
        }
        Ok(Self {
            id: id.into(),
            name: name.into(),
            kind: BackgroundKind::Image { url },
        })
    }

    /// A blurred-self background.
    pub fn blur(
        id: impl Into<String>,
        name: impl Into<String>,
        blur_amount: u32,
    ) -> BackdropResult<Self> {
        if blur_amount > MAX_BLUR_AMOUNT {
            return Err(BackdropError::validation(format!(
                "blur amount must be <= {MAX_BLUR_AMOUNT}px, got {blur_amount}"
            )));
        }
        Ok(Self {
            id: id.into(),
            name: name.into(),
            kind: BackgroundKind::Blur { blur_amount },
        })
    }

    /// A user-uploaded image, identified by upload time like `custom-1700000000000`.
    pub fn custom_image(name: impl Into<String>, url: impl Into<String>) -> BackdropResult<Self> {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Self::image(format!("custom-{millis}"), name, url)
    }

    /// Variant tag as used in serialized form.
    pub fn variant_tag(&self) -> &'static str {
        match self.kind {
            BackgroundKind::None => "none",
            BackgroundKind::Image { .. } => "image",
            BackgroundKind::Blur { .. } => "blur",
        }
    }

    /// Image URL, empty for `none` and `blur`.
    pub fn url(&self) -> &str {
        match &self.kind {
            BackgroundKind::Image { url } => url,
            _ => "",
        }
    }

    /// Blur radius, present iff the variant is `blur`.
    pub fn blur_amount(&self) -> Option<u32> {
        match self.kind {
            BackgroundKind::Blur { blur_amount } => Some(blur_amount),
            _ => None,
        }
    }

    /// Whether compositing this background needs an external fetch.
    pub fn needs_fetch(&self) -> bool {
        matches!(self.kind, BackgroundKind::Image { .. })
    }
}

const PRESETS: [(&str, &str, &str); 10] = [
    (
        "office",
        "Office",
        "https://images.unsplash.com/photo-1497366216548-37526070297c?w=1600&h=900&fit=crop",
    ),
    (
        "living-room",
        "Living Room",
        "https://images.unsplash.com/photo-1616486338812-3dadae4b4ace?w=1600&h=900&fit=crop",
    ),
    (
        "studio",
        "Studio",
        "https://images.unsplash.com/photo-1513151233558-d860c5398176?w=1600&h=900&fit=crop",
    ),
    (
        "beach",
        "Beach",
        "https://images.unsplash.com/photo-1507525428034-b723cf961d3e?w=1600&h=900&fit=crop",
    ),
    (
        "forest",
        "Forest",
        "https://images.unsplash.com/photo-1441974231531-c6227db76b6e?w=1600&h=900&fit=crop",
    ),
    (
        "mountain",
        "Mountain",
        "https://images.unsplash.com/photo-1464822759023-fed622ff2c3b?w=1600&h=900&fit=crop",
    ),
    (
        "city",
        "City",
        "https://images.unsplash.com/photo-1477959858617-67f85cf4f1df?w=1600&h=900&fit=crop",
    ),
    (
        "space",
        "Space",
        "https://images.unsplash.com/photo-1451187580459-43490279c0fa?w=1600&h=900&fit=crop",
    ),
    (
        "abstract",
        "Abstract",
        "https://images.unsplash.com/photo-1557683316-973673baf926?w=1600&h=900&fit=crop",
    ),
    (
        "gradient",
        "Gradient",
        "https://images.unsplash.com/photo-1557682250-33bd709cbe85?w=1600&h=900&fit=crop",
    ),
];

/// The built-in image backgrounds.
pub fn preset_backgrounds() -> Vec<BackgroundAsset> {
    PRESETS
        .iter()
        .map(|(id, name, url)| BackgroundAsset {
            id: (*id).to_string(),
            name: (*name).to_string(),
            kind: BackgroundKind::Image {
                url: (*url).to_string(),
            },
        })
        .collect()
}

/// The built-in blur background.
pub fn blur_background() -> BackgroundAsset {
    BackgroundAsset {
        id: "blur".to_string(),
        name: "Blur".to_string(),
        kind: BackgroundKind::Blur {
            blur_amount: DEFAULT_BLUR_AMOUNT,
        },
    }
}

/// Look up a built-in background (image presets, `blur`, `none`) by id.
pub fn find_preset(id: &str) -> Option<BackgroundAsset> {
    match id {
        "none" => Some(BackgroundAsset::none()),
        "blur" => Some(blur_background()),
        _ => preset_backgrounds().into_iter().find(|b| b.id == id),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/background.rs"]
mod tests;
