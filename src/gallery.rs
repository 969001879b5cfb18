//! Image lookup for `/api/image`

use std::path::Path;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Placeholder service used when no gallery image matches
pub const PLACEHOLDER_BASE: &str = "https://placehold.co/512x512";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage
{   pub url: String
  , #[serde(default)]
    pub tags: Vec<String>
}

/// Where a picked image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource
{   Gallery
  , Placeholder
}

#[derive(Debug, Clone, Default)]
pub struct Gallery
{   images: Vec<GalleryImage>
}

impl Gallery
{   pub fn new(images: Vec<GalleryImage>) -> Self
    {   Gallery { images }
    }

    /// Load a JSON array of `{url, tags}` entries.
    pub fn load(path: &Path) -> Result<Self, crate::error::Error>
    {   let raw = std::fs::read_to_string(path).map_err(|e| {
          crate::error::Error::InvalidConfiguration(
            format!("cannot read gallery {}: {}", path.display(), e)
          )
        })?;
        let images: Vec<GalleryImage> = serde_json::from_str(&raw).map_err(|e| {
          crate::error::Error::InvalidConfiguration(
            format!("invalid gallery {}: {}", path.display(), e)
          )
        })?;
        info!("Loaded {} gallery images from {}", images.len(), path.display());
        Ok(Gallery { images })
    }

    /// First image with a tag whose words appear consecutively in the
    /// prompt, otherwise a placeholder carrying the prompt text.
    pub fn pick(&self, prompt: &str) -> (String, ImageSource)
    {   let prompt_words = words(prompt);

        let hit = self.images.iter().find(|image| {
          image.tags.iter().any(|tag| {
            let tag = words(tag);
            !tag.is_empty() && prompt_words.windows(tag.len()).any(|w| w == tag.as_slice())
          })
        });
        match hit
        {   Some(image) => {
              debug!("Gallery match for prompt: {}", image.url);
              (image.url.clone(), ImageSource::Gallery)
            }
          , None => (placeholder_url(prompt), ImageSource::Placeholder)
        }
    }
}

/// Lowercased alphanumeric runs
fn words(text: &str) -> Vec<String>
{   text
      .split(|c: char| !c.is_alphanumeric())
      .filter(|w| !w.is_empty())
      .map(str::to_lowercase)
      .collect()
}

pub fn placeholder_url(prompt: &str) -> String
{   let text: String = url::form_urlencoded::byte_serialize(
      prompt.trim().as_bytes()
    ).collect();
    format!("{}?text={}", PLACEHOLDER_BASE, text)
}
