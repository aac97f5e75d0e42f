//! Media probe backed by `lofty`.
//!
//! Duration comes from the container's audio properties. The thumbnail for a
//! video is its embedded cover picture (MP4 `covr`), encoded as a data URL;
//! frame grabbing is left to hosts that have a decoder.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::media::{MediaFile, MediaProbe};
use bytes::Bytes;
use lofty::config::ParseOptions;
use lofty::file::{AudioFile, TaggedFile, TaggedFileExt};
use lofty::probe::Probe;
use std::io::Cursor;
use tracing::debug;

/// [`MediaProbe`] that parses the file in memory.
#[derive(Debug, Clone, Default)]
pub struct LoftyMediaProbe {
    parse_options: ParseOptions,
}

impl LoftyMediaProbe {
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::new(),
        }
    }

    fn parse(data: &Bytes, options: ParseOptions) -> Option<TaggedFile> {
        Probe::new(Cursor::new(data.as_ref()))
            .options(options)
            .guess_file_type()
            .ok()?
            .read()
            .ok()
    }

    async fn parse_blocking(&self, file: &MediaFile) -> Option<TaggedFile> {
        let data = file.data.clone();
        let options = self.parse_options;
        tokio::task::spawn_blocking(move || Self::parse(&data, options))
            .await
            .ok()
            .flatten()
    }
}

#[async_trait]
impl MediaProbe for LoftyMediaProbe {
    async fn duration_secs(&self, file: &MediaFile) -> f64 {
        match self.parse_blocking(file).await {
            Some(tagged) => tagged.properties().duration().as_secs_f64(),
            None => {
                debug!(mime_type = %file.mime_type, "Could not determine duration");
                0.0
            }
        }
    }

    async fn thumbnail(&self, file: &MediaFile) -> Option<String> {
        if !file.is_video() {
            return None;
        }

        let tagged = self.parse_blocking(file).await?;
        let tag = tagged.primary_tag().or_else(|| tagged.first_tag())?;
        let picture = tag.pictures().first()?;
        let mime = picture
            .mime_type()
            .map(|mime| mime.as_str().to_string())
            .unwrap_or_else(|| "image/jpeg".to_string());

        Some(format!("data:{};base64,{}", mime, STANDARD.encode(picture.data())))
    }
}
