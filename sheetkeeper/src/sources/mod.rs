//! Metadata sources
//!
//! Both sources implement `MetadataSource` from the `types` module:
//! 1. **rich_media** - metadata-only extraction through the `yt-dlp` tool
//! 2. **page_title** - plain HTTP GET and `<title>` extraction
//!
//! `exclusion` holds the per-deployment list of hosts that must not be
//! looked up by the rich-media source.

pub mod exclusion;
pub mod page_title;
pub mod rich_media;

pub use exclusion::ExclusionPolicy;
pub use page_title::PageTitleSource;
pub use rich_media::RichMediaSource;
