use std::sync::LazyLock;

use fancy_regex::Regex;

use super::config::ImageConfig;
use super::loader::{ImageLoader, ImageLoaderConfig};
use super::source::PictureSource;
use crate::{Error, Result};

// Originals this large are served as-is.
const FIXED_SRCSET_WIDTH_LIMIT: u32 = 1920;
const FIXED_SRCSET_HEIGHT_LIMIT: u32 = 1080;

// `sizes="100vw"` never selects a candidate narrower than this.
const VIEWPORT_BREAKPOINT_CUTOFF: u32 = 640;

const DENSITY_SRCSET_MULTIPLIERS: &[u32] = &[1, 2];

const SRCSET_SEPARATOR: &str = ", ";

static WIDTH_DESCRIPTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9]\d*w$").expect("width descriptor pattern compiles"));

static DENSITY_DESCRIPTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?=.*[1-9])\d+(\.\d+)?x$").expect("density descriptor pattern compiles")
});

static URL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?!,)\S+$").expect("url token pattern compiles"));

/// Loader URL of `source` at its natural size.
pub fn base_image_url(source: &PictureSource, loader: &dyn ImageLoader) -> String {
    loader.load(&ImageLoaderConfig::new(source.srcset.as_str()))
}

/// Derives the `srcset` attribute for `source`.
///
/// Width descriptors are used when `sizes` is set, density descriptors
/// (`1x, 2x`) for a fixed width. Sources without dimensions, oversized
/// originals and non-transforming loaders get the plain loader URL.
pub fn responsive_srcset(
    source: &PictureSource,
    config: &ImageConfig,
    loader: &dyn ImageLoader,
) -> String {
    derived_srcset(source, config, loader).unwrap_or_else(|| base_image_url(source, loader))
}

/// Descriptor list built for `source`, or `None` when the plain loader URL
/// is used as-is.
pub(crate) fn derived_srcset(
    source: &PictureSource,
    config: &ImageConfig,
    loader: &dyn ImageLoader,
) -> Option<String> {
    if source.width.is_none() && source.height.is_none() {
        return None;
    }

    let oversized = source.width.is_some_and(|w| w > FIXED_SRCSET_WIDTH_LIMIT)
        || source.height.is_some_and(|h| h > FIXED_SRCSET_HEIGHT_LIMIT);
    if oversized || loader.is_noop() {
        return None;
    }

    if let Some(sizes) = &source.sizes {
        let viewport_only = sizes.trim() == "100vw";
        let srcset = config
            .breakpoints()
            .iter()
            .filter(|bp| !viewport_only || **bp >= VIEWPORT_BREAKPOINT_CUTOFF)
            .map(|bp| {
                let url =
                    loader.load(&ImageLoaderConfig::new(source.srcset.as_str()).with_width(*bp));
                format!("{url} {bp}w")
            })
            .collect::<Vec<_>>()
            .join(SRCSET_SEPARATOR);
        return Some(srcset);
    }

    let width = source.width?;
    let srcset = DENSITY_SRCSET_MULTIPLIERS
        .iter()
        .map(|multiplier| {
            let url = loader.load(
                &ImageLoaderConfig::new(source.srcset.as_str())
                    .with_width(width.saturating_mul(*multiplier)),
            );
            format!("{url} {multiplier}x")
        })
        .collect::<Vec<_>>()
        .join(SRCSET_SEPARATOR);
    Some(srcset)
}

/// One `url [descriptor]` entry of a srcset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate<'a> {
    url: &'a str,
    descriptor: Option<&'a str>,
}

/// Splits `srcset` into candidates the way HTML does: a URL is a run of
/// non-whitespace with trailing commas dropped, and its descriptor runs up to
/// the next comma. Returns `None` for an empty list or a dangling comma.
fn parse_candidates(srcset: &str) -> Option<Vec<Candidate<'_>>> {
    let mut candidates = Vec::new();
    let mut rest = srcset.trim_start();
    while !rest.is_empty() {
        if rest.starts_with(',') {
            return None;
        }
        let url_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let raw_url = &rest[..url_end];
        let url = raw_url.trim_end_matches(',');
        rest = &rest[url_end..];

        let descriptor = if url.len() < raw_url.len() {
            None
        } else {
            let descriptor_end = rest.find(',').map_or(rest.len(), |at| at + 1);
            let descriptor = rest[..descriptor_end].trim_end_matches(',').trim();
            rest = &rest[descriptor_end..];
            (!descriptor.is_empty()).then_some(descriptor)
        };
        candidates.push(Candidate { url, descriptor });
        rest = rest.trim_start();
    }
    (!candidates.is_empty()).then_some(candidates)
}

/// Checks that every candidate of `srcset` uses one descriptor kind: all
/// width (`640w`), all density (`2x`), or a single bare URL. Candidates may
/// be separated by a comma with or without whitespace.
pub fn validate_srcset(srcset: &str) -> Result<()> {
    let invalid = || Error::InvalidSrcset {
        srcset: srcset.to_string(),
    };
    let candidates = parse_candidates(srcset).ok_or_else(invalid)?;
    if candidates
        .iter()
        .any(|candidate| !URL_TOKEN.is_match(candidate.url).unwrap_or(false))
    {
        return Err(invalid());
    }
    if candidates.len() == 1 && candidates[0].descriptor.is_none() {
        return Ok(());
    }

    let all_match = |pattern: &Regex| {
        candidates.iter().all(|candidate| {
            candidate
                .descriptor
                .is_some_and(|descriptor| pattern.is_match(descriptor).unwrap_or(false))
        })
    };
    if all_match(&WIDTH_DESCRIPTOR) || all_match(&DENSITY_DESCRIPTOR) {
        Ok(())
    } else {
        Err(invalid())
    }
}
