use super::*;

fn config_with(breakpoints: &[u32]) -> ImageConfig {
    ImageConfig::with_overrides(ImageConfigOverrides {
        breakpoints: Some(breakpoints.to_vec()),
    })
}

#[test]
fn fixed_width_gets_density_descriptors() {
    let source = PictureSource::new("hero.png").with_size(800, 600);
    assert_eq!(
        responsive_srcset(&source, &ImageConfig::default(), &width_loader),
        "https://cdn.test/hero.png?w=800 1x, https://cdn.test/hero.png?w=1600 2x"
    );
}

#[test]
fn viewport_wide_sizes_keep_large_breakpoints() {
    let source = PictureSource::new("hero.png")
        .with_size(1920, 1080)
        .with_sizes("100vw");
    assert_eq!(
        responsive_srcset(&source, &config_with(&[640, 768, 1024, 1920]), &width_loader),
        "https://cdn.test/hero.png?w=640 640w, https://cdn.test/hero.png?w=768 768w, \
         https://cdn.test/hero.png?w=1024 1024w, https://cdn.test/hero.png?w=1920 1920w"
    );
}

#[test]
fn viewport_wide_sizes_drop_small_breakpoints() {
    let source = PictureSource::new("a.jpg").with_width(300).with_sizes(" 100vw ");
    let srcset = responsive_srcset(&source, &ImageConfig::default(), &width_loader);
    let widths = srcset
        .split(", ")
        .map(|candidate| candidate.rsplit_once(' ').map(|(_, w)| w).unwrap_or_default())
        .collect::<Vec<_>>();
    assert_eq!(
        widths,
        ["640w", "750w", "828w", "1080w", "1200w", "1920w", "2048w", "3840w"]
    );
}

#[test]
fn other_sizes_use_every_breakpoint() {
    let source = PictureSource::new("a.jpg").with_width(300).with_sizes("50vw");
    let srcset = responsive_srcset(&source, &config_with(&[32, 16, 32]), &width_loader);
    assert_eq!(
        srcset,
        "https://cdn.test/a.jpg?w=16 16w, https://cdn.test/a.jpg?w=32 32w"
    );
}

#[test]
fn oversized_originals_are_served_as_is() {
    for source in [
        PictureSource::new("big.png").with_size(4000, 3000),
        PictureSource::new("wide.png").with_size(1921, 10),
        PictureSource::new("tall.png").with_size(10, 1081).with_sizes("100vw"),
    ] {
        assert_eq!(
            responsive_srcset(&source, &ImageConfig::default(), &width_loader),
            format!("https://cdn.test/{}", source.srcset)
        );
    }
}

#[test]
fn limits_are_inclusive() {
    let source = PictureSource::new("edge.png").with_size(1920, 1080);
    assert!(
        responsive_srcset(&source, &ImageConfig::default(), &width_loader).ends_with(" 2x")
    );
}

#[test]
fn missing_dimensions_fall_back_to_the_loader_url() {
    let config = ImageConfig::default();
    let bare = PictureSource::new("x.png").with_sizes("100vw");
    assert_eq!(
        responsive_srcset(&bare, &config, &width_loader),
        "https://cdn.test/x.png"
    );
    let height_only = PictureSource::new("x.png").with_height(200);
    assert_eq!(
        responsive_srcset(&height_only, &config, &width_loader),
        "https://cdn.test/x.png"
    );
}

#[test]
fn noop_loader_never_produces_variants() {
    let source = PictureSource::new("/assets/hero.png")
        .with_size(800, 600)
        .with_sizes("100vw");
    assert_eq!(
        responsive_srcset(&source, &ImageConfig::default(), &NoopImageLoader),
        "/assets/hero.png"
    );
    assert_eq!(base_image_url(&source, &NoopImageLoader), "/assets/hero.png");
}

#[test]
fn base_url_ignores_dimensions() {
    let source = PictureSource::new("hero.png").with_size(800, 600);
    assert_eq!(
        base_image_url(&source, &width_loader),
        "https://cdn.test/hero.png"
    );
}

#[test]
fn generated_srcsets_validate() -> Result<()> {
    let config = ImageConfig::default();
    for source in [
        PictureSource::new("a.png"),
        PictureSource::new("a.png").with_size(800, 600),
        PictureSource::new("a.png").with_size(800, 600).with_sizes("100vw"),
    ] {
        validate_srcset(&responsive_srcset(&source, &config, &width_loader))?;
    }
    Ok(())
}

#[test]
fn validate_rejects_mixed_or_broken_candidates() {
    for srcset in [
        "a.png 1x, b.png 640w",
        "a.png 1x,b.png 640w",
        "",
        " , a.png",
        "a.png 1x,, b.png 2x",
        "a.png 0w",
        "a.png b.png",
        "/img/a copy.png 1x, /img/a copy.png 2x",
    ] {
        assert_eq!(
            validate_srcset(srcset),
            Err(Error::InvalidSrcset {
                srcset: srcset.to_string()
            }),
            "{srcset:?} should be rejected"
        );
    }
    assert!(validate_srcset("a.png 1.5x, b.png 2x").is_ok());
}

#[test]
fn validate_accepts_html_candidate_separators() -> Result<()> {
    for srcset in [
        "a.jpg 1x,b.jpg 2x",
        "a.jpg 640w ,b.jpg 1280w",
        "a.jpg 1x,\n  b.jpg 2x",
        "a.jpg 1x, ",
        "a.jpg,",
    ] {
        validate_srcset(srcset)?;
    }
    Ok(())
}
