use super::*;

use std::cell::RefCell;
use std::rc::Rc;

mod navigation_adapter;
mod srcset_derivation;
mod text_fragment_encoding;

fn width_loader(config: &ImageLoaderConfig) -> String {
    match config.width {
        Some(width) => format!("https://cdn.test/{}?w={width}", config.src),
        None => format!("https://cdn.test/{}", config.src),
    }
}

fn adapter_at(url: &str) -> Result<(Rc<MockBrowser>, BrowserPlatformLocation<MockBrowser>)> {
    let browser = Rc::new(MockBrowser::new(url)?);
    let location = BrowserPlatformLocation::new(Rc::clone(&browser));
    Ok((browser, location))
}

#[test]
fn configuration_errors_are_classified() {
    assert!(Error::EmptySources.is_configuration_error());
    assert!(
        Error::HostNotPicture {
            actual: "div".into()
        }
        .is_configuration_error()
    );
    assert!(!Error::NotImplemented("history_go").is_configuration_error());
    assert!(!Error::InvalidUrl("x".into()).is_configuration_error());
}

#[test]
fn error_messages_name_the_violated_precondition() {
    let err = Error::MissingImageSibling {
        attr: OPTIMIZED_IMAGE_ATTR.to_string(),
    };
    assert!(err.to_string().contains("data-optimized-image"));
    let err = Error::HostNotPicture {
        actual: "div".into(),
    };
    assert!(err.to_string().contains("<picture>"));
    assert!(err.to_string().contains("<div>"));
}
