//! Custom field validators shared by the post and user inputs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use validator::ValidationError;

/// Accept only absolute `http`/`https` URLs with a host.
pub fn validate_http_url(value: &str) -> Result<(), ValidationError> {
    if is_http_url(value) {
        Ok(())
    } else {
        Err(ValidationError::new("url").with_message("Must be a valid http(s) URL".into()))
    }
}

/// A featured image is either an http(s) URL or a base64 `data:image/*` URL.
pub fn validate_featured_image(value: &str) -> Result<(), ValidationError> {
    if is_http_url(value) || is_image_data_url(value) {
        Ok(())
    } else {
        Err(ValidationError::new("featured_image")
            .with_message("Featured image must be a valid URL or base64 image".into()))
    }
}

fn is_http_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.has_host(),
        Err(_) => false,
    }
}

fn is_image_data_url(value: &str) -> bool {
    let Some(rest) = value.strip_prefix("data:") else {
        return false;
    };
    let Some((meta, payload)) = rest.split_once(',') else {
        return false;
    };
    let Some(mime) = meta.strip_suffix(";base64") else {
        return false;
    };
    let Some(subtype) = mime.strip_prefix("image/") else {
        return false;
    };

    !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !payload.is_empty()
        && STANDARD.decode(payload).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_urls_are_accepted() {
        assert!(validate_featured_image("https://cdn.example.com/a.png").is_ok());
        assert!(validate_featured_image("http://example.com/img").is_ok());
    }

    #[test]
    fn test_non_http_schemes_are_rejected() {
        assert!(validate_featured_image("ftp://example.com/a.png").is_err());
        assert!(validate_featured_image("javascript:alert(1)").is_err());
        assert!(validate_http_url("/relative/path.png").is_err());
    }

    #[test]
    fn test_base64_image_data_urls_are_accepted() {
        assert!(validate_featured_image("data:image/png;base64,iVBORw0KGgo=").is_ok());
        assert!(validate_featured_image("data:image/svg+xml;base64,PHN2Zz48L3N2Zz4=").is_ok());
    }

    #[test]
    fn test_malformed_data_urls_are_rejected() {
        // not an image
        assert!(validate_featured_image("data:text/plain;base64,aGVsbG8=").is_err());
        // not base64 encoded
        assert!(validate_featured_image("data:image/png,raw-bytes").is_err());
        // invalid payload
        assert!(validate_featured_image("data:image/png;base64,@@@").is_err());
        assert!(validate_featured_image("data:image/png;base64,").is_err());
    }
}
