use reqwest::Url;

use crate::helpers;
use crate::models::errors::TelemetryError;

/// Returns `resource_path + "\n" + expiry`, the exact string that gets signed.
///
/// A path containing a newline would make the string ambiguous and is rejected
/// with InvalidInput.
pub fn canonicalize(resource_path: &str, expiry: u64) -> Result<String, TelemetryError> {
    if resource_path.contains('\n') {
        return Err(TelemetryError::InvalidInput(
            "Resource path contains a newline".to_string(),
        ));
    }
    Ok(format!("{resource_path}\n{expiry}"))
}

/// Extracts the percent-decoded path of `resource_uri`, without query string.
/// A uri without scheme, such as `hub.azure-devices.net/devices/x`, is read as https.
pub(crate) fn resource_path(resource_uri: &str) -> Result<String, TelemetryError> {
    // Url parsing silently strips tabs and newlines, check before.
    if resource_uri.contains(['\n', '\r', '\t']) {
        return Err(TelemetryError::InvalidInput(
            "Resource uri contains control characters".to_string(),
        ));
    }
    let absolute = if resource_uri.contains("://") {
        resource_uri.to_string()
    } else {
        format!("https://{resource_uri}")
    };
    let url = Url::parse(&absolute).map_err(|e| {
        TelemetryError::InvalidInput(format!("Invalid resource uri '{resource_uri}': {e}"))
    })?;
    helpers::decode_component(url.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize() {
        let canonical = canonicalize("/devices/iPhone/messages/events", 1700000000).unwrap();
        assert_eq!(canonical, "/devices/iPhone/messages/events\n1700000000");
    }

    #[test]
    fn test_canonicalize_is_pure() {
        for (path, expiry) in [("/a", 0), ("/devices/x/messages/events", u64::MAX), ("", 42)] {
            let first = canonicalize(path, expiry).unwrap();
            let second = canonicalize(path, expiry).unwrap();
            assert_eq!(first, second);
            assert_eq!(first, format!("{}\n{}", path, expiry));
        }
    }

    #[test]
    fn test_canonicalize_rejects_newline() {
        assert!(matches!(
            canonicalize("/devices/a\nb", 1),
            Err(TelemetryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_resource_path() {
        assert_eq!(
            resource_path("https://hub.net/devices/iPhone/messages/events?api-version=1").unwrap(),
            "/devices/iPhone/messages/events"
        );
        assert_eq!(
            resource_path("hub.net/devices/my%20phone").unwrap(),
            "/devices/my phone"
        );
    }

    #[test]
    fn test_resource_path_rejects_control_characters() {
        assert!(matches!(
            resource_path("https://hub.net/devices/a\nb"),
            Err(TelemetryError::InvalidInput(_))
        ));
        // An encoded newline survives parsing and is caught once decoded.
        let decoded = resource_path("https://hub.net/devices/a%0Ab").unwrap();
        assert!(canonicalize(&decoded, 1).is_err());
    }
}
