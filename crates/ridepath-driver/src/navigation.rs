//! Hand-off to an external maps app

use ridepath_core::Coordinates;

/// Platform hook that opens a URL (maps app, browser)
pub trait UrlOpener: Send + Sync {
    /// Open `url`, returning a reason on failure
    fn open(&self, url: &str) -> Result<(), String>;
}

/// Google Maps driving directions to `destination`
#[must_use]
pub fn directions_url(destination: Coordinates) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&destination={},{}&travelmode=driving",
        destination.latitude, destination.longitude
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_url_embeds_destination() {
        let url = directions_url(Coordinates::new(53.8008, -1.5491));
        assert_eq!(
            url,
            "https://www.google.com/maps/dir/?api=1&destination=53.8008,-1.5491&travelmode=driving"
        );
    }
}
