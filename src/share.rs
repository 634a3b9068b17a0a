//! Share dispatcher.
//!
//! Starts in [`ShareState::FallbackOnly`] so a user can always share the link,
//! and moves to [`ShareState::NativeAvailable`] once a certificate image has
//! been converted into a payload on a platform with a native share sheet.

use url::Url;

use crate::config::ShareMessage;
use crate::error::ShareError;
use crate::payload::{to_share_payload, PayloadNaming, SharePayload};
use crate::platform::{NativeShareData, SharePlatform};

const FACEBOOK_SHARER: &str = "https://www.facebook.com/sharer/sharer.php";
const TWITTER_INTENT: &str = "https://twitter.com/intent/tweet";

/// Where a share action sends the certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShareTarget {
    NativeDevice,
    Facebook,
    Twitter,
    MessagingApp,
    CopyLink,
}

/// Actions offered while no native payload is available, in display order
pub const FALLBACK_TARGETS: [ShareTarget; 4] = [
    ShareTarget::Facebook,
    ShareTarget::Twitter,
    ShareTarget::MessagingApp,
    ShareTarget::CopyLink,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareState {
    FallbackOnly,
    NativeAvailable(SharePayload),
}

/// Share intent URL for a social network target
pub fn intent_url(target: ShareTarget, message: &ShareMessage) -> Result<Option<Url>, ShareError> {
    let url = match target {
        ShareTarget::Facebook => {
            Url::parse_with_params(FACEBOOK_SHARER, &[("u", message.url.as_str())])?
        }
        ShareTarget::Twitter => Url::parse_with_params(
            TWITTER_INTENT,
            &[("text", message.title.as_str()), ("url", message.url.as_str())],
        )?,
        _ => return Ok(None),
    };
    Ok(Some(url))
}

pub struct ShareDispatcher {
    message: ShareMessage,
    naming: PayloadNaming,
    state: ShareState,
}

impl ShareDispatcher {
    pub fn new(message: ShareMessage, naming: PayloadNaming) -> Self {
        Self {
            message,
            naming,
            state: ShareState::FallbackOnly,
        }
    }

    pub fn state(&self) -> &ShareState {
        &self.state
    }

    pub fn message(&self) -> &ShareMessage {
        &self.message
    }

    /// Offer a raster data URL (possibly empty) as the native share payload.
    ///
    /// The dispatcher only moves to `NativeAvailable` when `platform` reports
    /// a native share sheet. Conversion failures are logged and leave the
    /// dispatcher in `FallbackOnly`; they never reach the caller.
    pub async fn offer_image(&mut self, data_url: &str, platform: &dyn SharePlatform) {
        // yield so the fallback buttons stay usable until conversion resolves
        tokio::task::yield_now().await;
        let native = platform.supports_native_share();
        self.state = match to_share_payload(data_url, &self.naming) {
            Ok(Some(payload)) if native => {
                log::debug!("native share ready: {} ({} bytes)", payload.name, payload.len());
                ShareState::NativeAvailable(payload)
            }
            Ok(_) => ShareState::FallbackOnly,
            Err(e) => {
                log::error!("convert data url to file failed: {}", e);
                ShareState::FallbackOnly
            }
        };
    }

    /// Targets currently offered to the user
    pub fn actions(&self) -> Vec<ShareTarget> {
        match self.state {
            ShareState::NativeAvailable(_) => vec![ShareTarget::NativeDevice],
            ShareState::FallbackOnly => FALLBACK_TARGETS.to_vec(),
        }
    }

    /// Execute `target`'s share contract with the fixed title/URL pair.
    pub fn perform(&self, target: ShareTarget, platform: &dyn SharePlatform) -> Result<(), ShareError> {
        if !self.actions().contains(&target) {
            return Err(ShareError::Unavailable(target));
        }
        match target {
            ShareTarget::NativeDevice => {
                let ShareState::NativeAvailable(payload) = &self.state else {
                    return Err(ShareError::Unavailable(target));
                };
                if !platform.supports_native_share() {
                    return Err(ShareError::Unavailable(target));
                }
                platform.native_share(NativeShareData {
                    title: self.message.title.clone(),
                    url: self.message.url.clone(),
                    files: vec![payload.clone()],
                })?;
            }
            ShareTarget::Facebook | ShareTarget::Twitter => {
                if let Some(url) = intent_url(target, &self.message)? {
                    platform.open_url(url.as_str())?;
                }
            }
            ShareTarget::MessagingApp => platform.send_messaging_link(&self.message.url)?,
            ShareTarget::CopyLink => platform.copy_text(&self.message.url)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::encode_data_url;
    use crate::platform::{PlatformEvent, RecordingPlatform};

    fn message() -> ShareMessage {
        ShareMessage { title: "내 임명장".into(), url: "https://sobisa.test/".into() }
    }

    fn dispatcher() -> ShareDispatcher {
        ShareDispatcher::new(message(), PayloadNaming::default())
    }

    #[test]
    fn starts_in_fallback_with_four_actions() {
        let d = dispatcher();
        assert_eq!(d.state(), &ShareState::FallbackOnly);
        assert_eq!(d.actions(), FALLBACK_TARGETS.to_vec());
    }

    #[tokio::test]
    async fn png_payload_enables_native_share() {
        let platform = RecordingPlatform::new(true);
        let mut d = dispatcher();
        d.offer_image(&encode_data_url("image/png", b"png"), &platform).await;
        assert_eq!(d.actions(), vec![ShareTarget::NativeDevice]);

        d.perform(ShareTarget::NativeDevice, &platform).unwrap();
        assert_eq!(
            platform.events(),
            vec![PlatformEvent::NativeShare {
                title: "내 임명장".into(),
                url: "https://sobisa.test/".into(),
                files: vec!["임명장.png".into()],
            }]
        );
    }

    #[tokio::test]
    async fn without_native_capability_stays_fallback() {
        let platform = RecordingPlatform::new(false);
        let mut d = dispatcher();
        d.offer_image(&encode_data_url("image/png", b"png"), &platform).await;
        assert_eq!(d.state(), &ShareState::FallbackOnly);
        assert_eq!(d.actions(), FALLBACK_TARGETS.to_vec());
        assert!(platform.events().is_empty());
    }

    #[tokio::test]
    async fn native_share_needs_capability_on_the_performing_platform() {
        let mut d = dispatcher();
        d.offer_image(&encode_data_url("image/png", b"png"), &RecordingPlatform::new(true))
            .await;

        let plain = RecordingPlatform::new(false);
        let err = d.perform(ShareTarget::NativeDevice, &plain).unwrap_err();
        assert!(matches!(err, ShareError::Unavailable(ShareTarget::NativeDevice)));
        assert!(plain.events().is_empty());
    }

    #[tokio::test]
    async fn conversion_error_is_swallowed() {
        let mut d = dispatcher();
        d.offer_image("data:image/png;base64,###", &RecordingPlatform::new(true)).await;
        assert_eq!(d.state(), &ShareState::FallbackOnly);
    }

    #[tokio::test]
    async fn empty_offer_resets_to_fallback() {
        let platform = RecordingPlatform::new(true);
        let mut d = dispatcher();
        d.offer_image(&encode_data_url("image/png", b"png"), &platform).await;
        d.offer_image("", &platform).await;
        assert_eq!(d.state(), &ShareState::FallbackOnly);
    }

    #[test]
    fn fallback_actions_follow_network_contracts() {
        let d = dispatcher();
        let platform = RecordingPlatform::new(false);
        for target in d.actions() {
            d.perform(target, &platform).unwrap();
        }
        let events = platform.events();
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], PlatformEvent::OpenUrl(u)
            if u.starts_with(FACEBOOK_SHARER) && u.contains("u=https%3A%2F%2Fsobisa.test%2F")));
        assert!(matches!(&events[1], PlatformEvent::OpenUrl(u)
            if u.starts_with(TWITTER_INTENT) && u.contains("text=") && u.contains("url=")));
        assert_eq!(events[2], PlatformEvent::MessagingLink("https://sobisa.test/".into()));
        assert_eq!(events[3], PlatformEvent::CopyText("https://sobisa.test/".into()));
    }

    #[test]
    fn native_action_unavailable_in_fallback() {
        let d = dispatcher();
        let platform = RecordingPlatform::new(true);
        let err = d.perform(ShareTarget::NativeDevice, &platform).unwrap_err();
        assert!(matches!(err, ShareError::Unavailable(ShareTarget::NativeDevice)));
    }
}
