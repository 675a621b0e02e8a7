//! Cookie consent state.
//!
//! # Design
//! - The decision lives in one cookie holding `accepted` or `declined`.
//! - A stored decision of either kind suppresses the banner until the cookie
//!   expires; only `accepted` counts as consent.
//! - Transitions return the lifecycle steps to announce, in order.

use chrono::{DateTime, TimeDelta, Utc};
use vaccine_config::GdprConfig;

use crate::storage::CookieStore;

/// Component slug used in logs.
pub const COMPONENT: &str = "gdpr";

/// Stored consent was found at startup.
pub const CONSENT_FOUND: &str = "consent-found";
/// The banner became visible.
pub const BANNER_SHOWN: &str = "banner-shown";
/// The banner was hidden.
pub const BANNER_HIDDEN: &str = "banner-hidden";
/// The visitor accepted.
pub const CONSENT_ACCEPTED: &str = "consent-accepted";
/// The visitor declined.
pub const CONSENT_DECLINED: &str = "consent-declined";
/// The information link or dialog was shown.
pub const INFO_SHOWN: &str = "info-shown";
/// The stored decision was cleared.
pub const CONSENT_RESET: &str = "consent-reset";
/// Necessary tracking was switched on after acceptance.
pub const TRACKING_INITIALIZED: &str = "tracking-initialized";

/// Longest lifetime browsers grant a cookie, in days.
pub const MAX_EXPIRY_DAYS: u32 = 400;

/// Text shown when no information URL is configured.
pub const INFO_MESSAGE: &str = "Vi använder endast tekniskt nödvändiga cookies för att säkerställa att vår tjänst fungerar korrekt.\nInga personuppgifter lagras utan ditt samtycke enligt GDPR.\n\nTekniska cookies inkluderar:\n- Sessionscookies för säkerhet\n- Funktionella cookies för användarupplevelse\n- Inga marknadsföringscookies";

/// A stored consent decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Consent {
    /// Cookies accepted.
    Accepted,
    /// Cookies declined.
    Declined,
}

impl Consent {
    /// Cookie value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }

    /// Parse a cookie value; anything else is no decision.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "accepted" => Some(Self::Accepted),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }
}

/// Look up `name` in a `document.cookie` string.
#[must_use]
pub fn get_cookie(cookie_string: &str, name: &str) -> Option<String> {
    cookie_string.split(';').find_map(|pair| {
        let (key, value) = pair.trim_start().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Cookie attribute string for a consent write.
#[must_use]
pub fn format_cookie(name: &str, value: &str, expires: DateTime<Utc>, secure: bool) -> String {
    let expires = expires.format("%a, %d %b %Y %H:%M:%S GMT");
    let mut cookie = format!("{name}={value}; expires={expires}; path=/; SameSite=Strict");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Expiry for a decision stored at `now`, capped at [`MAX_EXPIRY_DAYS`].
#[must_use]
pub fn consent_expiry(now: DateTime<Utc>, expiry_days: u32) -> DateTime<Utc> {
    let days = expiry_days.min(MAX_EXPIRY_DAYS);
    now.checked_add_signed(TimeDelta::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Cookie attribute string that deletes `name`.
#[must_use]
pub fn deletion_cookie(name: &str) -> String {
    format!("{name}=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/")
}

/// Whether the `Secure` flag may be set for this page.
#[must_use]
pub fn is_secure_context(protocol: &str, hostname: &str) -> bool {
    protocol == "https:" || hostname == "localhost"
}

/// Consent banner state over a cookie store.
#[derive(Debug)]
pub struct GdprManager<C: CookieStore> {
    config: GdprConfig,
    cookies: C,
    secure: bool,
    consent: Option<Consent>,
    banner_visible: bool,
}

impl<C: CookieStore> GdprManager<C> {
    /// Read any stored decision from `cookies`.
    pub fn new(config: GdprConfig, cookies: C, secure: bool) -> Self {
        let consent = get_cookie(&cookies.cookie_string(), &config.cookie_name)
            .as_deref()
            .and_then(Consent::parse);
        if let Some(found) = consent {
            tracing::debug!(component = COMPONENT, consent = found.as_str(), "stored consent found");
        }
        Self {
            config,
            cookies,
            secure,
            consent,
            banner_visible: false,
        }
    }

    /// Options in effect.
    #[must_use]
    pub const fn config(&self) -> &GdprConfig {
        &self.config
    }

    /// Current decision, if any.
    #[must_use]
    pub const fn consent(&self) -> Option<Consent> {
        self.consent
    }

    /// Whether the visitor accepted cookies.
    #[must_use]
    pub fn has_consent(&self) -> bool {
        self.consent == Some(Consent::Accepted)
    }

    /// Whether the banner needs to be shown.
    #[must_use]
    pub const fn should_show_banner(&self) -> bool {
        self.consent.is_none() && !self.banner_visible
    }

    /// Whether the banner is on screen.
    #[must_use]
    pub const fn banner_visible(&self) -> bool {
        self.banner_visible
    }

    /// Steps to announce once setup completes.
    #[must_use]
    pub fn startup_steps(&self) -> Vec<&'static str> {
        if self.has_consent() {
            vec![CONSENT_FOUND]
        } else {
            Vec::new()
        }
    }

    /// Record that the banner was rendered.
    pub fn mark_banner_shown(&mut self) -> Vec<&'static str> {
        if self.banner_visible {
            return Vec::new();
        }
        self.banner_visible = true;
        vec![BANNER_SHOWN]
    }

    /// Store acceptance and hide the banner.
    pub fn accept(&mut self, now: DateTime<Utc>) -> Vec<&'static str> {
        let mut steps = self.decide(Consent::Accepted, now);
        steps.push(CONSENT_ACCEPTED);
        if self.config.enable_tracking {
            steps.push(TRACKING_INITIALIZED);
        }
        steps
    }

    /// Store refusal and hide the banner.
    pub fn decline(&mut self, now: DateTime<Utc>) -> Vec<&'static str> {
        let mut steps = self.decide(Consent::Declined, now);
        steps.push(CONSENT_DECLINED);
        steps
    }

    /// Escape on the banner accepts when allowed.
    pub fn escape(&mut self, now: DateTime<Utc>) -> Vec<&'static str> {
        if self.banner_visible && self.config.allow_escape_close {
            self.accept(now)
        } else {
            Vec::new()
        }
    }

    /// Forget the stored decision so the banner shows again.
    pub fn reset(&mut self) -> Vec<&'static str> {
        self.cookies.set_cookie(&deletion_cookie(&self.config.cookie_name));
        self.consent = None;
        let mut steps = self.hide();
        steps.push(CONSENT_RESET);
        steps
    }

    fn decide(&mut self, consent: Consent, now: DateTime<Utc>) -> Vec<&'static str> {
        let expires = consent_expiry(now, self.config.expiry_days);
        self.cookies.set_cookie(&format_cookie(
            &self.config.cookie_name,
            consent.as_str(),
            expires,
            self.secure,
        ));
        self.consent = Some(consent);
        tracing::info!(component = COMPONENT, consent = consent.as_str(), "consent stored");
        self.hide()
    }

    fn hide(&mut self) -> Vec<&'static str> {
        if self.banner_visible {
            self.banner_visible = false;
            vec![BANNER_HIDDEN]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCookieJar;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, 9, 30, 0).unwrap()
    }

    #[test]
    fn cookie_lookup_matches_whole_names() {
        let cookies = "other_vaccine_gdpr_consent=x; vaccine_gdpr_consent=accepted; z=1";
        assert_eq!(
            get_cookie(cookies, "vaccine_gdpr_consent").as_deref(),
            Some("accepted")
        );
        assert_eq!(get_cookie(cookies, "missing"), None);
        assert_eq!(get_cookie("", "z"), None);
    }

    #[test]
    fn consent_cookie_format() {
        let cookie = format_cookie("vaccine_gdpr_consent", "accepted", now(), true);
        assert_eq!(
            cookie,
            "vaccine_gdpr_consent=accepted; expires=Tue, 20 May 2025 09:30:00 GMT; path=/; SameSite=Strict; Secure"
        );
        assert!(!format_cookie("c", "declined", now(), false).contains("Secure"));
        assert!(is_secure_context("https:", "vaccin.se"));
        assert!(is_secure_context("http:", "localhost"));
        assert!(!is_secure_context("http:", "vaccin.se"));
    }

    #[test]
    fn accepted_consent_survives_a_fresh_manager() {
        let jar = MemoryCookieJar::new(now());
        let config = GdprConfig {
            enable_tracking: true,
            ..GdprConfig::default()
        };
        let mut first = GdprManager::new(config, &jar, true);
        assert!(first.should_show_banner());
        assert_eq!(first.mark_banner_shown(), vec![BANNER_SHOWN]);
        assert_eq!(
            first.accept(now()),
            vec![BANNER_HIDDEN, CONSENT_ACCEPTED, TRACKING_INITIALIZED]
        );

        let second = GdprManager::new(GdprConfig::default(), &jar, true);
        assert!(second.has_consent());
        assert!(!second.should_show_banner());
        assert_eq!(second.startup_steps(), vec![CONSENT_FOUND]);
    }

    #[test]
    fn declined_consent_hides_the_banner_without_consenting() {
        let jar = MemoryCookieJar::new(now());
        let mut manager = GdprManager::new(GdprConfig::default(), &jar, false);
        manager.mark_banner_shown();
        assert_eq!(manager.decline(now()), vec![BANNER_HIDDEN, CONSENT_DECLINED]);

        let fresh = GdprManager::new(GdprConfig::default(), &jar, false);
        assert_eq!(fresh.consent(), Some(Consent::Declined));
        assert!(!fresh.has_consent());
        assert!(!fresh.should_show_banner());
        assert!(fresh.startup_steps().is_empty());
    }

    #[test]
    fn consent_expires_after_the_configured_days() {
        let jar = MemoryCookieJar::new(now());
        let config = GdprConfig {
            expiry_days: 2,
            enable_tracking: false,
            ..GdprConfig::default()
        };
        GdprManager::new(config.clone(), &jar, true).accept(now());
        jar.advance(TimeDelta::days(3));
        assert!(GdprManager::new(config, &jar, true).should_show_banner());
    }

    #[test]
    fn oversized_expiry_is_capped() {
        let jar = MemoryCookieJar::new(now());
        let config = GdprConfig {
            expiry_days: u32::MAX,
            enable_tracking: false,
            ..GdprConfig::default()
        };
        GdprManager::new(config.clone(), &jar, true).accept(now());
        jar.advance(TimeDelta::days(i64::from(MAX_EXPIRY_DAYS) - 1));
        assert!(GdprManager::new(config.clone(), &jar, true).has_consent());
        jar.advance(TimeDelta::days(2));
        assert!(GdprManager::new(config, &jar, true).should_show_banner());

        assert_eq!(
            consent_expiry(DateTime::<Utc>::MAX_UTC, 1),
            DateTime::<Utc>::MAX_UTC
        );
    }

    #[test]
    fn reset_clears_the_cookie_and_escape_respects_config() {
        let jar = MemoryCookieJar::new(now());
        let mut manager = GdprManager::new(GdprConfig::default(), &jar, true);
        manager.mark_banner_shown();
        manager.accept(now());
        assert_eq!(manager.reset(), vec![CONSENT_RESET]);
        assert!(manager.should_show_banner());
        assert_eq!(jar.cookie_string(), "");

        let mut strict = GdprManager::new(
            GdprConfig {
                allow_escape_close: false,
                ..GdprConfig::default()
            },
            &jar,
            true,
        );
        strict.mark_banner_shown();
        assert!(strict.escape(now()).is_empty());
        assert!(strict.banner_visible());

        let mut lenient = GdprManager::new(
            GdprConfig {
                allow_escape_close: true,
                ..GdprConfig::default()
            },
            &jar,
            true,
        );
        lenient.mark_banner_shown();
        assert_eq!(lenient.escape(now()), vec![BANNER_HIDDEN, CONSENT_ACCEPTED]);
        assert!(lenient.has_consent());
    }
}
