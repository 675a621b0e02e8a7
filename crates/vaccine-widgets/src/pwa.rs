//! Install prompt eligibility and banner state.
//!
//! # Design
//! - Eligibility is decided once at startup: installed, then dismissed, then
//!   browser support.
//! - A dismissal stores an RFC 3339 timestamp; the banner stays hidden until
//!   `dismissal_days` whole days have passed.
//! - Without a deferred browser prompt, "install" falls back to
//!   platform-specific instructions.

use chrono::{DateTime, Utc};
use vaccine_config::PwaInstallConfig;

use crate::storage::KeyValueStore;

/// Component slug used in logs.
pub const COMPONENT: &str = "pwa";

/// The app already runs installed.
pub const ALREADY_INSTALLED: &str = "already-installed";
/// A recent dismissal suppresses the banner.
pub const DISMISSED: &str = "dismissed";
/// The browser offered a deferred install prompt.
pub const PROMPT_AVAILABLE: &str = "prompt-available";
/// The banner became visible.
pub const BANNER_SHOWN: &str = "banner-shown";
/// The visitor closed the banner.
pub const BANNER_DISMISSED: &str = "banner-dismissed";
/// The native prompt was shown and answered.
pub const INSTALL_PROMPTED: &str = "install-prompted";
/// The visitor accepted the native prompt.
pub const INSTALL_SUCCESS: &str = "install-success";
/// The visitor declined the native prompt.
pub const INSTALL_DISMISSED: &str = "install-dismissed";
/// The native prompt failed.
pub const INSTALL_ERROR: &str = "install-error";
/// Manual instructions were shown.
pub const MANUAL_INSTRUCTIONS_SHOWN: &str = "manual-instructions-shown";
/// The browser reported a completed install.
pub const APP_INSTALLED: &str = "app-installed";

/// Notice shown after a successful install.
pub const SUCCESS_MESSAGE: &str = "Tack! Appen har installerats på din enhet.";
/// How long the success notice stays up.
pub const SUCCESS_NOTICE_MS: u32 = 5_000;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Visitor platform, used to pick manual instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    /// iPhone, iPad or iPod.
    Ios,
    /// Android devices.
    Android,
    /// Everything else.
    Desktop,
}

impl Platform {
    /// Classify a user agent string.
    #[must_use]
    pub fn detect(user_agent: &str) -> Self {
        if ["iPad", "iPhone", "iPod"]
            .iter()
            .any(|device| user_agent.contains(device))
        {
            Self::Ios
        } else if user_agent.contains("Android") {
            Self::Android
        } else {
            Self::Desktop
        }
    }

    /// Manual install steps in Swedish.
    #[must_use]
    pub const fn instructions(self) -> &'static str {
        match self {
            Self::Ios => {
                "För att installera appen:\n1. Tryck på dela-knappen (⬆️)\n2. Välj \"Lägg till på hemskärmen\"\n3. Tryck \"Lägg till\""
            }
            Self::Android => {
                "För att installera appen:\n1. Öppna webbläsarmenyn (⋮)\n2. Välj \"Lägg till på hemskärmen\"\n3. Tryck \"Lägg till\""
            }
            Self::Desktop => {
                "För att installera appen:\n1. Klicka på installations-ikonen i adressfältet\n2. Eller använd webbläsarmenyn och välj \"Installera app\""
            }
        }
    }
}

/// Browser facts gathered by the web layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstallEnvironment {
    /// `(display-mode: standalone)` matches.
    pub standalone_display: bool,
    /// `navigator.standalone === true` (iOS).
    pub navigator_standalone: bool,
    /// `document.referrer`.
    pub referrer: String,
    /// `'serviceWorker' in navigator`.
    pub service_worker: bool,
    /// `'BeforeInstallPromptEvent' in window`.
    pub install_prompt_api: bool,
}

impl InstallEnvironment {
    /// Whether the page already runs as an installed app.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.standalone_display
            || self.navigator_standalone
            || self.referrer.contains("android-app://")
    }

    /// Whether the browser can install the app.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.service_worker && self.install_prompt_api
    }
}

/// Whether a stored dismissal timestamp is still in effect.
///
/// Unparsable timestamps count as no dismissal.
#[must_use]
pub fn is_dismissed(stored: Option<&str>, now: DateTime<Utc>, dismissal_days: u32) -> bool {
    let Some(at) = stored.and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok()) else {
        return false;
    };
    let elapsed_ms = (now - at.with_timezone(&Utc)).num_milliseconds();
    elapsed_ms.div_euclid(DAY_MS) < i64::from(dismissal_days)
}

/// Startup eligibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallDecision {
    /// Running installed; nothing to offer.
    AlreadyInstalled,
    /// Dismissed recently.
    Dismissed,
    /// Browser cannot install.
    Unsupported,
    /// Wait for a prompt or the show delay.
    Eligible,
}

impl InstallDecision {
    /// Lifecycle step announced for this decision.
    #[must_use]
    pub const fn step(self) -> Option<&'static str> {
        match self {
            Self::AlreadyInstalled => Some(ALREADY_INSTALLED),
            Self::Dismissed => Some(DISMISSED),
            Self::Unsupported | Self::Eligible => None,
        }
    }
}

/// What the install button does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallAction {
    /// Call `prompt()` on the deferred browser event.
    Prompt,
    /// Show manual instructions for the platform.
    ManualInstructions(Platform),
}

/// Answer to the native install prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptOutcome {
    /// `userChoice.outcome === "accepted"`.
    Accepted,
    /// Anything else.
    Dismissed,
}

impl PromptOutcome {
    /// Parse `userChoice.outcome`.
    #[must_use]
    pub fn parse(outcome: &str) -> Self {
        if outcome == "accepted" {
            Self::Accepted
        } else {
            Self::Dismissed
        }
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Dismissed => "dismissed",
        }
    }
}

/// Install banner state over a key/value store.
#[derive(Debug)]
pub struct PwaInstall<S: KeyValueStore> {
    config: PwaInstallConfig,
    storage: S,
    decision: InstallDecision,
    platform: Platform,
    prompt_available: bool,
    banner_visible: bool,
    installed: bool,
}

impl<S: KeyValueStore> PwaInstall<S> {
    /// Decide eligibility from the environment and any stored dismissal.
    pub fn new(
        config: PwaInstallConfig,
        storage: S,
        environment: &InstallEnvironment,
        user_agent: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let decision = if environment.is_installed() {
            InstallDecision::AlreadyInstalled
        } else if is_dismissed(
            storage.get(&config.storage_key).as_deref(),
            now,
            config.dismissal_days,
        ) {
            InstallDecision::Dismissed
        } else if environment.is_supported() {
            InstallDecision::Eligible
        } else {
            tracing::info!(component = COMPONENT, "browser does not support installation");
            InstallDecision::Unsupported
        };
        Self {
            config,
            storage,
            decision,
            platform: Platform::detect(user_agent),
            installed: decision == InstallDecision::AlreadyInstalled,
            prompt_available: false,
            banner_visible: false,
        }
    }

    /// Options in effect.
    #[must_use]
    pub const fn config(&self) -> &PwaInstallConfig {
        &self.config
    }

    /// Startup decision.
    #[must_use]
    pub const fn decision(&self) -> InstallDecision {
        self.decision
    }

    /// Whether the app is known to be installed.
    #[must_use]
    pub const fn installed(&self) -> bool {
        self.installed
    }

    /// Whether the banner is on screen.
    #[must_use]
    pub const fn banner_visible(&self) -> bool {
        self.banner_visible
    }

    /// Whether the web layer should listen for `beforeinstallprompt` and
    /// arm the show-delay timer.
    #[must_use]
    pub fn waits_for_prompt(&self) -> bool {
        self.decision == InstallDecision::Eligible
    }

    /// Whether the banner should be rendered now.
    #[must_use]
    pub fn should_show_banner(&self) -> bool {
        self.waits_for_prompt() && !self.installed && !self.banner_visible
    }

    /// The browser handed over a deferred prompt.
    pub fn prompt_available(&mut self) -> Vec<&'static str> {
        if !self.waits_for_prompt() {
            return Vec::new();
        }
        self.prompt_available = true;
        vec![PROMPT_AVAILABLE]
    }

    /// The show delay elapsed; show the banner when no prompt arrived.
    #[must_use]
    pub fn show_delay_elapsed(&self) -> bool {
        self.config.auto_show && !self.prompt_available && self.should_show_banner()
    }

    /// Record that the banner was rendered.
    pub fn mark_banner_shown(&mut self) -> Vec<&'static str> {
        if self.banner_visible {
            return Vec::new();
        }
        self.banner_visible = true;
        vec![BANNER_SHOWN]
    }

    /// What the install button should do.
    #[must_use]
    pub const fn install_action(&self) -> InstallAction {
        if self.prompt_available {
            InstallAction::Prompt
        } else {
            InstallAction::ManualInstructions(self.platform)
        }
    }

    /// Apply the answer to the native prompt. The deferred prompt is
    /// consumed either way.
    pub fn prompt_answered(&mut self, outcome: PromptOutcome, now: DateTime<Utc>) -> Vec<&'static str> {
        self.prompt_available = false;
        let mut steps = vec![INSTALL_PROMPTED];
        match outcome {
            PromptOutcome::Accepted => {
                self.installed = true;
                self.banner_visible = false;
                steps.push(INSTALL_SUCCESS);
            }
            PromptOutcome::Dismissed => {
                self.store_dismissal(now);
                self.banner_visible = false;
                steps.push(INSTALL_DISMISSED);
            }
        }
        steps
    }

    /// The native prompt threw; the banner stays as it is.
    pub fn prompt_failed(&mut self, error: &str) -> Vec<&'static str> {
        tracing::error!(component = COMPONENT, error, "install prompt failed");
        self.prompt_available = false;
        vec![INSTALL_ERROR]
    }

    /// Close the banner and remember the dismissal.
    pub fn dismiss(&mut self, now: DateTime<Utc>) -> Vec<&'static str> {
        self.store_dismissal(now);
        if !self.banner_visible {
            return Vec::new();
        }
        self.banner_visible = false;
        vec![BANNER_DISMISSED]
    }

    /// The browser fired `appinstalled`.
    pub fn app_installed(&mut self) -> Vec<&'static str> {
        self.installed = true;
        self.banner_visible = false;
        vec![APP_INSTALLED]
    }

    fn store_dismissal(&self, now: DateTime<Utc>) {
        if let Err(err) = self.storage.set(&self.config.storage_key, &now.to_rfc3339()) {
            tracing::warn!(component = COMPONENT, error = %err, "failed to store dismissal");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::{TimeDelta, TimeZone};

    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
    const ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8)";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 8, 0, 0).unwrap()
    }

    fn supported() -> InstallEnvironment {
        InstallEnvironment {
            service_worker: true,
            install_prompt_api: true,
            ..InstallEnvironment::default()
        }
    }

    #[test]
    fn platform_detection_and_instructions() {
        assert_eq!(Platform::detect(IPHONE), Platform::Ios);
        assert_eq!(Platform::detect(ANDROID), Platform::Android);
        assert_eq!(Platform::detect("Mozilla/5.0 (X11; Linux x86_64)"), Platform::Desktop);
        assert!(Platform::Ios.instructions().contains("dela-knappen"));
        assert!(Platform::Android.instructions().contains("webbläsarmenyn (⋮)"));
        assert!(Platform::Desktop.instructions().contains("Installera app"));
    }

    #[test]
    fn dismissal_counts_whole_days() {
        let stored = (now() - TimeDelta::days(6) - TimeDelta::hours(23)).to_rfc3339();
        assert!(is_dismissed(Some(&stored), now(), 7));
        let stored = (now() - TimeDelta::days(7)).to_rfc3339();
        assert!(!is_dismissed(Some(&stored), now(), 7));
        assert!(!is_dismissed(Some("yesterday"), now(), 7));
        assert!(!is_dismissed(None, now(), 7));
    }

    #[test]
    fn startup_checks_installed_before_dismissal_and_support() {
        let storage = MemoryStorage::new();
        assert!(storage.set("pwa_install_dismissed", &now().to_rfc3339()).is_ok());

        let installed = InstallEnvironment {
            referrer: "android-app://se.vaccin".to_string(),
            ..supported()
        };
        let pwa = PwaInstall::new(PwaInstallConfig::default(), &storage, &installed, ANDROID, now());
        assert_eq!(pwa.decision(), InstallDecision::AlreadyInstalled);
        assert_eq!(pwa.decision().step(), Some(ALREADY_INSTALLED));
        assert!(pwa.installed());

        let pwa = PwaInstall::new(PwaInstallConfig::default(), &storage, &supported(), ANDROID, now());
        assert_eq!(pwa.decision(), InstallDecision::Dismissed);
        assert!(!pwa.should_show_banner());

        storage.remove("pwa_install_dismissed");
        let pwa = PwaInstall::new(
            PwaInstallConfig::default(),
            &storage,
            &InstallEnvironment::default(),
            ANDROID,
            now(),
        );
        assert_eq!(pwa.decision(), InstallDecision::Unsupported);
        assert_eq!(pwa.decision().step(), None);
    }

    #[test]
    fn deferred_prompt_drives_the_install_flow() {
        let storage = MemoryStorage::new();
        let mut pwa =
            PwaInstall::new(PwaInstallConfig::default(), &storage, &supported(), ANDROID, now());
        assert!(pwa.show_delay_elapsed());
        assert_eq!(pwa.prompt_available(), vec![PROMPT_AVAILABLE]);
        assert!(!pwa.show_delay_elapsed());
        assert_eq!(pwa.mark_banner_shown(), vec![BANNER_SHOWN]);
        assert_eq!(pwa.install_action(), InstallAction::Prompt);

        assert_eq!(
            pwa.prompt_answered(PromptOutcome::parse("accepted"), now()),
            vec![INSTALL_PROMPTED, INSTALL_SUCCESS]
        );
        assert!(pwa.installed());
        assert!(!pwa.banner_visible());
        assert!(storage.is_empty());
    }

    #[test]
    fn declined_prompt_and_banner_dismissal_store_a_timestamp() {
        let storage = MemoryStorage::new();
        let mut pwa =
            PwaInstall::new(PwaInstallConfig::default(), &storage, &supported(), IPHONE, now());
        pwa.prompt_available();
        pwa.mark_banner_shown();
        assert_eq!(
            pwa.prompt_answered(PromptOutcome::Dismissed, now()),
            vec![INSTALL_PROMPTED, INSTALL_DISMISSED]
        );
        assert_eq!(
            storage.get("pwa_install_dismissed"),
            Some(now().to_rfc3339())
        );
        assert_eq!(
            pwa.install_action(),
            InstallAction::ManualInstructions(Platform::Ios)
        );

        pwa.mark_banner_shown();
        assert_eq!(pwa.dismiss(now()), vec![BANNER_DISMISSED]);
        assert!(pwa.dismiss(now()).is_empty());
    }

    #[test]
    fn storage_failures_do_not_block_dismissal() {
        let storage = MemoryStorage::new();
        storage.reject_writes(true);
        let mut pwa =
            PwaInstall::new(PwaInstallConfig::default(), &storage, &supported(), ANDROID, now());
        pwa.mark_banner_shown();
        assert_eq!(pwa.dismiss(now()), vec![BANNER_DISMISSED]);
        assert!(!pwa.banner_visible());
        assert_eq!(pwa.prompt_failed("SecurityError"), vec![INSTALL_ERROR]);
    }
}
