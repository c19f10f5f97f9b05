//! Whether the host should still speak a control's role name.
//!
//! A role with a cue does not need to be announced as well, so the host asks
//! this policy before speaking it.

use crate::config::CueSettings;
use crate::role::Role;

/// Speech state the host exposes to the policy.
pub trait SpeechHost {
    /// True while continuous reading (say-all) is in progress.
    fn is_say_all_running(&self) -> bool;
}

/// Role announcement suppression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnouncementPolicy {
    /// Always keep spoken roles.
    pub speak_roles: bool,
    /// Keep spoken roles while say-all runs.
    pub say_all: bool,
}

impl AnnouncementPolicy {
    pub fn from_settings(settings: &CueSettings) -> Self {
        Self {
            speak_roles: settings.speak_roles,
            say_all: settings.say_all,
        }
    }

    /// Whether suppression applies right now.
    pub fn is_suppressing(&self, host: &dyn SpeechHost) -> bool {
        if self.speak_roles {
            return false;
        }
        !(self.say_all && host.is_say_all_running())
    }

    /// Roles without a cue are always announced.
    pub fn should_announce_role(&self, role: Role, host: &dyn SpeechHost) -> bool {
        !(role.has_sound() && self.is_suppressing(host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Host {
        say_all: bool,
    }

    impl SpeechHost for Host {
        fn is_say_all_running(&self) -> bool {
            self.say_all
        }
    }

    const IDLE: Host = Host { say_all: false };
    const READING: Host = Host { say_all: true };

    #[test]
    fn test_cued_roles_are_suppressed_by_default() {
        let policy = AnnouncementPolicy::default();
        assert!(!policy.should_announce_role(Role::Button, &IDLE));
        assert!(!policy.should_announce_role(Role::Button, &READING));
    }

    #[test]
    fn test_roles_without_cue_are_announced() {
        let policy = AnnouncementPolicy::default();
        assert!(policy.should_announce_role(Role::Heading, &IDLE));
        assert!(policy.should_announce_role(Role::Window, &READING));
    }

    #[test]
    fn test_speak_roles_disables_suppression() {
        let policy = AnnouncementPolicy {
            speak_roles: true,
            say_all: false,
        };
        assert!(policy.should_announce_role(Role::Checkbox, &IDLE));
    }

    #[test]
    fn test_say_all_only_while_reading() {
        let settings = CueSettings {
            say_all: true,
            ..CueSettings::default()
        };
        let policy = AnnouncementPolicy::from_settings(&settings);

        assert!(policy.should_announce_role(Role::Link, &READING));
        assert!(!policy.should_announce_role(Role::Link, &IDLE));
    }
}
