use crate::env_or;

/// Controls the public `POST /api/auth/register` endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationConfig {
    pub enabled: bool,
    /// Lets `.admin`/`.hod` tagged emails register as administrators.
    pub allow_admin_self_registration: bool,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_admin_self_registration: false,
        }
    }
}

impl RegistrationConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            enabled: env_or("REGISTRATION_ENABLED", d.enabled),
            allow_admin_self_registration: env_or(
                "ALLOW_ADMIN_SELF_REGISTRATION",
                d.allow_admin_self_registration,
            ),
        }
    }
}
