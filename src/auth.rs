use crate::config::LoginConfig;

/// Decides whether a username/password pair may open a session.
pub trait IdentityCheck {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// A single configured username/password pair, compared exactly.
pub struct StaticIdentity {
    username: String,
    password: String,
}

impl StaticIdentity {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Default for StaticIdentity {
    fn default() -> Self {
        LoginConfig::default().into()
    }
}

impl From<LoginConfig> for StaticIdentity {
    fn from(config: LoginConfig) -> Self {
        Self::new(config.username, config.password)
    }
}

impl IdentityCheck for StaticIdentity {
    fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}

/// Login state of one session. Once open it stays open; there is no logout.
pub struct SessionGate {
    identity: Box<dyn IdentityCheck>,
    authenticated: bool,
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new(StaticIdentity::default())
    }
}

impl SessionGate {
    pub fn new(identity: impl IdentityCheck + 'static) -> Self {
        Self {
            identity: Box::new(identity),
            authenticated: false,
        }
    }

    pub fn authenticate(&mut self, username: &str, password: &str) -> bool {
        let ok = self.identity.verify(username, password);
        if ok {
            self.authenticated = true;
            tracing::info!("login succeeded for {}", username);
        } else {
            tracing::warn!("login rejected for {}", username);
        }
        ok
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}
