use std::time::Duration;

use agent_debug_stream::{AuthContext, ClientConfig};

/// Load `.env` from the crate dir, then from the current dir.
pub fn load_env() {
    if let Ok(canon) = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join(".env")
        .canonicalize()
    {
        let _ = dotenvy::from_path(canon);
    }
    let _ = dotenvy::dotenv();
}

/// Connection flags shared by the network subcommands. Each one overrides
/// its `AGENT_ADMIN_*` counterpart.
#[derive(clap::Args, Debug, Default)]
pub struct ConnectionArgs {
    /// API base URL (overrides AGENT_ADMIN_API_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Total request timeout in seconds (overrides AGENT_ADMIN_TIMEOUT_SECS)
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl ConnectionArgs {
    pub fn client_config(&self) -> anyhow::Result<ClientConfig> {
        Ok(self.apply(ClientConfig::from_env()?))
    }

    /// Layers the flags over `config`.
    fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(base_url) = self.base_url.as_deref() {
            config = config.base_url(base_url);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.timeout(Duration::from_secs(secs));
        }
        config
    }
}

/// Session credentials: environment first, flags on top.
pub fn auth_context(token: Option<String>, workspace_id: Option<String>) -> AuthContext {
    override_auth(AuthContext::from_env(), token, workspace_id)
}

fn override_auth(
    mut auth: AuthContext,
    token: Option<String>,
    workspace_id: Option<String>,
) -> AuthContext {
    if let Some(token) = token {
        auth = auth.token(token);
    }
    if let Some(workspace_id) = workspace_id {
        auth = auth.workspace_id(workspace_id);
    }
    auth
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_base_url_and_timeout() {
        let args = ConnectionArgs {
            base_url: Some("http://admin.internal/api".into()),
            timeout_secs: Some(30),
        };
        let config = args.apply(ClientConfig::new("http://from-env/api"));
        assert_eq!(config.base_url, "http://admin.internal/api");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn absent_flags_keep_the_base_config() {
        let base = ClientConfig::new("http://from-env/api").timeout(Duration::from_secs(5));
        let config = ConnectionArgs::default().apply(base);
        assert_eq!(config.base_url, "http://from-env/api");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn flag_credentials_win_over_environment() {
        let from_env = AuthContext::new().token("env-token").workspace_id("ws-env");
        let auth = override_auth(from_env.clone(), Some("flag-token".into()), None);
        assert_eq!(auth.token.as_deref(), Some("flag-token"));
        assert_eq!(auth.workspace_id.as_deref(), Some("ws-env"));

        assert_eq!(override_auth(from_env.clone(), None, None), from_env);
    }
}
