//! Credentials for upstream fetches
//!
//! Authentication is left to git's own mechanisms: the SSH agent, keys in
//! `~/.ssh`, and configured credential helpers.

use git2::{Cred, CredentialType, ErrorClass, ErrorCode, RemoteCallbacks};

/// Key files tried in order when the SSH agent has nothing to offer
const SSH_KEY_NAMES: &[&str] = &["id_ed25519", "id_ecdsa", "id_rsa"];

/// Install the credentials callback
pub fn install(callbacks: &mut RemoteCallbacks<'_>) {
    callbacks.credentials(credentials);
}

fn credentials(
    url: &str,
    username: Option<&str>,
    allowed: CredentialType,
) -> Result<Cred, git2::Error> {
    if allowed.contains(CredentialType::DEFAULT) {
        return Cred::default();
    }
    if allowed.contains(CredentialType::SSH_KEY) {
        let user = username.unwrap_or("git");
        return Cred::ssh_key_from_agent(user).or_else(|_| ssh_key_file(user));
    }
    if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
        let config = git2::Config::open_default()?;
        return Cred::credential_helper(&config, url, username);
    }
    Err(auth_failed("no supported credential type offered"))
}

fn ssh_key_file(user: &str) -> Result<Cred, git2::Error> {
    let ssh_dir = dirs::home_dir()
        .ok_or_else(|| auth_failed("home directory not found"))?
        .join(".ssh");

    SSH_KEY_NAMES
        .iter()
        .map(|name| ssh_dir.join(name))
        .filter(|private| private.exists())
        .find_map(|private| {
            let public = private.with_extension("pub");
            let public = public.exists().then_some(public.as_path());
            Cred::ssh_key(user, public, &private, None).ok()
        })
        .ok_or_else(|| auth_failed("no usable SSH key found in ~/.ssh"))
}

fn auth_failed(message: &str) -> git2::Error {
    git2::Error::new(ErrorCode::Auth, ErrorClass::Ssh, message)
}
