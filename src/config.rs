use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::client::ConnectionConfig;

#[derive(Debug, Default)]
struct RcConfig {
    subdomain: Option<String>,
    username: Option<String>,
    password: Option<String>,
    verify: Option<bool>,
}

pub(crate) fn load_config(
    subdomain: Option<String>,
    username: Option<String>,
    password: Option<String>,
    verify: Option<bool>,
) -> Result<ConnectionConfig> {
    let mut subdomain = subdomain.or_else(|| std::env::var("RWS_SUBDOMAIN").ok());
    let mut username = username.or_else(|| std::env::var("RWS_USERNAME").ok());
    let mut password = password.or_else(|| std::env::var("RWS_PASSWORD").ok());

    let rc_candidates = rc_candidates();
    let mut file_verify: Option<bool> = None;

    if subdomain.is_none() || username.is_none() || password.is_none() || verify.is_none() {
        for rc_path in &rc_candidates {
            if rc_path.exists() {
                let cfg = read_rc(rc_path).with_context(|| {
                    format!("failed to read configuration file {}", rc_path.display())
                })?;

                if subdomain.is_none() {
                    subdomain = cfg.subdomain;
                }
                if username.is_none() {
                    username = cfg.username;
                }
                if password.is_none() {
                    password = cfg.password;
                }
                file_verify = cfg.verify;
                break;
            }
        }
    }

    let subdomain = require(subdomain, "subdomain", "RWS_SUBDOMAIN", &rc_candidates)?;
    let username = require(username, "username", "RWS_USERNAME", &rc_candidates)?;
    let password = require(password, "password", "RWS_PASSWORD", &rc_candidates)?;
    let verify = verify.or(file_verify).unwrap_or(true);

    Ok(ConnectionConfig {
        subdomain,
        username,
        password,
        verify,
    })
}

fn require(
    value: Option<String>,
    name: &str,
    env_var: &str,
    rc_candidates: &[PathBuf],
) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => {
            if !rc_candidates.is_empty() {
                bail!(
                    "Missing configuration: {} (set {} or put `{}:` in one of: {})",
                    name,
                    env_var,
                    name,
                    rc_candidates
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            bail!("Missing configuration: {} (set {} or create .rwsapirc)", name, env_var);
        }
    }
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    let mut cfg = RcConfig::default();

    // Support formatting where the key is on one line and the value on the next.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key {
            // Continuation value line (no colon)
            if !line.contains(':') {
                let v = strip_quotes(line);
                set_key(&mut cfg, pk, v);
                pending_key = None;
                continue;
            }
            pending_key = None;
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            match k {
                "subdomain" | "username" | "password" => {
                    if !v.is_empty() {
                        set_key(&mut cfg, k, v);
                    } else {
                        pending_key = Some(k);
                    }
                }
                "verify" => {
                    if !v.is_empty() {
                        cfg.verify = Some(v != "0");
                    }
                }
                _ => {}
            }
        }
    }

    Ok(cfg)
}

fn set_key(cfg: &mut RcConfig, key: &str, value: &str) {
    match key {
        "subdomain" => cfg.subdomain = Some(value.to_string()),
        "username" => cfg.username = Some(value.to_string()),
        "password" => cfg.password = Some(value.to_string()),
        _ => {}
    }
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // Search order:
    // 1) RWSAPI_RC (explicit)
    // 2) ./.rwsapirc (current working directory)
    // 3) ~/.rwsapirc
    if let Ok(p) = std::env::var("RWSAPI_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".rwsapirc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".rwsapirc"));
    }
    v
}
