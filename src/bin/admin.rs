// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Administrative tooling: signing key generation and token minting.
//!
//! ```text
//! gatehouse-admin genkey --kid 2024-rotation --dir zarf/keys
//! gatehouse-admin gentoken --kid 2024-rotation --subject 5cf37266-3473-4006-984f-9325122678b7 --roles ADMIN,USER
//! ```

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use tracing::info;

use gatehouse::{
    auth::{Authenticator, Claims, KeyStore, PrivateKey, ROLE_USER},
    config::{LogFormat, DEFAULT_KEYS_FOLDER, KEYS_FOLDER_ENV},
    logging,
};

#[derive(Debug, Parser)]
#[command(name = "gatehouse-admin", version, about = "Gatehouse administration")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate an Ed25519 signing key as <dir>/<kid>.pem
    Genkey {
        #[arg(long)]
        kid: String,
        #[arg(long, env = KEYS_FOLDER_ENV, default_value = DEFAULT_KEYS_FOLDER)]
        dir: PathBuf,
    },
    /// Sign a token with a key from the key directory
    Gentoken {
        #[arg(long)]
        kid: String,
        #[arg(long, env = KEYS_FOLDER_ENV, default_value = DEFAULT_KEYS_FOLDER)]
        dir: PathBuf,
        #[arg(long)]
        subject: String,
        #[arg(long, value_delimiter = ',', default_value = ROLE_USER)]
        roles: Vec<String>,
        #[arg(long, default_value_t = 1)]
        ttl_hours: i64,
        #[arg(long, default_value = "gatehouse")]
        issuer: String,
    },
}

fn main() {
    logging::init(LogFormat::Pretty);

    if let Err(e) = run(Cli::parse()) {
        eprintln!("gatehouse-admin: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Genkey { kid, dir } => {
            let key = genkey(&dir, &kid)?;
            println!("public key: {}", key.public_key().to_base64());
        }
        Command::Gentoken {
            kid,
            dir,
            subject,
            roles,
            ttl_hours,
            issuer,
        } => {
            let token = gentoken(&dir, &kid, &subject, &issuer, roles, ttl_hours)?;
            println!("{token}");
        }
    }
    Ok(())
}

fn genkey(dir: &Path, kid: &str) -> Result<PrivateKey, Box<dyn Error>> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{kid}.pem"));
    if path.exists() {
        return Err(format!("{} already exists", path.display()).into());
    }

    let key = PrivateKey::generate()?;
    fs::write(&path, key.to_pem())?;
    info!(path = %path.display(), %kid, "private key written");
    Ok(key)
}

fn gentoken(
    dir: &Path,
    kid: &str,
    subject: &str,
    issuer: &str,
    roles: Vec<String>,
    ttl_hours: i64,
) -> Result<String, Box<dyn Error>> {
    if ttl_hours <= 0 {
        return Err("ttl-hours must be positive".into());
    }

    let keys = KeyStore::from_dir(dir)?;
    let auth = Authenticator::new(Arc::new(keys), kid)?;

    let claims = Claims::new(subject, issuer, Utc::now(), Duration::hours(ttl_hours), roles);
    let token = auth.generate_token(&claims)?;

    let parsed = auth.validate_token(&token)?;
    info!(sub = %parsed.sub, roles = ?parsed.roles, exp = parsed.exp, "token verified");
    Ok(token)
}
