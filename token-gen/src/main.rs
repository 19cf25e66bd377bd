use argon2::Argon2;
use argon2::password_hash::{PasswordHasher, SaltString};
use chrono::Duration;
use clap::{Parser, Subcommand};
use platform::services::auth::{ExtraClaims, HmacTokenCodec, TokenCodec};
use rand::rngs::OsRng;
use serde_json::Value;

/// Developer tooling for the auth platform.
///
/// - `hash-password`: Argon2id PHC string for the `password_hash` field of the
///   user directory file
/// - `issue`: mint an HS512 token with the same secret the services use
///   (`JWT_SECRET`, read from the environment or `.env`)
#[derive(Parser, Debug)]
#[command(name = "token-gen", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hash a plain-text password
    HashPassword {
        plain: String,
    },

    /// Issue a signed token
    Issue {
        /// Token subject (username)
        #[arg(long)]
        subject: String,

        /// Lifetime in seconds
        #[arg(long, default_value_t = 3600)]
        ttl: i64,

        /// Extra claim as key=value. Values that parse as JSON are kept as JSON,
        /// anything else becomes a string. Repeatable.
        #[arg(long = "claim", value_name = "KEY=VALUE", value_parser = parse_claim)]
        claims: Vec<(String, Value)>,

        /// Print only the token (no extra lines)
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
}

fn parse_claim(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("claim key must not be empty".to_string());
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn hash_password(plain: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(plain.as_bytes(), &salt)?
        .to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Command::HashPassword { plain } => {
            let phc = hash_password(&plain).map_err(|e| e.to_string())?;
            println!("{}", phc);
        }
        Command::Issue {
            subject,
            ttl,
            claims,
            quiet,
        } => {
            dotenvy::dotenv().ok();
            let secret = std::env::var("JWT_SECRET").map_err(|_| "JWT_SECRET is not set")?;

            let leeway = 0;
            let codec = HmacTokenCodec::new(secret.as_bytes(), leeway)?;
            let extra: ExtraClaims = claims.into_iter().collect();
            let ttl = Duration::try_seconds(ttl).ok_or("ttl out of range")?;

            let token = codec.issue(&subject, extra, ttl)?;
            if quiet {
                println!("{}", token);
                return Ok(());
            }

            let verified = codec.verify(&token)?;
            println!("token: {}", token);
            println!("sub: {}", verified.subject);
            println!("iat: {}", verified.issued_at);
            println!("exp: {}", verified.expires_at);
        }
    }

    Ok(())
}
