//! # Development Token Minter
//!
//! Prints a bearer token for the POS front end, signed with `JWT_SECRET`
//! (or the development secret).
//!
//! ## Usage
//! ```bash
//! cargo run -p tally-api --bin tally-token -- --user cashier-01 --role cashier
//! ```

use std::env;

use tally_api::auth::{JwtManager, Role};
use tally_api::ApiConfig;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut user = String::from("admin");
    let mut role = Role::Admin;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--user" | "-u" => {
                if let Some(value) = args.get(i + 1) {
                    user = value.clone();
                    i += 1;
                }
            }
            "--role" | "-r" => {
                if let Some(value) = args.get(i + 1) {
                    role = value.parse().map_err(anyhow::Error::msg)?;
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally POS Token Minter");
                println!();
                println!("Usage: tally-token [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -u, --user <ID>      Token subject (default: admin)");
                println!("  -r, --role <ROLE>    admin | manager | cashier (default: admin)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = ApiConfig::load()?;
    if config.uses_dev_secret() {
        eprintln!("⚠ JWT_SECRET not set, signing with the development secret");
    }

    let jwt = JwtManager::new(config.jwt_secret, config.jwt_access_lifetime_secs);
    let token = jwt.generate_token(&user, role)?;

    println!("{token}");
    Ok(())
}
